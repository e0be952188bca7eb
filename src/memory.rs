//! インプロセスのバックエンド
//!
//! `--offline` モードとテストで使う。呼び出し回数を記録し、
//! 各操作に失敗を注入できる。

use crate::services::{MediaStore, PersistenceService, ServiceError, ServiceResult};
use async_trait::async_trait;
use spot_share_common::{NewSpot, Spot, SpotId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SAMPLE_CATEGORIES: &[&str] = &[
    "parks_and_reserves",
    "food_and_drink",
    "viewpoints",
    "hidden_gems",
    "study_spots",
];

/// 操作ごとの呼び出し回数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub select: usize,
    pub insert: usize,
    pub rpc: usize,
    pub upload: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.select + self.insert + self.rpc + self.upload
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control_secs: u32,
}

#[derive(Debug, Default)]
struct State {
    categories: Vec<String>,
    spots: Vec<Spot>,
    objects: BTreeMap<String, StoredObject>,
    next_id: i64,
    calls: CallCounts,
    catalog_error: Option<String>,
    upload_error: Option<String>,
    insert_error: Option<String>,
    omit_public_url: bool,
}

#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    bucket: String,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State { next_id: 1, ..Default::default() }),
            bucket: "location-images".into(),
        }
    }

    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        backend.lock().categories = categories.into_iter().map(Into::into).collect();
        backend
    }

    /// オフライン確認用のサンプルカテゴリ入り
    pub fn sample() -> Self {
        Self::with_categories(SAMPLE_CATEGORIES.iter().copied())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_catalog(&self, message: &str) {
        self.lock().catalog_error = Some(message.to_string());
    }

    pub fn fail_upload(&self, message: &str) {
        self.lock().upload_error = Some(message.to_string());
    }

    pub fn fail_insert(&self, message: &str) {
        self.lock().insert_error = Some(message.to_string());
    }

    /// アップロードは成功するが公開URLを返さない
    pub fn omit_public_url(&self) {
        self.lock().omit_public_url = true;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.catalog_error = None;
        state.upload_error = None;
        state.insert_error = None;
        state.omit_public_url = false;
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn spots(&self) -> Vec<Spot> {
        self.lock().spots.clone()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    pub fn object(&self, name: &str) -> Option<StoredObject> {
        self.lock().objects.get(name).cloned()
    }
}

#[async_trait]
impl PersistenceService for MemoryBackend {
    async fn select_spots(&self) -> ServiceResult<Vec<Spot>> {
        let mut state = self.lock();
        state.calls.select += 1;
        let mut spots = state.spots.clone();
        spots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(spots)
    }

    async fn insert_spot(&self, spot: &NewSpot) -> ServiceResult<SpotId> {
        let mut state = self.lock();
        state.calls.insert += 1;
        if let Some(message) = &state.insert_error {
            return Err(ServiceError::with_status(400, message.clone()));
        }
        if spot.image_urls.is_empty() {
            return Err(ServiceError::with_status(400, "image_url must not be empty"));
        }

        let id = SpotId(state.next_id);
        state.next_id += 1;
        state.spots.push(Spot::from_new(id, spot.clone(), chrono::Utc::now()));
        debug!(%id, "memory backend stored spot");
        Ok(id)
    }

    async fn rpc_strings(&self, procedure: &str) -> ServiceResult<Vec<String>> {
        let mut state = self.lock();
        state.calls.rpc += 1;
        if let Some(message) = &state.catalog_error {
            return Err(ServiceError::new(message.clone()));
        }
        match procedure {
            "get_category_enum_values" => Ok(state.categories.clone()),
            other => Err(ServiceError::with_status(
                404,
                format!("Could not find the function public.{}", other),
            )),
        }
    }
}

#[async_trait]
impl MediaStore for MemoryBackend {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control_secs: u32,
    ) -> ServiceResult<()> {
        let mut state = self.lock();
        state.calls.upload += 1;
        if let Some(message) = &state.upload_error {
            return Err(ServiceError::new(message.clone()));
        }
        // upsert: false と同じく既存オブジェクトは上書きしない
        if state.objects.contains_key(object_name) {
            return Err(ServiceError::with_status(409, "The resource already exists"));
        }
        state.objects.insert(
            object_name.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                cache_control_secs,
            },
        );
        Ok(())
    }

    fn public_url(&self, object_name: &str) -> Option<String> {
        let state = self.lock();
        if state.omit_public_url || !state.objects.contains_key(object_name) {
            return None;
        }
        Some(format!("memory://{}/{}", self.bucket, object_name))
    }
}
