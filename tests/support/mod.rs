//! テスト用の端末・通知・ストアのダブル

#![allow(dead_code)]

use async_trait::async_trait;
use spot_share::media::FsImageSource;
use spot_share::memory::MemoryBackend;
use spot_share::services::{
    LocalImage, LocationServices, MediaDevice, MediaStore, Notifier, PermissionStatus,
    PersistenceService, ServiceError, ServiceResult, Services,
};
use spot_share_common::{LocationPoint, NewSpot, Spot, SpotId};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn point(lat: f64, lon: f64) -> LocationPoint {
    LocationPoint::new(lat, lon).unwrap()
}

/// 一時ディレクトリにダミー画像を作る
pub fn temp_image(dir: &Path, name: &str) -> LocalImage {
    let path = dir.join(name);
    std::fs::write(&path, b"\xFF\xD8\xFF fake jpeg").unwrap();
    LocalImage::new(path.display().to_string())
}

/// アラートを記録する通知先
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.alerts.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn last(&self) -> Option<(String, String)> {
        self.alerts.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// 権限・現在地・画像取り込みを台本どおりに返す端末
pub struct FakeDevice {
    location_granted: bool,
    fix: Option<LocationPoint>,
    camera_granted: bool,
    library: Mutex<VecDeque<Option<LocalImage>>>,
    camera: Mutex<VecDeque<Option<LocalImage>>>,
    pub location_requests: AtomicUsize,
    pub fix_requests: AtomicUsize,
    pub captures: AtomicUsize,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            location_granted: true,
            fix: Some(point(-37.6, 145.0)),
            camera_granted: true,
            library: Mutex::new(VecDeque::new()),
            camera: Mutex::new(VecDeque::new()),
            location_requests: AtomicUsize::new(0),
            fix_requests: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    pub fn deny_location(mut self) -> Self {
        self.location_granted = false;
        self
    }

    pub fn deny_camera(mut self) -> Self {
        self.camera_granted = false;
        self
    }

    pub fn with_fix(mut self, fix: LocationPoint) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn queue_library(&self, image: Option<LocalImage>) {
        self.library.lock().unwrap().push_back(image);
    }

    pub fn queue_camera(&self, image: Option<LocalImage>) {
        self.camera.lock().unwrap().push_back(image);
    }
}

#[async_trait]
impl LocationServices for FakeDevice {
    async fn request_location_permission(&self) -> PermissionStatus {
        self.location_requests.fetch_add(1, Ordering::SeqCst);
        if self.location_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn current_position(&self) -> ServiceResult<LocationPoint> {
        self.fix_requests.fetch_add(1, Ordering::SeqCst);
        self.fix.ok_or_else(|| ServiceError::new("no fix"))
    }
}

#[async_trait]
impl MediaDevice for FakeDevice {
    async fn pick_from_library(&self) -> ServiceResult<Option<LocalImage>> {
        Ok(self.library.lock().unwrap().pop_front().flatten())
    }

    async fn request_camera_permission(&self) -> PermissionStatus {
        if self.camera_granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn capture_from_camera(&self) -> ServiceResult<Option<LocalImage>> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(self.camera.lock().unwrap().pop_front().flatten())
    }
}

/// アップロード開始を知らせ、解放されるまで待つストア
pub struct GatedStore {
    inner: Arc<MemoryBackend>,
    pub started: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl MediaStore for GatedStore {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control_secs: u32,
    ) -> ServiceResult<()> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner
            .upload(object_name, bytes, content_type, cache_control_secs)
            .await
    }

    fn public_url(&self, object_name: &str) -> Option<String> {
        self.inner.public_url(object_name)
    }
}

/// `release` が通知されるまでカテゴリRPCを返さない永続化サービス
pub struct GatedCatalog {
    inner: Arc<MemoryBackend>,
    pub release: Notify,
}

impl GatedCatalog {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self { inner, release: Notify::new() }
    }
}

#[async_trait]
impl PersistenceService for GatedCatalog {
    async fn select_spots(&self) -> ServiceResult<Vec<Spot>> {
        self.inner.select_spots().await
    }

    async fn insert_spot(&self, spot: &NewSpot) -> ServiceResult<SpotId> {
        self.inner.insert_spot(spot).await
    }

    async fn rpc_strings(&self, procedure: &str) -> ServiceResult<Vec<String>> {
        self.release.notified().await;
        self.inner.rpc_strings(procedure).await
    }
}

pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub device: Arc<FakeDevice>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(backend: MemoryBackend, device: FakeDevice) -> Self {
        Self {
            backend: Arc::new(backend),
            device: Arc::new(device),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            persistence: self.backend.clone(),
            media_store: self.backend.clone(),
            location: self.device.clone(),
            media_device: self.device.clone(),
            images: Arc::new(FsImageSource),
            notifier: self.notifier.clone(),
        }
    }
}
