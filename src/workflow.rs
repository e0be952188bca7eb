//! スポット投稿ワークフロー（投稿画面）
//!
//! ドラフト・カテゴリ一覧・位置選択画面からの戻り値・送信処理をまとめて保持する。
//! どの失敗もアラートとして表示し、ドラフトは編集可能なまま残す。

use crate::catalog::{CatalogState, CategoryCatalog};
use crate::draft::Draft;
use crate::error::{Result, SpotError};
use crate::location::LocationPicker;
use crate::media::{MediaIntake, UploadPipeline};
use crate::navigation::{location_route, Arrival, PendingLocation};
use crate::services::{LocationServices, Notifier, PermissionKind, Services};
use crate::submit::SubmissionOrchestrator;
use spot_share_common::{CategoryItem, LocationPoint, SpotId};
use std::sync::Arc;
use tracing::{debug, info};

/// ワークフローの固定設定
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub category_rpc: String,
    pub object_prefix: String,
    pub cache_control_secs: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            category_rpc: "get_category_enum_values".into(),
            object_prefix: "spot".into(),
            cache_control_secs: 3600,
        }
    }
}

impl From<&crate::config::Config> for WorkflowSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            category_rpc: config.category_rpc.clone(),
            object_prefix: config.object_prefix.clone(),
            cache_control_secs: config.cache_control_secs,
        }
    }
}

pub struct AddSpotWorkflow {
    draft: Draft,
    categories: CatalogState,
    catalog: CategoryCatalog,
    pending_location: Option<PendingLocation>,
    intake: MediaIntake,
    orchestrator: SubmissionOrchestrator,
    location: Arc<dyn LocationServices>,
    notifier: Arc<dyn Notifier>,
    completed: Option<SpotId>,
}

impl AddSpotWorkflow {
    pub fn new(services: Services, settings: WorkflowSettings) -> Self {
        let uploader = UploadPipeline::new(
            services.media_store.clone(),
            services.images.clone(),
            settings.object_prefix,
            settings.cache_control_secs,
        );

        Self {
            draft: Draft::new(),
            categories: CatalogState::Loading,
            catalog: CategoryCatalog::new(services.persistence.clone(), settings.category_rpc),
            pending_location: None,
            intake: MediaIntake::new(services.media_device.clone()),
            orchestrator: SubmissionOrchestrator::new(services.persistence, uploader),
            location: services.location,
            notifier: services.notifier,
            completed: None,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn categories(&self) -> &CatalogState {
        &self.categories
    }

    /// 完了したスポットのID（送信成功後のみ）
    pub fn completed(&self) -> Option<SpotId> {
        self.completed
    }

    pub fn is_submitting(&self) -> bool {
        self.orchestrator.is_pending() || self.draft.submission_state().is_pending()
    }

    /// ドラフトを借用しないカテゴリ読み込み口
    pub fn catalog_loader(&self) -> CategoryCatalog {
        self.catalog.clone()
    }

    /// 読み込み結果を反映（失敗時は一度だけ通知し、自動再試行はしない）
    pub fn apply_catalog(&mut self, result: Result<Vec<CategoryItem>>) {
        self.categories = match result {
            Ok(items) => CatalogState::Ready(items),
            Err(e) => {
                self.notify_error(&e);
                CatalogState::Failed(e.to_string())
            }
        };
    }

    pub async fn load_categories(&mut self) {
        let result = self.catalog.load().await;
        self.apply_catalog(result);
    }

    /// 位置選択画面を開く（古い戻り口は破棄）
    pub fn open_location_picker(&mut self) -> LocationPicker {
        let (ret, pending) = location_route();
        if self.pending_location.replace(pending).is_some() {
            debug!("replacing stale location route");
        }
        LocationPicker::new(self.location.clone(), self.notifier.clone(), ret)
    }

    /// 画面復帰時に呼ぶ。届いた座標を一度だけ反映する
    pub fn resume(&mut self) -> Option<LocationPoint> {
        let pending = self.pending_location.as_mut()?;
        match pending.poll() {
            Arrival::Waiting => None,
            Arrival::Closed => {
                self.pending_location = None;
                None
            }
            Arrival::Arrived(point) => {
                self.pending_location = None;
                info!(%point, "coordinate received from location picker");
                self.draft.set_coordinate(Some(point));
                Some(point)
            }
        }
    }

    pub async fn pick_image(&mut self) -> bool {
        match self.intake.pick_from_library().await {
            Ok(Some(image)) => {
                self.draft.set_local_image(Some(image));
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.notify_error(&e);
                false
            }
        }
    }

    pub async fn capture_image(&mut self) -> bool {
        match self.intake.capture_from_camera().await {
            Ok(Some(image)) => {
                self.draft.set_local_image(Some(image));
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.notify_error(&e);
                false
            }
        }
    }

    /// 送信。成功時はドラフトを破棄して完了を記録する
    pub async fn submit(&mut self) -> Result<SpotId> {
        match self.orchestrator.submit(&mut self.draft).await {
            Ok(id) => {
                self.notifier.alert("Success", "Spot added!");
                self.draft = Draft::new();
                self.pending_location = None;
                self.completed = Some(id);
                Ok(id)
            }
            Err(e) => {
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// 投稿をやめて画面を離れる
    pub fn cancel(self) {
        debug!("add spot workflow cancelled; draft discarded");
    }

    fn notify_error(&self, error: &SpotError) {
        let message = match error {
            SpotError::PermissionDenied(PermissionKind::Camera) => {
                "Camera permission is required to take a photo.".to_string()
            }
            other => other.to_string(),
        };
        self.notifier.alert(error.alert_title(), &message);
    }
}
