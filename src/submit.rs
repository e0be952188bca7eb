//! 送信処理
//!
//! 検証 → （必要なら）画像アップロード → ペイロード組み立て → 1回の挿入。
//! 挿入に失敗してもアップロード済みオブジェクトは削除しない。
//! URLはドラフトに残るので、再送信時は再アップロードせずに済む。

use crate::draft::{Draft, MissingField, SubmissionState};
use crate::error::{Result, SpotError};
use crate::media::UploadPipeline;
use crate::services::PersistenceService;
use spot_share_common::{NewSpot, SpotId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SubmissionOrchestrator {
    persistence: Arc<dyn PersistenceService>,
    uploader: UploadPipeline,
    in_flight: AtomicBool,
}

/// 送信1回分の排他
///
/// 途中でフューチャーが破棄されても、フラグを戻し、
/// 処理中のままのドラフトを `Failed` にして編集可能へ戻す。
struct Attempt<'a> {
    flag: &'a AtomicBool,
    draft: &'a mut Draft,
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.draft.submission_state().is_pending() {
            debug!("submission abandoned mid-flight");
            self.draft.set_submission_state(SubmissionState::Failed);
        }
        self.flag.store(false, Ordering::Release);
    }
}

impl SubmissionOrchestrator {
    pub fn new(persistence: Arc<dyn PersistenceService>, uploader: UploadPipeline) -> Self {
        Self {
            persistence,
            uploader,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn submit(&self, draft: &mut Draft) -> Result<SpotId> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("submit rejected: another attempt is pending");
            return Err(SpotError::SubmissionInProgress);
        }
        let mut attempt = Attempt { flag: &self.in_flight, draft };

        if let Some(missing) = attempt.draft.first_missing() {
            debug!(%missing, "draft incomplete");
            attempt.draft.set_submission_state(SubmissionState::Failed);
            return Err(SpotError::Validation(missing));
        }

        let image_url = match self.resolve_image(attempt.draft).await {
            Ok(url) => url,
            Err(e) => {
                attempt.draft.set_submission_state(SubmissionState::Failed);
                return Err(e);
            }
        };

        let payload = compose_payload(attempt.draft, image_url)?;
        attempt.draft.set_submission_state(SubmissionState::Submitting);

        match self.persistence.insert_spot(&payload).await {
            Ok(id) => {
                info!(%id, title = %payload.title, "spot created");
                attempt.draft.set_submission_state(SubmissionState::Succeeded);
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "spot insert failed");
                attempt.draft.set_submission_state(SubmissionState::Failed);
                Err(SpotError::Persistence(e))
            }
        }
    }

    /// 解決済みURLがあればそれを使い、なければアップロードする
    async fn resolve_image(&self, draft: &mut Draft) -> Result<String> {
        if let Some(url) = draft.remote_image_url() {
            debug!("reusing uploaded image url");
            return Ok(url.to_string());
        }

        let image = draft
            .local_image()
            .cloned()
            .ok_or(SpotError::Validation(MissingField::Image))?;

        draft.set_submission_state(SubmissionState::Uploading);
        let url = self.uploader.upload(&image).await?;
        draft.record_upload(url.clone());
        Ok(url)
    }
}

/// ドラフトから挿入ペイロードを組み立てる
pub fn compose_payload(draft: &Draft, image_url: String) -> Result<NewSpot> {
    let category = draft
        .category()
        .cloned()
        .ok_or(SpotError::Validation(MissingField::Category))?;
    let location = draft
        .coordinate()
        .ok_or(SpotError::Validation(MissingField::Location))?;

    Ok(NewSpot {
        title: draft.title().to_string(),
        description: draft.description().to_string(),
        category,
        tags: draft.tag_list(),
        image_urls: vec![image_url],
        location,
    })
}
