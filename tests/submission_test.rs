//! 送信処理テスト
//!
//! 再入防止・アップロードの一回性・オブジェクト名の衝突回避を検証

mod support;

use spot_share::media::{FsImageSource, UploadPipeline};
use spot_share::memory::MemoryBackend;
use spot_share::submit::SubmissionOrchestrator;
use spot_share::{Draft, SpotError, SubmissionState};
use spot_share_common::CategoryId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use support::{point, temp_image, GatedStore};
use tempfile::tempdir;

fn complete_draft(dir: &std::path::Path, image: &str) -> Draft {
    let mut draft = Draft::new();
    draft.set_title("Lakeview Bench");
    draft.set_description("quiet spot");
    draft.set_category(Some(CategoryId::new("parks_and_reserves")));
    draft.set_tags("quiet, free");
    draft.set_coordinate(Some(point(-37.81, 144.96)));
    draft.set_local_image(Some(temp_image(dir, image)));
    draft
}

fn orchestrator(backend: &Arc<MemoryBackend>) -> SubmissionOrchestrator {
    let uploader = UploadPipeline::new(backend.clone(), Arc::new(FsImageSource), "spot", 3600);
    SubmissionOrchestrator::new(backend.clone(), uploader)
}

/// 送信中の2回目の送信は拒否され、アップロードも挿入も始まらない
#[tokio::test]
async fn test_second_submit_while_pending_is_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let gated = Arc::new(GatedStore::new(backend.clone()));
    let uploader = UploadPipeline::new(gated.clone(), Arc::new(FsImageSource), "spot", 3600);
    let orchestrator = SubmissionOrchestrator::new(backend.clone(), uploader);

    let mut first = complete_draft(dir.path(), "a.jpg");
    let mut second = complete_draft(dir.path(), "b.jpg");

    let (first_result, second_result) = tokio::join!(orchestrator.submit(&mut first), async {
        gated.started.notified().await;
        assert!(orchestrator.is_pending());
        let result = orchestrator.submit(&mut second).await;
        gated.release.notify_one();
        result
    });

    assert!(first_result.is_ok());
    assert!(matches!(second_result, Err(SpotError::SubmissionInProgress)));
    assert_eq!(second.submission_state(), SubmissionState::Idle);

    let calls = backend.calls();
    assert_eq!(calls.upload, 1);
    assert_eq!(calls.insert, 1);
    assert!(!orchestrator.is_pending());
}

/// 送信が途中で破棄されてもドラフトは編集可能に戻り、再送信できる
#[tokio::test]
async fn test_abandoned_submit_leaves_draft_retryable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let gated = Arc::new(GatedStore::new(backend.clone()));
    let uploader = UploadPipeline::new(gated.clone(), Arc::new(FsImageSource), "spot", 3600);
    let orchestrator = SubmissionOrchestrator::new(backend.clone(), uploader);
    let mut draft = complete_draft(dir.path(), "a.jpg");

    let outcome = tokio::time::timeout(Duration::from_millis(50), orchestrator.submit(&mut draft)).await;
    assert!(outcome.is_err(), "upload should still be held by the gate");

    assert!(!orchestrator.is_pending());
    assert_eq!(draft.submission_state(), SubmissionState::Failed);
    assert!(draft.remote_image_url().is_none());
    assert_eq!(backend.calls().upload, 0);

    gated.release.notify_one();
    let id = orchestrator.submit(&mut draft).await.expect("retry after abandoned submit");
    assert_eq!(draft.submission_state(), SubmissionState::Succeeded);
    assert_eq!(backend.spots()[0].id, id);
    assert_eq!(backend.calls().upload, 1);
    assert_eq!(backend.calls().insert, 1);
}

/// 失敗後は送信中フラグが戻り、再送信できる
#[tokio::test]
async fn test_guard_released_after_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = orchestrator(&backend);

    let mut draft = complete_draft(dir.path(), "a.jpg");
    backend.fail_upload("network down");
    assert!(orchestrator.submit(&mut draft).await.is_err());
    assert!(!orchestrator.is_pending());

    backend.clear_failures();
    assert!(orchestrator.submit(&mut draft).await.is_ok());
    assert_eq!(draft.submission_state(), SubmissionState::Succeeded);
}

/// 挿入失敗後の再送信はアップロード済みURLを再利用する
#[tokio::test]
async fn test_persistence_retry_reuses_uploaded_url() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = orchestrator(&backend);
    let mut draft = complete_draft(dir.path(), "a.jpg");

    backend.fail_insert("duplicate key value violates unique constraint");
    let err = orchestrator.submit(&mut draft).await.unwrap_err();
    assert!(matches!(err, SpotError::Persistence(_)));
    assert_eq!(
        err.to_string(),
        "保存エラー: duplicate key value violates unique constraint"
    );
    let uploaded = draft.remote_image_url().map(str::to_string);
    assert!(uploaded.is_some());

    backend.clear_failures();
    orchestrator.submit(&mut draft).await.expect("retry failed");

    let calls = backend.calls();
    assert_eq!(calls.upload, 1);
    assert_eq!(calls.insert, 2);
    assert_eq!(backend.spots()[0].image_urls, vec![uploaded.unwrap()]);
    // 失敗した挿入のオブジェクトも含め、ストアには1件だけ
    assert_eq!(backend.object_names().len(), 1);
}

/// 公開URLが得られない場合は挿入しない
#[tokio::test]
async fn test_missing_public_url_blocks_insert() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    backend.omit_public_url();
    let orchestrator = orchestrator(&backend);
    let mut draft = complete_draft(dir.path(), "a.jpg");

    let err = orchestrator.submit(&mut draft).await.unwrap_err();
    assert!(matches!(err, SpotError::Upload(_)));
    assert_eq!(backend.calls().insert, 0);
    assert_eq!(draft.remote_image_url(), None);
}

/// 別々の画像のアップロードはオブジェクト名が衝突しない
#[tokio::test]
async fn test_distinct_images_get_distinct_objects() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let pipeline = UploadPipeline::new(backend.clone(), Arc::new(FsImageSource), "spot", 3600);

    let mut urls = HashSet::new();
    for name in ["a.jpg", "b.jpg", "a.jpg", "c.png"] {
        let image = temp_image(dir.path(), name);
        urls.insert(pipeline.upload(&image).await.expect("upload failed"));
    }

    assert_eq!(urls.len(), 4);
    assert_eq!(backend.object_names().len(), 4);
}

/// 検証エラーは通信を行わない
#[tokio::test]
async fn test_validation_error_makes_no_calls() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = orchestrator(&backend);

    let mut draft = complete_draft(dir.path(), "a.jpg");
    draft.set_local_image(None);

    let err = orchestrator.submit(&mut draft).await.unwrap_err();
    assert_eq!(err.to_string(), "入力が不足しています: 画像");
    assert_eq!(backend.calls().total(), 0);
}
