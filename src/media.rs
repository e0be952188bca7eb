//! 画像の取り込みとアップロード
//!
//! 取り込み（ライブラリ選択・カメラ撮影）はローカル参照を返すだけで、
//! アップロードは送信時にだけ行う。

use crate::error::{Result, SpotError};
use crate::services::{
    ImagePayload, ImageSource, LocalImage, MediaDevice, MediaStore, PermissionKind,
    PermissionStatus, ServiceError, ServiceResult,
};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// 取り込み対象の画像拡張子
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic", "JPG", "JPEG", "PNG", "WEBP", "HEIC"];

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}

/// 端末からの画像取り込み
#[derive(Clone)]
pub struct MediaIntake {
    device: Arc<dyn MediaDevice>,
}

impl MediaIntake {
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        Self { device }
    }

    pub async fn pick_from_library(&self) -> Result<Option<LocalImage>> {
        let picked = self
            .device
            .pick_from_library()
            .await
            .map_err(SpotError::ImageIntake)?;
        if picked.is_none() {
            debug!("library pick cancelled");
        }
        Ok(picked)
    }

    /// カメラ撮影（権限が拒否された場合は何も取り込まない）
    pub async fn capture_from_camera(&self) -> Result<Option<LocalImage>> {
        if self.device.request_camera_permission().await == PermissionStatus::Denied {
            warn!("camera permission denied");
            return Err(SpotError::PermissionDenied(PermissionKind::Camera));
        }

        let captured = self
            .device
            .capture_from_camera()
            .await
            .map_err(SpotError::ImageIntake)?;
        if captured.is_none() {
            debug!("camera capture cancelled");
        }
        Ok(captured)
    }
}

/// 衝突しにくいオブジェクト名を生成
///
/// `{prefix}_{unix_millis}_{8桁hex}.{ext}`。hex部はURI・ナノ秒時刻・
/// プロセス内連番のSHA-256。
pub fn object_name(prefix: &str, image: &LocalImage) -> String {
    let now = Utc::now();
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(image.uri().as_bytes());
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
    hasher.update(seq.to_le_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}_{}_{}.{}",
        prefix,
        now.timestamp_millis(),
        &digest[..8],
        image.extension()
    )
}

/// ローカル画像を公開URLへ変換するパイプライン
#[derive(Clone)]
pub struct UploadPipeline {
    store: Arc<dyn MediaStore>,
    images: Arc<dyn ImageSource>,
    object_prefix: String,
    cache_control_secs: u32,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn MediaStore>,
        images: Arc<dyn ImageSource>,
        object_prefix: impl Into<String>,
        cache_control_secs: u32,
    ) -> Self {
        Self {
            store,
            images,
            object_prefix: object_prefix.into(),
            cache_control_secs,
        }
    }

    /// 1回だけアップロードして公開URLを返す
    ///
    /// 公開URLが得られない場合も失敗として扱う。
    pub async fn upload(&self, image: &LocalImage) -> Result<String> {
        let payload = self.images.read(image).await.map_err(SpotError::Upload)?;
        let name = object_name(&self.object_prefix, image);
        debug!(object = %name, bytes = payload.bytes.len(), content_type = %payload.content_type, "uploading image");

        self.store
            .upload(&name, payload.bytes, &payload.content_type, self.cache_control_secs)
            .await
            .map_err(|e| {
                warn!(object = %name, error = %e, "image upload failed");
                SpotError::Upload(e)
            })?;

        let url = self.store.public_url(&name).ok_or_else(|| {
            warn!(object = %name, "upload succeeded without a public url");
            SpotError::Upload(ServiceError::new("Could not get public image URL"))
        })?;

        info!(object = %name, "image uploaded");
        Ok(url)
    }
}

/// ファイルシステム上の画像を読む `ImageSource`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSource;

impl FsImageSource {
    fn path_of(image: &LocalImage) -> &Path {
        Path::new(image.uri().strip_prefix("file://").unwrap_or(image.uri()))
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn read(&self, image: &LocalImage) -> ServiceResult<ImagePayload> {
        let path = Self::path_of(image);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ServiceError::new(format!("{}: {}", path.display(), e)))?;
        let content_type = content_type_for(path);
        Ok(ImagePayload { bytes, content_type })
    }
}

/// 拡張子からContent-Typeを推定
pub fn content_type_for(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_CONTENT_TYPE.to_string())
}
