//! 外部サービスのポート定義
//!
//! 永続化・メディアストア・端末機能はすべてトレイト越しに注入する。
//! 実装は `remote`（HTTP）、`memory`（インプロセス）、`terminal`（対話端末）。

use async_trait::async_trait;
use spot_share_common::{LocationPoint, NewSpot, Spot, SpotId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 外部サービスが返すエラー（メッセージはそのまま利用者に見せる）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Location,
    Camera,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionKind::Location => write!(f, "位置情報"),
            PermissionKind::Camera => write!(f, "カメラ"),
        }
    }
}

/// 端末上の画像への参照（ファイルパスやURI）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalImage {
    uri: String,
}

impl LocalImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 末尾の拡張子（なければ `jpg`）
    pub fn extension(&self) -> &str {
        let name = self.uri.rsplit(['/', '\\']).next().unwrap_or(&self.uri);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => "jpg",
        }
    }
}

/// アップロード用に読み込んだ画像
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// スポット一覧
    async fn select_spots(&self) -> ServiceResult<Vec<Spot>>;

    /// 1件を原子的に挿入し、採番されたIDを返す
    async fn insert_spot(&self, spot: &NewSpot) -> ServiceResult<SpotId>;

    /// 文字列配列を返すストアドプロシージャ呼び出し
    async fn rpc_strings(&self, procedure: &str) -> ServiceResult<Vec<String>>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        cache_control_secs: u32,
    ) -> ServiceResult<()>;

    /// 公開URL（取得できない場合は `None`）
    fn public_url(&self, object_name: &str) -> Option<String>;
}

#[async_trait]
pub trait LocationServices: Send + Sync {
    async fn request_location_permission(&self) -> PermissionStatus;

    async fn current_position(&self) -> ServiceResult<LocationPoint>;
}

#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// ライブラリから選択（キャンセル時は `None`）
    async fn pick_from_library(&self) -> ServiceResult<Option<LocalImage>>;

    async fn request_camera_permission(&self) -> PermissionStatus;

    /// カメラで撮影（キャンセル時は `None`）
    async fn capture_from_camera(&self) -> ServiceResult<Option<LocalImage>>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn read(&self, image: &LocalImage) -> ServiceResult<ImagePayload>;
}

/// ユーザー向けメッセージの表示先
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// ワークフローに注入する協調オブジェクト一式
#[derive(Clone)]
pub struct Services {
    pub persistence: Arc<dyn PersistenceService>,
    pub media_store: Arc<dyn MediaStore>,
    pub location: Arc<dyn LocationServices>,
    pub media_device: Arc<dyn MediaDevice>,
    pub images: Arc<dyn ImageSource>,
    pub notifier: Arc<dyn Notifier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_image_extension() {
        assert_eq!(LocalImage::new("file:///tmp/photo.png").extension(), "png");
        assert_eq!(LocalImage::new("C:\\photos\\bench.JPG").extension(), "JPG");
        assert_eq!(LocalImage::new("/tmp/archive.tar.gz").extension(), "gz");
    }

    #[test]
    fn test_local_image_extension_default() {
        assert_eq!(LocalImage::new("/tmp/photo").extension(), "jpg");
        assert_eq!(LocalImage::new("/tmp/.hidden").extension(), "jpg");
        assert_eq!(LocalImage::new("/tmp.d/photo").extension(), "jpg");
    }

    #[test]
    fn test_service_error_display_is_verbatim() {
        let e = ServiceError::with_status(409, "duplicate key value");
        assert_eq!(e.to_string(), "duplicate key value");
        assert_eq!(e.status, Some(409));
    }
}
