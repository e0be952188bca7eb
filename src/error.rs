use crate::draft::MissingField;
use crate::services::{PermissionKind, ServiceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpotError {
    #[error("{0}の権限が拒否されました")]
    PermissionDenied(PermissionKind),

    #[error("入力が不足しています: {0}")]
    Validation(MissingField),

    #[error("画像アップロードエラー: {0}")]
    Upload(#[source] ServiceError),

    #[error("保存エラー: {0}")]
    Persistence(#[source] ServiceError),

    #[error("カテゴリ取得エラー: {0}")]
    CatalogLoad(#[source] ServiceError),

    #[error("画像の取得に失敗しました: {0}")]
    ImageIntake(#[source] ServiceError),

    #[error("位置情報エラー: {0}")]
    Location(String),

    #[error("送信処理中です。完了までお待ちください")]
    SubmissionInProgress,

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("接続先が設定されていません。`spot-share config --set-url URL --set-api-key KEY` で設定してください")]
    MissingCredentials,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Common(#[from] spot_share_common::Error),
}

impl SpotError {
    /// ユーザー向けアラートのタイトル
    pub fn alert_title(&self) -> &'static str {
        match self {
            SpotError::PermissionDenied(_) => "Permission denied",
            SpotError::Validation(MissingField::Image) => "Missing Image",
            SpotError::Validation(_) => "Missing Fields",
            SpotError::Upload(_) => "Image Upload Error",
            SpotError::CatalogLoad(_) => "Error fetching categories",
            SpotError::Location(_) => "Location Error",
            _ => "Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SpotError>;
