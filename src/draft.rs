//! 投稿中スポットのドラフト
//!
//! ワークフローの間、フォームの全項目を保持する唯一の状態。
//! ローカル画像を差し替えると、解決済みのリモートURLは必ず破棄される。

use crate::error::Result;
use crate::services::LocalImage;
use spot_share_common::{parse_tags, CategoryId, LocationPoint};
use std::fmt;
use tracing::debug;

/// 送信処理の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Uploading,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Uploading | SubmissionState::Submitting)
    }
}

/// 未入力の項目グループ（検証の優先順）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    RequiredText,
    Category,
    Tags,
    Location,
    Image,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::RequiredText => write!(f, "タイトルと説明"),
            MissingField::Category => write!(f, "カテゴリ"),
            MissingField::Tags => write!(f, "タグ"),
            MissingField::Location => write!(f, "位置"),
            MissingField::Image => write!(f, "画像"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    title: String,
    description: String,
    category: Option<CategoryId>,
    /// 入力されたままのカンマ区切り文字列
    tags: String,
    coordinate: Option<LocationPoint>,
    local_image: Option<LocalImage>,
    remote_image_url: Option<String>,
    submission_state: SubmissionState,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    pub fn set_category(&mut self, category: Option<CategoryId>) {
        self.category = category;
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.tags = tags.into();
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub fn coordinate(&self) -> Option<LocationPoint> {
        self.coordinate
    }

    /// 座標を上書き（後から届いた値が勝つ）
    pub fn set_coordinate(&mut self, coordinate: Option<LocationPoint>) {
        self.coordinate = coordinate;
    }

    /// 手入力の緯度経度を反映
    ///
    /// 変換できない場合は座標を未設定に戻してエラーを返す。
    pub fn set_manual_coordinate(&mut self, latitude: &str, longitude: &str) -> Result<LocationPoint> {
        match LocationPoint::parse(latitude, longitude) {
            Ok(point) => {
                self.coordinate = Some(point);
                Ok(point)
            }
            Err(e) => {
                self.coordinate = None;
                Err(e.into())
            }
        }
    }

    pub fn local_image(&self) -> Option<&LocalImage> {
        self.local_image.as_ref()
    }

    pub fn set_local_image(&mut self, image: Option<LocalImage>) {
        if self.remote_image_url.take().is_some() {
            debug!("local image changed; discarding uploaded url");
        }
        self.local_image = image;
    }

    pub fn remote_image_url(&self) -> Option<&str> {
        self.remote_image_url.as_deref()
    }

    /// アップロード完了を記録（現在のローカル画像に対応するURL）
    pub(crate) fn record_upload(&mut self, url: String) {
        self.remote_image_url = Some(url);
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission_state
    }

    pub(crate) fn set_submission_state(&mut self, state: SubmissionState) {
        debug!(from = ?self.submission_state, to = ?state, "submission state");
        self.submission_state = state;
    }

    /// 最初に不足している項目グループ
    pub fn first_missing(&self) -> Option<MissingField> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Some(MissingField::RequiredText);
        }
        if self.category.is_none() {
            return Some(MissingField::Category);
        }
        if self.tag_list().is_empty() {
            return Some(MissingField::Tags);
        }
        if self.coordinate.is_none() {
            return Some(MissingField::Location);
        }
        if self.local_image.is_none() && self.remote_image_url.is_none() {
            return Some(MissingField::Image);
        }
        None
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}
