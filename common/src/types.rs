//! スポットの型定義
//!
//! - LocationPoint: 緯度経度（範囲検証済みの値）
//! - NewSpot: `Spots` テーブルへ挿入するペイロード
//! - Spot: 永続化済みのスポット

use crate::category::CategoryId;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 緯度経度
///
/// 緯度 [-90, 90]、経度 [-180, 180] の範囲に常に収まる。
/// デシリアライズも `new` を経由する。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLocationPoint")]
pub struct LocationPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawLocationPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawLocationPoint> for LocationPoint {
    type Error = Error;

    fn try_from(raw: RawLocationPoint) -> Result<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl LocationPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidCoordinate(format!("緯度が範囲外です: {}", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate(format!("経度が範囲外です: {}", longitude)));
        }
        Ok(Self { latitude, longitude })
    }

    /// 手入力された文字列から生成
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self> {
        let lat = latitude
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidCoordinate(format!("緯度を数値に変換できません: {:?}", latitude)))?;
        let lon = longitude
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidCoordinate(format!("経度を数値に変換できません: {:?}", longitude)))?;
        Self::new(lat, lon)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for LocationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// 永続化サービスが採番するスポットID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotId(pub i64);

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 挿入用ペイロード（`Spots` テーブルのスキーマに一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpot {
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    pub tags: Vec<String>,
    #[serde(rename = "image_url")]
    pub image_urls: Vec<String>,
    pub location: LocationPoint,
}

/// 永続化済みスポット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: CategoryId,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "image_url", default)]
    pub image_urls: Vec<String>,
    pub location: LocationPoint,
    pub created_at: DateTime<Utc>,
}

impl Spot {
    /// 挿入ペイロードから永続化済みレコードを組み立てる
    pub fn from_new(id: SpotId, new: NewSpot, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            tags: new.tags,
            image_urls: new.image_urls,
            location: new.location,
            created_at,
        }
    }

    /// 一覧表示用の先頭画像
    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}
