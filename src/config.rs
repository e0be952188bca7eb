use crate::error::{Result, SpotError};
use serde::{Deserialize, Serialize};
use spot_share_common::LocationPoint;
use std::path::PathBuf;

const API_KEY_ENV: &str = "SPOT_SHARE_API_KEY";
const PROJECT_URL_ENV: &str = "SPOT_SHARE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_url: Option<String>,
    pub api_key: Option<String>,
    pub spots_table: String,
    pub image_bucket: String,
    pub category_rpc: String,
    pub object_prefix: String,
    pub cache_control_secs: u32,
    pub timeout_seconds: u64,
    /// 端末の現在地として扱う固定座標（GPSのない環境向け）
    pub device_location: Option<LocationPoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_url: None,
            api_key: None,
            spots_table: "Spots".into(),
            image_bucket: "location-images".into(),
            category_rpc: "get_category_enum_values".into(),
            object_prefix: "spot".into(),
            cache_control_secs: 3600,
            timeout_seconds: 30,
            device_location: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SpotError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("spot-share").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(SpotError::MissingCredentials)
    }

    pub fn get_project_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var(PROJECT_URL_ENV) {
            if !url.trim().is_empty() {
                return Ok(url.trim_end_matches('/').to_string());
            }
        }

        self.project_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or(SpotError::MissingCredentials)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_project_url(&mut self, url: String) -> Result<()> {
        self.project_url = Some(url);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.spots_table, "Spots");
        assert_eq!(config.image_bucket, "location-images");
        assert_eq!(config.category_rpc, "get_category_enum_values");
        assert_eq!(config.cache_control_secs, 3600);
        assert!(config.device_location.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.object_prefix, "spot");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            project_url: Some("https://demo.supabase.co".into()),
            device_location: Some(LocationPoint::new(-37.81, 144.96).unwrap()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.project_url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(loaded.device_location, config.device_location);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"image_bucket": "photos"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.image_bucket, "photos");
        assert_eq!(loaded.spots_table, "Spots");
    }

    #[test]
    fn test_out_of_range_device_location_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"device_location": {"latitude": 123.0, "longitude": 0.0}}"#).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, SpotError::JsonParse(_)));
    }
}
