use crate::api::ApiConfig;
use crate::error::{ReviewError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// APIのURLを上書きする環境変数
pub const API_URL_ENV: &str = "PHOTO_REVIEW_API_URL";

/// APIキーを上書きする環境変数
pub const API_KEY_ENV: &str = "PHOTO_REVIEW_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// スプレッドシートを直接開くためのURL
    pub sheet_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            sheet_url: None,
            timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReviewError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-review").join("config.json"))
    }

    pub fn get_api_url(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                return Ok(url.trim().to_string());
            }
        }

        self.api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ReviewError::MissingApiUrl)
    }

    pub fn get_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ReviewError::MissingApiKey)
    }

    /// API接続設定を組み立てる（起動時に一度だけ）
    pub fn api_config(&self) -> Result<ApiConfig> {
        Ok(ApiConfig {
            base_url: self.get_api_url()?,
            key: self.get_api_key()?,
            timeout: Duration::from_secs(self.timeout_seconds.max(1)),
        })
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        self.api_url = Some(url);
        self.save()
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_sheet_url(&mut self, url: String) -> Result<()> {
        self.sheet_url = Some(url);
        self.save()
    }
}
