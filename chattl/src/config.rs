//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Screen rectangle of the in-game chat overlay, in window coordinates.
///
/// Selected once by the user (region-selection UI lives outside this binary)
/// and persisted here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// On-disk configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target window application name (from `xcap::Window::app_name()`).
    ///
    /// This is reasonably stable across restarts. If multiple windows share the
    /// same app name, the first match is used.
    pub app_name: String,

    /// Chat overlay rectangle within the captured window.
    pub chat_region: Region,

    /// Language everything is translated into.
    pub target_language: String,

    /// Language set passed to the recognizer.
    pub ocr_languages: String,

    /// Explicit path to the tesseract executable; `None` means `$PATH`.
    pub tesseract_path: Option<PathBuf>,

    /// Translation API key. `None` disables translation (messages pass through).
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "dota2".to_string(),
            chat_region: Region {
                x: 10,
                y: 680,
                width: 560,
                height: 240,
            },
            target_language: "en".to_string(),
            ocr_languages: ce::DEFAULT_LANGUAGES.to_string(),
            tesseract_path: None,
            api_key: None,
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("chattl.json"))
    }

    /// Load configuration from disk, falling back to defaults on missing file.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(back.app_name, cfg.app_name);
        assert_eq!(back.chat_region.width, cfg.chat_region.width);
        assert_eq!(back.ocr_languages, ce::DEFAULT_LANGUAGES);
    }
}
