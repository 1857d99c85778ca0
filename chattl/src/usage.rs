//! Monthly translation quota tracking.
//!
//! The translation API bills per character past a free tier. Usage is counted
//! per calendar month and persisted next to the config; once the limit is
//! reached the gate closes until the month rolls over.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const FREE_TIER_CHARACTERS: u64 = 500_000;
const WARN_PERCENTAGE: f64 = 80.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UsageData {
    month: String,
    characters: u64,
}

#[derive(Debug)]
pub struct UsageTracker {
    data: UsageData,
    path: PathBuf,
}

fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

impl UsageTracker {
    pub fn load_or_default() -> Result<Self> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(Self::at_path(base.join("chattl-usage.json")))
    }

    pub fn at_path(path: PathBuf) -> Self {
        let data = fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str::<UsageData>(&json).ok())
            .unwrap_or_else(|| UsageData {
                month: current_month(),
                characters: 0,
            });

        let mut tracker = Self { data, path };
        tracker.roll_month();
        tracker
    }

    fn roll_month(&mut self) {
        let month = current_month();
        if self.data.month != month {
            self.data.month = month;
            self.data.characters = 0;
            self.save();
        }
    }

    fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.data) {
            Ok(json) => json,
            Err(_) => return,
        };
        if let Err(err) = fs::write(&self.path, json) {
            tracing::warn!(error = %err, "failed to persist usage data");
        }
    }

    pub fn limit_reached(&mut self) -> bool {
        self.roll_month();
        self.data.characters >= FREE_TIER_CHARACTERS
    }

    pub fn add_characters(&mut self, count: u64) {
        self.roll_month();
        self.data.characters += count;
        self.save();

        let used = self.percentage();
        if used >= WARN_PERCENTAGE {
            tracing::warn!(
                characters = self.characters(),
                limit = FREE_TIER_CHARACTERS,
                "translation usage at {used:.0}% of the free tier"
            );
        }
    }

    pub fn characters(&self) -> u64 {
        self.data.characters
    }

    pub fn percentage(&self) -> f64 {
        self.data.characters as f64 / FREE_TIER_CHARACTERS as f64 * 100.0
    }
}
