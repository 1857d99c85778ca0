//! Chat snapshot translator.
//!
//! Captures the in-game chat overlay of the configured window, extracts
//! structured messages, translates them, and prints the result. Each press of
//! Enter takes one snapshot (a stand-in for the global-hotkey layer).

use std::io::BufRead;

use anyhow::{Context, Result};

mod capture;
mod config;
mod translate;
mod usage;
mod worker;

use config::Config;
use translate::{GoogleTranslator, NoopTranslator, Translator};
use usage::UsageTracker;
use worker::Worker;

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load_or_default();
    if !Config::path()?.exists() {
        // First run: write the defaults so the user has a file to edit.
        config.save().context("write default config")?;
    }

    let ocr = ce::Ocr::try_new(config.tesseract_path.clone(), &config.ocr_languages)
        .context("text recognizer unavailable")?;

    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("CHATTL_API_KEY").ok());
    let translator: Box<dyn Translator + Send + Sync> = match api_key {
        Some(key) => {
            let tracker = UsageTracker::load_or_default()?;
            Box::new(GoogleTranslator::new(key, config.target_language.clone(), tracker))
        }
        None => {
            tracing::warn!("no translation API key configured; messages will not be translated");
            Box::new(NoopTranslator)
        }
    };

    let worker = Worker::new(config, ocr, translator);

    println!("press Enter to snapshot the chat region (Ctrl+C to quit)");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let _ = line.context("read stdin")?;
        worker.trigger();
    }

    Ok(())
}
