//! Translation boundary.
//!
//! The backend is an external collaborator: text plus a source-language hint
//! in, translated text out. Failures and an exhausted quota both degrade to
//! returning the input unchanged; a missed translation is never worth
//! aborting a snapshot over.

use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::usage::UsageTracker;

pub trait Translator {
    /// `source_hint` is a BCP-47 code or `"und"` for undetermined.
    fn translate(&self, text: &str, source_hint: &str) -> String;
}

/// Pass-through used when no API key is configured.
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate(&self, text: &str, _source_hint: &str) -> String {
        text.to_string()
    }
}

/// Google Cloud Translation v2 REST client.
pub struct GoogleTranslator {
    endpoint: String,
    api_key: String,
    target: String,
    tracker: Mutex<UsageTracker>,
}

#[derive(Deserialize)]
struct ApiResponse {
    data: ApiData,
}

#[derive(Deserialize)]
struct ApiData {
    translations: Vec<ApiTranslation>,
}

#[derive(Deserialize)]
struct ApiTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

const ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

impl GoogleTranslator {
    pub fn new(api_key: String, target: String, tracker: UsageTracker) -> Self {
        Self {
            endpoint: ENDPOINT.to_string(),
            api_key,
            target,
            tracker: Mutex::new(tracker),
        }
    }

    fn request(&self, text: &str, source_hint: &str) -> Result<String> {
        let mut body = serde_json::json!({
            "q": text,
            "target": self.target,
            "format": "text",
        });
        if source_hint != "und" && !source_hint.is_empty() {
            body["source"] = serde_json::Value::String(source_hint.to_string());
        }

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let mut response = ureq::post(&url)
            .send_json(&body)
            .context("translation request failed")?;
        let parsed: ApiResponse = response
            .body_mut()
            .read_json()
            .context("parse translation response")?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| anyhow!("translation response contained no translations"))
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, source_hint: &str) -> String {
        if text.trim().is_empty() || source_hint.eq_ignore_ascii_case(&self.target) {
            return text.to_string();
        }

        let mut tracker = self.tracker.lock().expect("usage tracker lock poisoned");
        if tracker.limit_reached() {
            tracing::warn!("translation free tier exhausted for this month; passing text through");
            return text.to_string();
        }

        match self.request(text, source_hint) {
            Ok(translated) => {
                tracker.add_characters(text.chars().count() as u64);
                translated
            }
            Err(err) => {
                tracing::warn!(error = %err, "translation failed; passing text through");
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_translator_passes_text_through() {
        assert_eq!(NoopTranslator.translate("привет", "und"), "привет");
    }

    #[test]
    fn same_language_hint_skips_translation() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::at_path(dir.path().join("usage.json"));
        let translator = GoogleTranslator::new("key".into(), "en".into(), tracker);

        // No HTTP call is made for text already in the target language.
        assert_eq!(translator.translate("hello", "EN"), "hello");
        assert_eq!(translator.translate("   ", "und"), "   ");
    }
}
