//! Snapshot worker.
//!
//! One user trigger produces at most one pipeline run: a busy flag rejects
//! triggers that arrive while a run is in flight, so display output and the
//! sender registry are only ever touched by a single run at a time.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use crate::capture;
use crate::config::Config;
use crate::translate::Translator;

pub struct Worker {
	inner: Arc<Inner>,
}

struct Inner {
	busy: AtomicBool,
	config: Config,
	ce: ce::Ce,
	ocr: ce::Ocr,
	translator: Box<dyn Translator + Send + Sync>,
	/// Session-lifetime sender memory, mutated only by the active run.
	registry: Mutex<ce::SenderRegistry>,
}

impl Worker {
	pub fn new(
		config: Config,
		ocr: ce::Ocr,
		translator: Box<dyn Translator + Send + Sync>,
	) -> Self {
		Self {
			inner: Arc::new(Inner {
				busy: AtomicBool::new(false),
				config,
				ce: ce::Ce::default(),
				ocr,
				translator,
				registry: Mutex::new(ce::SenderRegistry::default()),
			}),
		}
	}

	/// Start a snapshot run on a background thread.
	///
	/// Returns `false` when a previous run is still in flight; the trigger is
	/// dropped, not queued.
	pub fn trigger(&self) -> bool {
		if self.inner.busy.swap(true, Ordering::SeqCst) {
			tracing::info!("snapshot ignored; previous run still in flight");
			return false;
		}

		let inner = self.inner.clone();
		std::thread::spawn(move || {
			if let Err(err) = run(&inner) {
				tracing::error!(error = %err, "snapshot failed");
				println!("error: {err:#}");
			}
			inner.busy.store(false, Ordering::SeqCst);
		});
		true
	}
}

fn run(inner: &Inner) -> Result<()> {
	let frame = capture::capture_chat(&inner.config.app_name, inner.config.chat_region)
		.context("window capture failed (is the game running?)")?;

	let mut registry = inner.registry.lock().expect("registry lock poisoned");
	let mut messages = inner.ce.extract_messages(&frame, &inner.ocr, &mut registry)?;
	drop(registry);

	if messages.is_empty() {
		println!("(no chat text found)");
		return Ok(());
	}

	for message in &mut messages {
		if !message.message.is_empty() {
			message.translated = inner.translator.translate(&message.message, "und");
		}
		println!("{}", format_message(message));
	}

	Ok(())
}

/// Render one message the way the overlay shows it, with the original in
/// parentheses when a translation actually happened.
pub fn format_message(message: &ce::ParsedMessage) -> String {
	let mut line = String::new();
	if let Some(ref tag) = message.tag {
		line.push_str(&format!("[{tag}] "));
	}
	if let Some(ref sender) = message.sender {
		line.push_str(&format!("{sender}: "));
	}

	if message.translated.trim() == message.message.trim() || message.translated.is_empty() {
		line.push_str(&message.message);
	} else {
		line.push_str(&format!("{} ({})", message.translated, message.message));
	}
	line
}

#[cfg(test)]
mod tests {
	use super::*;

	fn message(
		tag: Option<&str>,
		sender: Option<&str>,
		text: &str,
		translated: &str,
	) -> ce::ParsedMessage {
		ce::ParsedMessage {
			tag: tag.map(str::to_string),
			sender: sender.map(str::to_string),
			message: text.to_string(),
			translated: translated.to_string(),
		}
	}

	#[test]
	fn translated_message_shows_original_in_parentheses() {
		let m = message(Some("Allies"), Some("Bob"), "привет", "hello");
		assert_eq!(format_message(&m), "[Allies] Bob: hello (привет)");
	}

	#[test]
	fn untranslated_message_is_shown_once() {
		let m = message(None, Some("Bob"), "hello", "hello");
		assert_eq!(format_message(&m), "Bob: hello");

		let m = message(None, None, "gg", "");
		assert_eq!(format_message(&m), "gg");
	}
}
