//! End-to-end extraction for one snapshot.
//!
//! capture -> enlarge -> color masks -> denoise -> word recognition ->
//! line reconstruction -> per-line sender pass -> parse.
//!
//! Every stage hands owned values to the next; the only state that outlives a
//! run is the caller's [`SenderRegistry`].

use anyhow::Result;
use image::GrayImage;

use crate::denoise;
use crate::image::OwnedImage;
use crate::lines;
use crate::mask;
use crate::ocr::Recognizer;
use crate::parse::{self, ParsedMessage, SenderRegistry};
use crate::sender;
use crate::tuning::Tuning;

/// Extract structured chat messages from one captured frame.
///
/// Returns an empty list when no text is found; that is not an error.
pub fn extract_messages(
    frame: &OwnedImage,
    tuning: &Tuning,
    recognizer: &dyn Recognizer,
    registry: &mut SenderRegistry,
) -> Result<Vec<ParsedMessage>> {
    let frame = frame.clone().upscaled(tuning.upscale);
    let view = frame.as_image();

    let combined = mask::combined_mask(view, tuning);
    let shadow = denoise::shadow_field(view, tuning);
    let cleaned = denoise::clean_mask(&combined, &shadow, tuning);

    if debug_images() {
        let _ = view.save_png("debug_frame.png");
        let _ = combined.save("debug_mask_combined.png");
        let _ = cleaned.save("debug_mask_cleaned.png");
    }

    let words = recognizer.words(&inverted(&cleaned))?;
    let lines = lines::reconstruct(words, tuning);

    let mut messages = Vec::new();
    for line in &lines {
        let color_sender = sender::extract(&frame, line, tuning, recognizer)?;
        parse::push_line(&mut messages, &line.text, color_sender, registry);
    }

    Ok(messages)
}

/// Masks are text-on-black; recognizers want dark text on a light background.
fn inverted(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for p in out.pixels_mut() {
        p.0[0] = 255 - p.0[0];
    }
    out
}

/// Intermediate mask snapshots for offline inspection, off by default.
fn debug_images() -> bool {
    std::env::var("CHATTL_WRITE_IMAGE").as_deref() == Ok("1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Color, Rect};
    use crate::ocr::RecognizedWord;

    /// Recognizer that replays a fixed word list, ignoring the image.
    struct Scripted {
        words: Vec<RecognizedWord>,
    }

    impl Recognizer for Scripted {
        fn words(&self, _image: &GrayImage) -> Result<Vec<RecognizedWord>> {
            Ok(self.words.clone())
        }
        fn line(&self, _image: &GrayImage) -> Result<String> {
            Ok(String::new())
        }
    }

    fn word(text: &str, x: u32, y: u32, w: u32, h: u32) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            bounds: Rect { x, y, w, h },
            confidence: 90.0,
        }
    }

    fn dark_frame(w: u32, h: u32) -> OwnedImage {
        let c = Color::new(12, 12, 12);
        let mut bytes = Vec::with_capacity((w * h * 4) as usize);
        for _ in 0..w * h {
            bytes.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }
        OwnedImage::from_rgba(w as usize, &bytes)
    }

    fn chat_words() -> Vec<RecognizedWord> {
        vec![
            word("[Allies]", 4, 6, 60, 16),
            word("Bob:", 70, 8, 30, 14),
            word("hello", 106, 6, 40, 16),
            word("there", 150, 7, 40, 15),
            word("Carl:", 4, 46, 36, 16),
            word("gg", 44, 46, 20, 16),
            word("wp", 70, 47, 20, 15),
        ]
    }

    #[test]
    fn full_run_produces_structured_messages() {
        let tuning = Tuning::default();
        let frame = dark_frame(200, 50);
        let recognizer = Scripted { words: chat_words() };
        let mut registry = SenderRegistry::default();

        let messages = extract_messages(&frame, &tuning, &recognizer, &mut registry).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].tag.as_deref(), Some("Allies"));
        assert_eq!(messages[0].sender.as_deref(), Some("Bob"));
        assert_eq!(messages[0].message, "hello there");
        assert_eq!(messages[1].sender.as_deref(), Some("Carl"));
        assert_eq!(messages[1].message, "gg wp");
        assert!(registry.contains("bob"));
        assert!(registry.contains("carl"));
    }

    #[test]
    fn rerun_on_identical_frame_and_registry_is_idempotent() {
        let tuning = Tuning::default();
        let frame = dark_frame(200, 50);
        let recognizer = Scripted { words: chat_words() };

        let mut registry_a = SenderRegistry::default();
        let mut registry_b = SenderRegistry::default();
        let first = extract_messages(&frame, &tuning, &recognizer, &mut registry_a).unwrap();
        let second = extract_messages(&frame, &tuning, &recognizer, &mut registry_b).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn empty_recognizer_output_yields_empty_list() {
        let tuning = Tuning::default();
        let frame = dark_frame(100, 30);
        let recognizer = Scripted { words: Vec::new() };
        let mut registry = SenderRegistry::default();

        let messages = extract_messages(&frame, &tuning, &recognizer, &mut registry).unwrap();
        assert!(messages.is_empty());
    }
}
