//! Targeted sender extraction.
//!
//! Sender names are colored while the message body is white, and the two often
//! abut with no gap the full-frame pass preserves. Re-isolating just the
//! colored pixels in a narrow left-side band of the line and recognizing that
//! small crop on its own is far more accurate than parsing the name out of the
//! combined line text.

use std::sync::LazyLock;

use anyhow::Result;
use image::{GrayImage, Luma};
use regex::Regex;

use crate::denoise;
use crate::image::OwnedImage;
use crate::lines::TextLine;
use crate::mask;
use crate::ocr::Recognizer;
use crate::tuning::Tuning;

/// Characters plausible in a player handle; everything else is recognizer noise.
static ALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w \-\.\[\]]").unwrap());

/// Try to read a colored sender name for one reconstructed line.
///
/// `None` is a valid outcome: system lines and tag-only lines have no sender.
pub fn extract(
    frame: &OwnedImage,
    line: &TextLine,
    tuning: &Tuning,
    recognizer: &dyn Recognizer,
) -> Result<Option<String>> {
    let view = frame.as_image();

    let y0 = line.y_min.saturating_sub(tuning.sender_margin);
    let y1 = (line.y_max + tuning.sender_margin).min(view.height());
    if y1 <= y0 {
        return Ok(None);
    }

    // Names always precede the message on the same line.
    let band_w = ((view.width() as f32 * tuning.sender_left_fraction) as u32).max(1);
    let band = view.sub_image(0, y0, band_w, y1 - y0);

    let colored = mask::player_mask(band, tuning);
    let shadow = denoise::shadow_field(band, tuning);

    let (_, blobs) = denoise::label_blobs(&colored);
    let valid: Vec<_> = blobs
        .into_iter()
        .filter(|b| b.area >= tuning.min_blob_area && b.bounds.h <= tuning.max_glyph_height)
        .filter(|b| denoise::touches_shadow(&shadow, b.bounds))
        .collect();
    if valid.is_empty() {
        return Ok(None);
    }

    let x_min = valid.iter().map(|b| b.bounds.x).min().unwrap_or(0);
    let x_max = valid
        .iter()
        .map(|b| b.bounds.right())
        .max()
        .unwrap_or(band.width());
    let y_min = valid.iter().map(|b| b.bounds.y).min().unwrap_or(0);
    let y_max = valid
        .iter()
        .map(|b| b.bounds.bottom())
        .max()
        .unwrap_or(band.height());

    // Tight crop, inverted to dark text on a light background with a border;
    // recognizers handle that far better than sparse white-on-black pixels.
    let pad = tuning.sender_pad;
    let crop_w = x_max - x_min + pad * 2;
    let crop_h = y_max - y_min + pad * 2;
    let mut crop = GrayImage::from_pixel(crop_w, crop_h, Luma([255]));
    for y in y_min..y_max {
        for x in x_min..x_max {
            if colored.get_pixel(x, y).0[0] > 0 {
                crop.put_pixel(x - x_min + pad, y - y_min + pad, Luma([0]));
            }
        }
    }

    let text = recognizer.line(&crop)?;
    let name = sanitize(&text);
    if name.chars().count() < 2 {
        return Ok(None);
    }
    Ok(Some(name))
}

fn sanitize(text: &str) -> String {
    ALLOWED.replace_all(text, "").trim().to_string()
}
