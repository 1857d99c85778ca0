//! Tunable vision parameters.
//!
//! Every HSV band, size bound, and distance tolerance used by the pipeline
//! lives here so that a single `Tuning` value can be threaded through all
//! stages (and overridden wholesale in tests). Defaults are tuned against
//! 1080p captures enlarged 2x.

use crate::mask::{ColorClass, HsvRange};

/// Which vertical reference the line reconstructor groups words by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Vertical center of the word box. Default; robust to descenders.
    Center,
    /// Bottom edge of the word box.
    Baseline,
}

#[derive(Debug, Clone)]
pub struct Tuning {
    /// Integer enlargement factor applied to the capture before masking.
    pub upscale: u32,

    /// Bright, desaturated pixels: message body text.
    pub white: HsvRange,
    /// Hue bands for the ten player colors, indexed by [`ColorClass::player_index`].
    pub players: [HsvRange; 10],

    /// Pixels at or below this value count as backdrop shadow.
    pub shadow_value_max: u8,
    /// L-inf dilation radius applied to the shadow field.
    pub shadow_dilation: u8,

    /// Plausible glyph geometry (enlarged-space pixels).
    pub min_glyph_height: u32,
    pub max_glyph_height: u32,
    pub min_blob_area: u32,
    pub max_blob_area: u32,

    /// Two blobs whose bottom edges differ by at most this much share a baseline.
    pub baseline_tolerance: u32,
    /// Maximum horizontal gap between baseline-mates for anchor promotion.
    pub anchor_gap: u32,
    /// Thin/tall profile: height floor for bracket-like glyphs.
    pub bracket_min_height: u32,
    /// Proximity window for rescuing non-anchor blobs (punctuation).
    pub rescue_dx: u32,
    pub rescue_dy: u32,

    /// Recognizer words below this confidence are dropped (0..100 scale).
    pub min_word_confidence: f32,
    /// Words within this distance of a line's representative y join the line.
    pub line_tolerance: u32,
    pub group_by: GroupBy,

    /// Sender names occupy the left part of a chat line.
    pub sender_left_fraction: f32,
    /// Vertical slack added around a line's bounds for the sender band.
    pub sender_margin: u32,
    /// White border around the inverted sender crop handed to the recognizer.
    pub sender_pad: u32,
}

impl Tuning {
    pub fn range(&self, class: ColorClass) -> HsvRange {
        match class.player_index() {
            Some(i) => self.players[i],
            None => self.white,
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            upscale: 2,

            white: HsvRange::new(0, 179, 0, 100, 150, 255),
            players: [
                // Blue
                HsvRange::new(105, 118, 150, 255, 140, 255),
                // Teal
                HsvRange::new(72, 82, 100, 255, 140, 255),
                // Purple
                HsvRange::new(143, 157, 120, 255, 120, 255),
                // Yellow
                HsvRange::new(26, 33, 120, 255, 150, 255),
                // Orange
                HsvRange::new(8, 16, 150, 255, 150, 255),
                // Pink
                HsvRange::new(160, 172, 80, 255, 150, 255),
                // Olive
                HsvRange::new(32, 40, 100, 255, 110, 255),
                // LightBlue
                HsvRange::new(90, 104, 90, 255, 150, 255),
                // DarkGreen
                HsvRange::new(60, 72, 120, 255, 90, 255),
                // Brown
                HsvRange::new(16, 23, 120, 255, 90, 220),
            ],

            shadow_value_max: 80,
            shadow_dilation: 2,

            min_glyph_height: 3,
            max_glyph_height: 60,
            min_blob_area: 4,
            max_blob_area: 4000,

            baseline_tolerance: 4,
            anchor_gap: 40,
            bracket_min_height: 14,
            rescue_dx: 25,
            rescue_dy: 10,

            min_word_confidence: 30.0,
            line_tolerance: 10,
            group_by: GroupBy::Center,

            sender_left_fraction: 0.42,
            sender_margin: 4,
            sender_pad: 8,
        }
    }
}
