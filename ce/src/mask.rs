//! Color segmentation.
//!
//! Chat text sits on a semi-transparent overlay above arbitrary game art, so
//! recognizer accuracy on the raw capture is poor. Masking down to only the
//! anti-aliased text pixels is the single most important preprocessing step.
//!
//! Message bodies are always white; sender names render in one of ten fixed
//! player colors. Each class gets its own HSV band (see [`crate::Tuning`]).

use image::GrayImage;

use crate::image::{Hsv, Image};
use crate::tuning::Tuning;

pub const MASK_ON: u8 = 255;

/// One color class of overlay text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ColorClass {
    White,
    Blue,
    Teal,
    Purple,
    Yellow,
    Orange,
    Pink,
    Olive,
    LightBlue,
    DarkGreen,
    Brown,
}

impl ColorClass {
    pub const PLAYERS: [ColorClass; 10] = [
        ColorClass::Blue,
        ColorClass::Teal,
        ColorClass::Purple,
        ColorClass::Yellow,
        ColorClass::Orange,
        ColorClass::Pink,
        ColorClass::Olive,
        ColorClass::LightBlue,
        ColorClass::DarkGreen,
        ColorClass::Brown,
    ];

    /// Index into [`Tuning::players`], or `None` for the white class.
    pub fn player_index(self) -> Option<usize> {
        Self::PLAYERS.iter().position(|&c| c == self)
    }
}

/// Inclusive HSV bounds (OpenCV 8-bit scale, hue in `0..180`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl HsvRange {
    pub const fn new(h_min: u8, h_max: u8, s_min: u8, s_max: u8, v_min: u8, v_max: u8) -> Self {
        Self {
            h_min,
            h_max,
            s_min,
            s_max,
            v_min,
            v_max,
        }
    }

    #[inline]
    pub fn contains(&self, p: Hsv) -> bool {
        (self.h_min..=self.h_max).contains(&p.h)
            && (self.s_min..=self.s_max).contains(&p.s)
            && (self.v_min..=self.v_max).contains(&p.v)
    }
}

fn mask_where(image: Image, mut keep: impl FnMut(Hsv) -> bool) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            if keep(image.pixel(x, y).to_hsv()) {
                mask.put_pixel(x, y, image::Luma([MASK_ON]));
            }
        }
    }
    mask
}

/// Binary mask of pixels inside one class's HSV band.
pub fn class_mask(image: Image, class: ColorClass, tuning: &Tuning) -> GrayImage {
    let range = tuning.range(class);
    mask_where(image, |hsv| range.contains(hsv))
}

/// Union of the ten player-color masks (no white). Used for sender isolation.
pub fn player_mask(image: Image, tuning: &Tuning) -> GrayImage {
    mask_where(image, |hsv| {
        tuning.players.iter().any(|range| range.contains(hsv))
    })
}

/// Union of the white mask and all player-color masks.
pub fn combined_mask(image: Image, tuning: &Tuning) -> GrayImage {
    mask_where(image, |hsv| {
        tuning.white.contains(hsv) || tuning.players.iter().any(|range| range.contains(hsv))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Color, OwnedImage};

    fn solid(width: u32, height: u32, color: Color) -> OwnedImage {
        let mut bytes = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            bytes.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        OwnedImage::from_rgba(width as usize, &bytes)
    }

    fn coverage(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] > 0).count()
    }

    #[test]
    fn blue_fill_is_fully_masked_as_blue() {
        let tuning = Tuning::default();
        let img = solid(8, 8, Color::new(51, 117, 255));
        let view = img.as_image();

        assert_eq!(coverage(&class_mask(view, ColorClass::Blue, &tuning)), 64);
        assert_eq!(coverage(&player_mask(view, &tuning)), 64);
        assert_eq!(coverage(&combined_mask(view, &tuning)), 64);
        // Not white: saturated.
        assert_eq!(coverage(&class_mask(view, ColorClass::White, &tuning)), 0);
    }

    #[test]
    fn white_fill_is_masked_white_only() {
        let tuning = Tuning::default();
        let img = solid(4, 4, Color::new(240, 240, 240));
        let view = img.as_image();

        assert_eq!(coverage(&class_mask(view, ColorClass::White, &tuning)), 16);
        assert_eq!(coverage(&player_mask(view, &tuning)), 0);
        assert_eq!(coverage(&combined_mask(view, &tuning)), 16);
    }

    #[test]
    fn out_of_band_pixels_never_reach_the_combined_mask() {
        let tuning = Tuning::default();
        // Mid gray: too dark for white, zero saturation for every player band.
        let img = solid(6, 6, Color::new(100, 100, 100));
        assert_eq!(coverage(&combined_mask(img.as_image(), &tuning)), 0);
    }
}
