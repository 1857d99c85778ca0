//! Image primitives and utilities.
//!
//! The project uses a lightweight owned RGB image type (`OwnedImage`) that is
//! optimized for repeated cropping of screen captures.
//!
//! For many operations we borrow a view (`Image<'a>`) instead of copying
//! pixels. This keeps the vision pipeline fast while still allowing easy
//! conversion to owned images when needed (upscaling, debug snapshots, etc.).

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width / 4;
        let data = bytes
            .chunks_exact(4)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Enlarge this image by an integer factor.
    ///
    /// Chat overlay fonts are small; recognizers need more pixel density than
    /// the raw capture provides. All downstream pixel coordinates are in the
    /// enlarged space.
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) and keeps output in `Vec<Color>`.
    pub fn upscale(&mut self, factor: u32) {
        if factor <= 1 || self.width == 0 || self.height == 0 {
            return;
        }

        let width = self.width * factor;
        let height = self.height * factor;

        // SAFETY: `Color` is `#[repr(C)]` with 3 x `u8`, so it is layout-compatible
        // with `fast_image_resize::pixels::U8x3` (alignment 1).
        let src_pixels = unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const fast_image_resize::pixels::U8x3,
                self.data.len(),
            )
        };

        let src = fast_image_resize::images::ImageRef::from_pixels(self.width, self.height, src_pixels)
            .expect("fast_image_resize: ImageRef::from_pixels failed");

        let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &Some(options))
            .expect("fast_image_resize: resize failed");

        let bytes: Vec<u8> = dst.into_vec();
        let mut data = Vec::with_capacity((width * height) as usize);
        for px in bytes.chunks_exact(3) {
            data.push(Color::new(px[0], px[1], px[2]));
        }

        self.width = width;
        self.height = height;
        self.data = data;
    }

    #[inline]
    pub fn upscaled(mut self, factor: u32) -> Self {
        self.upscale(factor);
        self
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Pixel at view-relative coordinates.
    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(self.x1 + x + (self.y1 + y) * self.true_width) as usize]
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                data.push(self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; (self.width() * self.height() * 3) as usize];
        let mut i = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                let clr = self.pixel(x, y);
                bytes[i] = clr.r;
                bytes[i + 1] = clr.g;
                bytes[i + 2] = clr.b;
                i += 3;
            }
        }
        bytes
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self.get_bytes();
        let img = image::RgbImage::from_raw(self.width(), self.height(), bytes)
            .context("RgbImage::from_raw failed")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .context("save png")?;
        Ok(())
    }

    /// Create an arbitrary subimage (relative coordinates).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }
}

// ----------

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn center_y(&self) -> u32 {
        self.y + self.h / 2
    }

    /// Horizontal gap between two rects (0 when they overlap horizontally).
    pub fn h_gap(&self, other: &Rect) -> u32 {
        let left = self.x.max(other.x);
        let right = self.right().min(other.right());
        left.saturating_sub(right)
    }

    /// Vertical gap between two rects (0 when they overlap vertically).
    pub fn v_gap(&self, other: &Rect) -> u32 {
        let top = self.y.max(other.y);
        let bottom = self.bottom().min(other.bottom());
        top.saturating_sub(bottom)
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue/saturation/value triple in OpenCV 8-bit convention:
/// hue in `0..180` (degrees halved), saturation and value in `0..=255`.
///
/// Keeping the OpenCV scale means the empirically tuned chat color bands carry
/// over without conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to HSV (OpenCV 8-bit convention, see [`Hsv`]).
    pub fn to_hsv(self) -> Hsv {
        let r = self.r as f32;
        let g = self.g as f32;
        let b = self.b as f32;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let v = max;
        let s = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta)
        } else if max == g {
            60.0 * ((b - r) / delta) + 120.0
        } else {
            60.0 * ((r - g) / delta) + 240.0
        };
        let h = if h < 0.0 { h + 360.0 } else { h };

        Hsv {
            h: ((h / 2.0).round() as u16 % 180) as u8,
            s: s.round() as u8,
            v: v.round() as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(width: u32, height: u32, color: Color) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            bytes.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        bytes
    }

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(Color::new(255, 0, 0).to_hsv(), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(Color::new(0, 255, 0).to_hsv(), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(Color::new(0, 0, 255).to_hsv(), Hsv { h: 120, s: 255, v: 255 });
        assert_eq!(Color::WHITE.to_hsv(), Hsv { h: 0, s: 0, v: 255 });
        assert_eq!(Color::BLACK.to_hsv(), Hsv { h: 0, s: 0, v: 0 });
    }

    #[test]
    fn hsv_of_dota_blue() {
        // Player slot 1 blue, the most common sender color.
        let hsv = Color::new(51, 117, 255).to_hsv();
        assert!((105..=115).contains(&hsv.h), "hue {}", hsv.h);
        assert!(hsv.s > 150);
        assert!(hsv.v > 200);
    }

    #[test]
    fn upscale_doubles_dimensions() {
        let img = OwnedImage::from_rgba(4, &rgba(4, 3, Color::new(10, 20, 30)));
        let img = img.upscaled(2);
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 6);
        assert_eq!(img.as_image().pixel(3, 3), Color::new(10, 20, 30));
    }

    #[test]
    fn sub_image_is_clamped_and_relative() {
        let mut bytes = rgba(4, 4, Color::BLACK);
        // Mark pixel (2, 1) white.
        let idx = (1 * 4 + 2) * 4;
        bytes[idx..idx + 3].copy_from_slice(&[255, 255, 255]);

        let img = OwnedImage::from_rgba(4, &bytes);
        let view = img.as_image().sub_image(2, 1, 10, 10);
        assert_eq!(view.width(), 2);
        assert_eq!(view.height(), 3);
        assert_eq!(view.pixel(0, 0), Color::WHITE);
    }
}
