//! Connected-component denoising.
//!
//! Compression artifacts and color bleed from the game world put plenty of
//! stray pixels inside the HSV bands. A blob survives only if it
//! 1. has plausible glyph geometry,
//! 2. sits on the darkened chat backdrop (shadow field), and
//! 3. is an anchor (a co-linear neighbor or a bracket profile) or lies next
//!    to one (punctuation rescue).

use std::collections::HashSet;

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::image::{Image, Rect};
use crate::mask::MASK_ON;
use crate::tuning::Tuning;

/// A connected component of a binary mask.
#[derive(Debug, Clone, Copy)]
pub struct Blob {
    pub label: u32,
    pub bounds: Rect,
    pub area: u32,
}

/// Label 8-connected components and collect their bounding boxes and areas.
pub fn label_blobs(mask: &GrayImage) -> (image::ImageBuffer<Luma<u32>, Vec<u32>>, Vec<Blob>) {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // label -> (min_x, min_y, max_x, max_y, area)
    let mut extents: Vec<(u32, (u32, u32, u32, u32, u32))> = Vec::new();
    for (x, y, p) in labels.enumerate_pixels() {
        let label = p.0[0];
        if label == 0 {
            continue;
        }
        match extents.iter_mut().find(|(l, _)| *l == label) {
            Some((_, e)) => {
                e.0 = e.0.min(x);
                e.1 = e.1.min(y);
                e.2 = e.2.max(x);
                e.3 = e.3.max(y);
                e.4 += 1;
            }
            None => extents.push((label, (x, y, x, y, 1))),
        }
    }

    let blobs = extents
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, area))| Blob {
            label,
            bounds: Rect {
                x: min_x,
                y: min_y,
                w: max_x - min_x + 1,
                h: max_y - min_y + 1,
            },
            area,
        })
        .collect();

    (labels, blobs)
}

/// Dilated mask of low-brightness pixels.
///
/// Real chat glyphs sit on a darkened backdrop panel; the field is only a
/// validation signal, never text pixels itself.
pub fn shadow_field(image: Image, tuning: &Tuning) -> GrayImage {
    let mut field = GrayImage::new(image.width(), image.height());
    for y in 0..image.height() {
        for x in 0..image.width() {
            if image.pixel(x, y).to_hsv().v <= tuning.shadow_value_max {
                field.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }
    if tuning.shadow_dilation > 0 {
        field = dilate(&field, Norm::LInf, tuning.shadow_dilation);
    }
    field
}

/// Whether any pixel of `bounds` lies in the shadow field.
pub fn touches_shadow(shadow: &GrayImage, bounds: Rect) -> bool {
    let x2 = bounds.right().min(shadow.width());
    let y2 = bounds.bottom().min(shadow.height());
    for y in bounds.y..y2 {
        for x in bounds.x..x2 {
            if shadow.get_pixel(x, y).0[0] > 0 {
                return true;
            }
        }
    }
    false
}

/// Whether a blob has plausible glyph geometry.
pub fn plausible_glyph(blob: &Blob, tuning: &Tuning) -> bool {
    (tuning.min_glyph_height..=tuning.max_glyph_height).contains(&blob.bounds.h)
        && (tuning.min_blob_area..=tuning.max_blob_area).contains(&blob.area)
}

fn is_anchor(blob: &Blob, candidates: &[Blob], tuning: &Tuning) -> bool {
    // Bracket glyphs ("[", "]", "|") are thin and tall and often have no
    // baseline-mate close enough.
    if blob.bounds.h >= tuning.bracket_min_height && blob.bounds.w * 2 <= blob.bounds.h {
        return true;
    }

    candidates.iter().any(|other| {
        other.label != blob.label
            && other.bounds.bottom().abs_diff(blob.bounds.bottom()) <= tuning.baseline_tolerance
            && other.bounds.h_gap(&blob.bounds) <= tuning.anchor_gap
    })
}

fn near_anchor(blob: &Blob, anchors: &[Blob], tuning: &Tuning) -> bool {
    anchors.iter().any(|anchor| {
        anchor.bounds.v_gap(&blob.bounds) <= tuning.rescue_dy
            && anchor.bounds.h_gap(&blob.bounds) <= tuning.rescue_dx
    })
}

/// Zero out every component of `mask` that fails the admission filters.
pub fn clean_mask(mask: &GrayImage, shadow: &GrayImage, tuning: &Tuning) -> GrayImage {
    let (labels, blobs) = label_blobs(mask);

    let candidates: Vec<Blob> = blobs
        .into_iter()
        .filter(|b| plausible_glyph(b, tuning))
        .filter(|b| touches_shadow(shadow, b.bounds))
        .collect();

    let (anchors, strays): (Vec<Blob>, Vec<Blob>) = candidates
        .iter()
        .copied()
        .partition(|b| is_anchor(b, &candidates, tuning));

    let mut kept: HashSet<u32> = anchors.iter().map(|b| b.label).collect();
    // Rescue punctuation that fails the neighbor test alone but belongs to an
    // anchored word.
    kept.extend(
        strays
            .iter()
            .filter(|b| near_anchor(b, &anchors, tuning))
            .map(|b| b.label),
    );

    let mut out = mask.clone();
    for (x, y, p) in out.enumerate_pixels_mut() {
        if p.0[0] > 0 && !kept.contains(&labels.get_pixel(x, y).0[0]) {
            p.0[0] = 0;
        }
    }
    out
}
