//! Line reconstruction from raw recognizer output.
//!
//! The recognizer emits word boxes in no particular order and with plenty of
//! noise. Words sharing a baseline (or vertical center) are regrouped into
//! logical chat lines before parsing.

use crate::ocr::RecognizedWord;
use crate::tuning::{GroupBy, Tuning};

/// One reconstructed chat line, top-to-bottom ordered in the output.
///
/// `y_min`/`y_max` are in enlarged-frame coordinates and drive the later
/// sender re-inspection of the same frame.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub y_min: u32,
    pub y_max: u32,
}

struct Group {
    rep_y: f32,
    count: u32,
    words: Vec<RecognizedWord>,
}

pub fn reconstruct(words: Vec<RecognizedWord>, tuning: &Tuning) -> Vec<TextLine> {
    let mut groups: Vec<Group> = Vec::new();

    for word in words {
        if word.confidence < tuning.min_word_confidence {
            continue;
        }
        if !word.text.chars().any(char::is_alphanumeric) {
            continue;
        }

        let y = match tuning.group_by {
            GroupBy::Center => word.bounds.y as f32 + word.bounds.h as f32 / 2.0,
            GroupBy::Baseline => word.bounds.bottom() as f32,
        };

        match groups
            .iter_mut()
            .find(|g| (g.rep_y - y).abs() <= tuning.line_tolerance as f32)
        {
            Some(group) => {
                group.rep_y = (group.rep_y * group.count as f32 + y) / (group.count + 1) as f32;
                group.count += 1;
                group.words.push(word);
            }
            None => groups.push(Group {
                rep_y: y,
                count: 1,
                words: vec![word],
            }),
        }
    }

    groups.sort_by(|a, b| a.rep_y.total_cmp(&b.rep_y));

    let mut lines: Vec<TextLine> = Vec::new();
    for mut group in groups {
        group.words.sort_by_key(|w| w.bounds.x);

        let text = group
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let (Some(y_min), Some(y_max)) = (
            group.words.iter().map(|w| w.bounds.y).min(),
            group.words.iter().map(|w| w.bounds.bottom()).max(),
        ) else {
            continue;
        };

        if !keep_line(&text) {
            continue;
        }

        // Overlapping mask passes can recognize the same glyphs twice; collapse
        // lines whose vertical spans mostly coincide, keeping the longer text.
        if let Some(prev) = lines
            .iter_mut()
            .find(|prev| duplicated(prev.y_min, prev.y_max, y_min, y_max))
        {
            if text.chars().count() > prev.text.chars().count() {
                prev.text = text;
                prev.y_min = y_min;
                prev.y_max = y_max;
            }
            continue;
        }

        lines.push(TextLine { text, y_min, y_max });
    }

    lines
}

/// Leftover punctuation noise does not make a line.
fn keep_line(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphanumeric()).count() >= 2
}

fn duplicated(a_min: u32, a_max: u32, b_min: u32, b_max: u32) -> bool {
    let overlap = a_max.min(b_max).saturating_sub(a_min.max(b_min));
    let a_h = a_max - a_min;
    let b_h = b_max - b_min;
    overlap * 2 > a_h || overlap * 2 > b_h
}
