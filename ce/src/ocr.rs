//! Recognizer boundary.
//!
//! The text-recognition engine is an external collaborator: the pipeline hands
//! it a preprocessed mask image (or a small sender crop) and gets back word
//! tokens with boxes and confidences. [`Recognizer`] is the seam; tests plug
//! in scripted implementations.
//!
//! The production implementation shells out to the Tesseract CLI with TSV
//! output, which carries per-word geometry the library bindings do not expose.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use image::GrayImage;

use crate::image::Rect;

/// Languages commonly seen in public chat; passed to the engine as a fixed set.
pub const DEFAULT_LANGUAGES: &str = "eng+rus+spa+por+chi_sim";

/// One token from the recognizer.
#[derive(Debug, Clone)]
pub struct RecognizedWord {
    pub text: String,
    pub bounds: Rect,
    /// Engine confidence, 0..100.
    pub confidence: f32,
}

pub trait Recognizer {
    /// Word-level recognition over a full preprocessed mask image.
    fn words(&self, image: &GrayImage) -> Result<Vec<RecognizedWord>>;

    /// Single-line recognition of a small tight crop.
    fn line(&self, image: &GrayImage) -> Result<String>;
}

/// Tesseract CLI wrapper.
pub struct Ocr {
    exe: PathBuf,
    languages: String,
}

impl Ocr {
    /// Locate the engine and verify it is callable.
    ///
    /// An unreachable engine is a hard error for the caller; there is no
    /// degraded mode without recognition.
    pub fn try_new(exe: Option<PathBuf>, languages: &str) -> Result<Self> {
        let exe = exe.unwrap_or_else(|| PathBuf::from("tesseract"));

        let probe = Command::new(&exe)
            .arg("--version")
            .output()
            .with_context(|| format!("tesseract not reachable at {:?}; is it installed?", exe))?;
        if !probe.status.success() {
            return Err(anyhow!("tesseract --version failed at {:?}", exe));
        }

        Ok(Self {
            exe,
            languages: languages.to_string(),
        })
    }

    fn run(&self, image: &GrayImage, psm: &str, format: Option<&str>) -> Result<String> {
        let input = tempfile::NamedTempFile::with_suffix(".png").context("create temp image")?;
        image.save(input.path()).context("write temp image")?;

        let mut cmd = Command::new(&self.exe);
        cmd.arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(psm);
        if let Some(format) = format {
            cmd.arg(format);
        }

        let output = cmd.output().context("spawn tesseract")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Recognizer for Ocr {
    fn words(&self, image: &GrayImage) -> Result<Vec<RecognizedWord>> {
        // PSM 6: assume a single uniform block of text.
        let tsv = self.run(image, "6", Some("tsv"))?;
        Ok(parse_tsv_words(&tsv))
    }

    fn line(&self, image: &GrayImage) -> Result<String> {
        // PSM 7: treat the crop as a single text line.
        let text = self.run(image, "7", None)?;
        Ok(text.trim().to_string())
    }
}

/// Parse Tesseract TSV output into word tokens.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words.
fn parse_tsv_words(tsv: &str) -> Vec<RecognizedWord> {
    let mut words = Vec::new();

    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if conf < 0.0 {
            continue;
        }

        let (Ok(x), Ok(y), Ok(w), Ok(h)) = (
            fields[6].parse::<u32>(),
            fields[7].parse::<u32>(),
            fields[8].parse::<u32>(),
            fields[9].parse::<u32>(),
        ) else {
            continue;
        };

        words.push(RecognizedWord {
            text: text.to_string(),
            bounds: Rect { x, y, w, h },
            confidence: conf,
        });
    }

    words
}
