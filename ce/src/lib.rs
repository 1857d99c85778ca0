mod image;
pub use image::*;
mod mask;
pub use mask::{ColorClass, HsvRange};
mod denoise;
mod lines;
pub use lines::TextLine;
mod ocr;
pub use ocr::{DEFAULT_LANGUAGES, Ocr, RecognizedWord, Recognizer};
mod parse;
pub use parse::{ParsedMessage, SenderRegistry};
mod pipeline;
mod sender;
mod tuning;
pub use tuning::{GroupBy, Tuning};

/// Chat extraction facade.
pub struct Ce {
	tuning: Tuning,
}

impl Ce {
	pub fn new(tuning: Tuning) -> Self {
		Self { tuning }
	}

	pub fn tuning(&self) -> &Tuning {
		&self.tuning
	}

	/// Run the full capture-to-structured-line pipeline on one frame.
	///
	/// `registry` carries sender names across snapshots for the lifetime of
	/// the session; everything else is owned by this single run.
	pub fn extract_messages(
		&self,
		frame: &OwnedImage,
		recognizer: &dyn Recognizer,
		registry: &mut SenderRegistry,
	) -> anyhow::Result<Vec<ParsedMessage>> {
		pipeline::extract_messages(frame, &self.tuning, recognizer, registry)
	}
}

impl Default for Ce {
	fn default() -> Self {
		Self::new(Tuning::default())
	}
}
