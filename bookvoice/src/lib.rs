//! bookvoice converts a book file into per-chapter spoken audio.
//!
//! The pipeline runs in fixed order: extract raw text, clean it, segment it
//! into titled chapters, then chunk and stream each requested chapter through
//! a synthesizer into one audio artifact. Each module owns one stage;
//! [`prepare_chapters`] wires the text stages together.

pub mod audio;
pub mod config;
pub mod error;
pub mod extract;
pub mod session;
pub mod store;
pub mod text;
pub mod tts;

pub use config::BookvoiceConfig;
pub use error::{Error, Result};
pub use text::Chapter;

use log::info;

/// Run extraction output through cleaning and segmentation.
///
/// Fails with [`Error::ExtractionFailed`] when the input, or what survives
/// cleaning, holds no usable text.
pub fn prepare_chapters(raw: &str) -> Result<Vec<Chapter>> {
    if raw.trim().is_empty() {
        return Err(Error::ExtractionFailed);
    }

    let cleaned = text::cleaner::clean(raw);
    if cleaned.is_empty() {
        return Err(Error::ExtractionFailed);
    }

    let chapters = text::segmenter::segment(&cleaned);
    if chapters.is_empty() {
        return Err(Error::ExtractionFailed);
    }

    info!("prepared {} chapter(s)", chapters.len());
    Ok(chapters)
}
