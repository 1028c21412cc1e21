//! Text processing module: cleaning, chapter segmentation, and chunking.

pub mod chunker;
pub mod cleaner;
pub mod segmenter;

use serde::{Deserialize, Serialize};

/// A titled, ordered, non-empty span of a book's text.
///
/// Chapters are created by the segmenter and immutable afterwards; they live
/// for the lifetime of a session, until a new upload replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position in the book's reading order.
    pub number: u32,
    /// Normalized heading, or a synthetic ordinal title.
    pub title: String,
    /// The chapter body (includes the heading line when one was detected).
    pub text: String,
    /// Word-count based listening estimate. Display only.
    pub estimated_duration_seconds: u32,
}

impl Chapter {
    /// Approximate word count of the chapter body.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Duration estimate rounded up to whole minutes, for menu display.
    pub fn estimated_minutes(&self) -> u32 {
        (self.estimated_duration_seconds / 60).max(1)
    }
}
