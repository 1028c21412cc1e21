//! Upload gating and the text extraction boundary.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Supported book formats, gated by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    Txt,
    Epub,
    Fb2,
}

impl BookFormat {
    /// Resolve a format from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(BookFormat::Txt),
            "epub" => Some(BookFormat::Epub),
            "fb2" => Some(BookFormat::Fb2),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            BookFormat::Txt => "txt",
            BookFormat::Epub => "epub",
            BookFormat::Fb2 => "fb2",
        }
    }
}

/// Gate an offered upload on extension and size before anything is
/// downloaded or parsed.
pub fn check_upload(file_name: &str, size: u64, max_bytes: u64) -> Result<BookFormat> {
    let format = BookFormat::from_file_name(file_name)
        .ok_or_else(|| Error::UnsupportedFormat(file_name.to_string()))?;

    if size > max_bytes {
        return Err(Error::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }

    Ok(format)
}

/// Extraction boundary: turns a downloaded file into raw text.
///
/// Implementations return an empty string when the format cannot be read;
/// [`read_book`] maps that to [`Error::ExtractionFailed`] before the cleaner
/// ever runs.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, format: BookFormat) -> Result<String>;
}

/// Extractor for plain-text sources. EPUB and FB2 unpacking live behind the
/// same trait in the host application.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, format: BookFormat) -> Result<String> {
        match format {
            BookFormat::Txt => Ok(fs::read_to_string(path)?),
            BookFormat::Epub | BookFormat::Fb2 => Ok(String::new()),
        }
    }
}

/// Extract the raw text of a book, failing on empty extraction.
pub fn read_book(
    extractor: &dyn TextExtractor,
    path: &Path,
    format: BookFormat,
) -> Result<String> {
    let raw = extractor.extract(path, format)?;
    if raw.trim().is_empty() {
        return Err(Error::ExtractionFailed);
    }
    Ok(raw)
}
