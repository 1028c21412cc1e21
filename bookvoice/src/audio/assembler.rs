//! Ordered segment concatenation and artifact finalization.

use crate::config::AUDIO_BYTES_PER_SECOND;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Concatenate per-chunk audio segments byte-for-byte, in segment order.
pub fn assemble(segments: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = segments.iter().map(|s| s.len()).sum();
    let mut out = Vec::with_capacity(total);
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out
}

/// Rough artifact duration from its encoded size. Display only.
pub fn estimate_seconds(byte_len: u64) -> u64 {
    byte_len / AUDIO_BYTES_PER_SECOND
}

/// Write the assembled artifact to `output_path`.
///
/// The bytes go to a temp file in the destination directory first and are
/// moved into place only once fully written, so a failure at any point
/// leaves no partial artifact behind. Returns the artifact size in bytes.
pub fn write_artifact(segments: &[Vec<u8>], output_path: &Path) -> Result<u64> {
    let dir = output_path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };

    let bytes = assemble(segments);
    tmp.write_all(&bytes)?;
    tmp.flush()?;
    tmp.persist(output_path).map_err(|e| Error::Io(e.error))?;

    Ok(bytes.len() as u64)
}
