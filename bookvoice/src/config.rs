//! bookvoice configuration: named pipeline constants and the user config file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Lines shorter than this are dropped by the cleaner unless purely numeric.
pub const MIN_LINE_CHARS: usize = 2;

/// Accumulated text must exceed this many characters to close as a chapter.
/// A heading plus one short line of prose clears the bar; back-to-back
/// false-positive headings do not.
pub const MIN_CHAPTER_CHARS: usize = 20;

/// Lines at or above this length are never tested as headings.
pub const HEADING_MAX_CHARS: usize = 100;

/// Hard cap on chapters returned by segmentation.
pub const MAX_CHAPTERS: usize = 20;

/// Reading-speed heuristic for duration estimates.
pub const WORDS_PER_SECOND: f32 = 2.5;

/// Target part count for word-count fallback segmentation.
pub const FALLBACK_PARTS: usize = 5;

/// Minimum words per fallback part.
pub const FALLBACK_MIN_WORDS: usize = 100;

/// Fallback parts at or under this many words are dropped.
pub const FALLBACK_DROP_WORDS: usize = 50;

/// Minimum meaningful length for text handed to the synthesizer.
pub const MIN_TTS_CHARS: usize = 10;

/// Safety cap on a single synthesis input.
pub const MAX_TTS_CHARS: usize = 15_000;

/// Rough encoded-audio rate used for artifact duration estimates (~48 kbit/s).
pub const AUDIO_BYTES_PER_SECOND: u64 = 6_000;

const DEFAULT_MAX_CHUNK_CHARS: usize = 3_000;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 15 * 1024 * 1024;
const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookvoiceConfig {
    /// Maximum characters per synthesis chunk.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Upload size ceiling in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Minimum seconds between progress updates.
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Default voice label ("male" or "female").
    #[serde(default)]
    pub voice: Option<String>,

    /// External TTS command; reads text on stdin, writes audio to stdout.
    #[serde(default)]
    pub tts_command: Option<String>,

    /// Arguments for the TTS command. "{voice}" expands to the provider voice code.
    #[serde(default)]
    pub tts_args: Vec<String>,
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_progress_interval_secs() -> u64 {
    DEFAULT_PROGRESS_INTERVAL_SECS
}

impl Default for BookvoiceConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_upload_bytes: default_max_upload_bytes(),
            progress_interval_secs: default_progress_interval_secs(),
            voice: None,
            tts_command: None,
            tts_args: Vec::new(),
        }
    }
}

impl BookvoiceConfig {
    /// Get the config file path: ~/.config/cli-programs/bookvoice.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("bookvoice.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: BookvoiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Minimum interval between progress updates.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BookvoiceConfig::default();
        assert_eq!(config.max_chunk_chars, 3_000);
        assert_eq!(config.max_upload_bytes, 15 * 1024 * 1024);
        assert_eq!(config.progress_interval_secs, 2);
        assert!(config.voice.is_none());
        assert!(config.tts_command.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = BookvoiceConfig::config_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.ends_with("cli-programs/bookvoice.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
max_chunk_chars = 500
voice = "female"
tts_command = "piper"
tts_args = ["--voice", "{voice}", "--output_file", "-"]
"#;
        let config: BookvoiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_chunk_chars, 500);
        assert_eq!(config.voice.as_deref(), Some("female"));
        assert_eq!(config.tts_command.as_deref(), Some("piper"));
        assert_eq!(config.tts_args.len(), 4);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: BookvoiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_chunk_chars, 3_000);
        assert_eq!(config.progress_interval_secs, 2);
    }
}
