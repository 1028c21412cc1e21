//! On-disk caller records and synthesis history.
//!
//! One JSON file per caller under `users/`, one JSONL log per caller under
//! `history/`. Writes go through a read-modify-write of the whole record;
//! records are small and each caller's session is strictly sequential, so
//! there is no concurrent writer to guard against.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const HASH_SAMPLE_BYTES: usize = 1024 * 1024;

/// Persistent record for one caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub voice_preference: crate::tts::VoicePreference,
    #[serde(default)]
    pub last_book_title: Option<String>,
    #[serde(default)]
    pub last_book_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    fn new() -> Self {
        Self {
            voice_preference: crate::tts::VoicePreference::default(),
            last_book_title: None,
            last_book_hash: None,
            created_at: Utc::now(),
        }
    }
}

/// One line in a caller's synthesis history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub book_title: String,
    pub chapter_title: String,
}

/// File-backed store of caller records and history logs.
pub struct UserStore {
    root: PathBuf,
}

impl UserStore {
    /// Open a store rooted at `root`, creating its layout if needed.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("history"))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Open the store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookvoice");
        Self::open(&root)
    }

    fn user_path(&self, caller_id: &str) -> PathBuf {
        self.root
            .join("users")
            .join(format!("{}.json", sanitize_id(caller_id)))
    }

    fn history_path(&self, caller_id: &str) -> PathBuf {
        self.root
            .join("history")
            .join(format!("{}.jsonl", sanitize_id(caller_id)))
    }

    /// Load a caller's record, creating a fresh one on first contact.
    pub fn load_user(&self, caller_id: &str) -> Result<UserRecord> {
        let path = self.user_path(caller_id);
        if !path.exists() {
            debug!("new caller record for {caller_id}");
            return Ok(UserRecord::new());
        }
        let file = File::open(&path)?;
        let record = serde_json::from_reader(BufReader::new(file))?;
        Ok(record)
    }

    pub fn save_user(&self, caller_id: &str, record: &UserRecord) -> Result<()> {
        let file = File::create(self.user_path(caller_id))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush()?;
        Ok(())
    }

    /// Persist a changed voice preference.
    pub fn set_voice(
        &self,
        caller_id: &str,
        voice: crate::tts::VoicePreference,
    ) -> Result<()> {
        let mut record = self.load_user(caller_id)?;
        record.voice_preference = voice;
        self.save_user(caller_id, &record)
    }

    /// Record the most recently loaded book.
    pub fn set_last_book(&self, caller_id: &str, title: &str, hash: &str) -> Result<()> {
        let mut record = self.load_user(caller_id)?;
        record.last_book_title = Some(title.to_string());
        record.last_book_hash = Some(hash.to_string());
        self.save_user(caller_id, &record)
    }

    /// Append one synthesis to the caller's history log.
    pub fn append_history(&self, caller_id: &str, entry: &HistoryEntry) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path(caller_id))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// The caller's most recent syntheses, newest first.
    pub fn history(&self, caller_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let path = self.history_path(caller_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&path)?);
        let mut entries: Vec<HistoryEntry> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("skipping malformed history line: {e}"),
            }
        }
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Content hash identifying a book file, from its first megabyte.
pub fn compute_book_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; HASH_SAMPLE_BYTES];
    let mut hasher = Sha256::new();
    let mut remaining = HASH_SAMPLE_BYTES;
    while remaining > 0 {
        let n = file.read(&mut buf[..remaining])?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        remaining -= n;
    }
    if remaining == HASH_SAMPLE_BYTES {
        return Err(Error::ExtractionFailed);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(hex)
}

/// Keep caller identifiers filesystem-safe.
fn sanitize_id(caller_id: &str) -> String {
    caller_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::VoicePreference;
    use tempfile::TempDir;

    fn entry(chapter: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: Utc::now(),
            book_title: "Книга".to_string(),
            chapter_title: chapter.to_string(),
        }
    }

    #[test]
    fn test_first_contact_gets_fresh_record() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(dir.path()).unwrap();

        let record = store.load_user("42").unwrap();
        assert_eq!(record.voice_preference, VoicePreference::Male);
        assert!(record.last_book_title.is_none());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(dir.path()).unwrap();

        store.set_voice("42", VoicePreference::Female).unwrap();
        store.set_last_book("42", "Мёртвые души", "abcd1234").unwrap();

        let record = store.load_user("42").unwrap();
        assert_eq!(record.voice_preference, VoicePreference::Female);
        assert_eq!(record.last_book_title.as_deref(), Some("Мёртвые души"));
        assert_eq!(record.last_book_hash.as_deref(), Some("abcd1234"));
    }

    #[test]
    fn test_history_is_newest_first_and_limited() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(dir.path()).unwrap();

        for n in 1..=5 {
            store
                .append_history("42", &entry(&format!("Глава {n}")))
                .unwrap();
        }

        let recent = store.history("42", 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].chapter_title, "Глава 5");
        assert_eq!(recent[2].chapter_title, "Глава 3");
    }

    #[test]
    fn test_history_empty_when_none_recorded() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(dir.path()).unwrap();
        assert!(store.history("nobody", 10).unwrap().is_empty());
    }

    #[test]
    fn test_caller_ids_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::open(dir.path()).unwrap();

        store.set_voice("../../etc/passwd", VoicePreference::Female).unwrap();
        let record = store.load_user("../../etc/passwd").unwrap();
        assert_eq!(record.voice_preference, VoicePreference::Female);
        // The record landed inside the store root.
        assert!(dir.path().join("users").read_dir().unwrap().count() == 1);
    }

    #[test]
    fn test_book_hash_is_stable_and_short() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        fs::write(&path, "Глава 1. Текст книги для хеширования.").unwrap();

        let a = compute_book_hash(&path).unwrap();
        let b = compute_book_hash(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_book_hash_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();
        assert!(compute_book_hash(&path).is_err());
    }
}
