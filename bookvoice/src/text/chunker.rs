//! Chunking chapter text into bounded synthesis inputs, plus the validation
//! gate that runs on every chunk right before it is handed to the synthesizer.

use crate::config::{MAX_TTS_CHARS, MIN_TTS_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence boundary used for packing. A simple heuristic, not full
/// sentence detection.
const SENTENCE_BOUNDARY: &str = ". ";

/// Characters the synthesizer cannot be trusted with are replaced by spaces.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:\-()\[\]'"]"#).expect("charset pattern should compile"));

static RUN_ON_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Split chapter text into ordered chunks of at most `max_chars` characters.
///
/// Units are split on `". "` with the boundary kept attached, so direct
/// concatenation of the chunks reproduces the input exactly. A single unit
/// longer than `max_chars` is emitted as an oversized singleton chunk rather
/// than rejected.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for unit in text.split_inclusive(SENTENCE_BOUNDARY) {
        let unit_chars = unit.chars().count();
        if current_chars > 0 && current_chars + unit_chars >= max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(unit);
        current_chars += unit_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Validate and normalize one chunk for a synthesis call.
///
/// Returns `None` for text below the minimum meaningful length. Otherwise the
/// text is capped at [`MAX_TTS_CHARS`], stripped of characters outside the
/// safe set, whitespace-collapsed, and terminated with punctuation. The
/// result is a deterministic function of the input: a chunk that fails here
/// can never become valid by retrying.
pub fn validate_for_synthesis(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TTS_CHARS {
        return None;
    }

    let capped: String = trimmed.chars().take(MAX_TTS_CHARS).collect();
    let stripped = UNSAFE_CHARS.replace_all(&capped, " ");
    let collapsed = RUN_ON_WHITESPACE.replace_all(&stripped, " ");
    let result = collapsed.trim().to_string();

    if result.chars().count() < MIN_TTS_CHARS {
        return None;
    }

    if result.ends_with(['.', '!', '?']) {
        Some(result)
    } else {
        Some(format!("{result}."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello world. How are you?", 280);
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 280).is_empty());
    }

    #[test]
    fn test_packing_respects_bound() {
        let text = "First sentence here. Second sentence here. Third sentence here. \
                    Fourth sentence here. Fifth sentence here.";
        let chunks = chunk_text(text, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let text = "Раз. Два. Три. Четыре. Пять. Шесть. Семь. Восемь.";
        let chunks = chunk_text(text, 20);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_oversized_singleton() {
        let long = "слово ".repeat(40).trim_end().to_string();
        let chunks = chunk_text(&long, 30);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chars().count() > 30);
    }

    #[test]
    fn test_validate_rejects_short() {
        assert_eq!(validate_for_synthesis(""), None);
        assert_eq!(validate_for_synthesis("ab"), None);
    }

    #[test]
    fn test_validate_appends_terminal_punctuation() {
        assert_eq!(
            validate_for_synthesis("This is fine"),
            Some("This is fine.".to_string())
        );
        assert_eq!(
            validate_for_synthesis("Is this fine?"),
            Some("Is this fine?".to_string())
        );
    }

    #[test]
    fn test_validate_strips_unsafe_characters() {
        let out = validate_for_synthesis("Жил-был кот @#$% и пёс").unwrap();
        assert_eq!(out, "Жил-был кот и пёс.");
    }

    #[test]
    fn test_validate_collapses_whitespace() {
        let out = validate_for_synthesis("Много    лишних \n\n пробелов тут").unwrap();
        assert_eq!(out, "Много лишних пробелов тут.");
    }

    #[test]
    fn test_validate_rejects_text_that_strips_to_nothing() {
        assert_eq!(validate_for_synthesis("@#$%^&*@#$%^&*"), None);
    }

    #[test]
    fn test_validate_caps_length() {
        let long = "а".repeat(MAX_TTS_CHARS * 2);
        let out = validate_for_synthesis(&long).unwrap();
        // Capped input plus the appended terminal dot.
        assert!(out.chars().count() <= MAX_TTS_CHARS + 1);
    }

    proptest! {
        #[test]
        fn prop_chunks_within_bound_or_singleton(text in "[a-zа-я .,!?]{0,400}", max in 20usize..200) {
            let chunks = chunk_text(&text, max);
            for chunk in &chunks {
                let len = chunk.chars().count();
                let is_singleton = chunk.split_inclusive(". ").count() == 1;
                prop_assert!(len <= max || is_singleton, "len={} max={}", len, max);
            }
        }

        #[test]
        fn prop_concatenation_is_lossless(text in "[a-zа-я .,!?]{0,400}", max in 20usize..200) {
            let chunks = chunk_text(&text, max);
            prop_assert_eq!(chunks.concat(), text);
        }

        #[test]
        fn prop_chunks_non_empty(text in ".{0,300}", max in 20usize..200) {
            for chunk in chunk_text(&text, max) {
                prop_assert!(!chunk.is_empty());
            }
        }
    }
}
