//! Heuristic chapter segmentation with a word-count fallback.

use crate::config::{
    FALLBACK_DROP_WORDS, FALLBACK_MIN_WORDS, FALLBACK_PARTS, HEADING_MAX_CHARS, MAX_CHAPTERS,
    MIN_CHAPTER_CHARS, WORDS_PER_SECOND,
};
use crate::text::Chapter;
use once_cell::sync::Lazy;
use regex::Regex;

/// Title used for text accumulated before the first detected heading.
const INTRO_TITLE: &str = "Вступление";

/// Label prefix for normalized chapter headings.
const CHAPTER_LABEL: &str = "Глава";

/// Title prefix for synthetic fallback parts.
const PART_LABEL: &str = "Часть";

/// Heading patterns in priority order; the first match wins.
static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^(?:Глава|Часть|Chapter|Part)\s*(\d+|[IVXLCDM]+)\.?\s*(.*)$",
        r"^(\d+)\.\s+(.+)$",
        r"^([IVXLCDM]+)\.\s+(.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("heading pattern should compile"))
    .collect()
});

/// Test a line against the heading patterns, returning the normalized title.
fn detect_heading(line: &str) -> Option<String> {
    if line.chars().count() >= HEADING_MAX_CHARS {
        return None;
    }

    for re in HEADING_PATTERNS.iter() {
        if let Some(caps) = re.captures(line) {
            let number = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            let title = format!("{CHAPTER_LABEL} {number}. {rest}");
            return Some(title.trim().trim_end_matches('.').trim_end().to_string());
        }
    }
    None
}

/// Segment cleaned text into an ordered, 1-based chapter list.
///
/// Always returns at least one chapter for non-empty input, and never more
/// than [`MAX_CHAPTERS`]. When heading detection finds fewer than two
/// chapters, the whole text is re-split by word count instead.
pub fn segment(text: &str) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut current_title = INTRO_TITLE.to_string();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(title) = detect_heading(line) {
            if buffer_chars(&buffer) > MIN_CHAPTER_CHARS {
                push_chapter(&mut chapters, &current_title, &buffer);
                buffer.clear();
            }
            // An accumulation too short to stand alone stays in the buffer
            // and is absorbed into the chapter that starts here.
            current_title = title;
            buffer.push(line);
        } else {
            buffer.push(line);
        }
    }

    if !buffer.is_empty() {
        if buffer_chars(&buffer) > MIN_CHAPTER_CHARS || chapters.is_empty() {
            push_chapter(&mut chapters, &current_title, &buffer);
        } else if let Some(last) = chapters.last_mut() {
            // A trailing remainder too short to stand alone joins the
            // previous chapter so no text is lost.
            last.text.push('\n');
            last.text.push_str(&buffer.join("\n"));
            last.estimated_duration_seconds = estimate_duration_seconds(&last.text);
        }
    }

    if chapters.len() < 2 {
        chapters = fallback_segments(text);
    }

    chapters.truncate(MAX_CHAPTERS);
    renumber(&mut chapters);
    chapters
}

/// Split text into roughly equal word-count parts when heading detection
/// found no real structure.
fn fallback_segments(text: &str) -> Vec<Chapter> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let part_len = std::cmp::max(FALLBACK_MIN_WORDS, words.len() / FALLBACK_PARTS);
    let mut chapters: Vec<Chapter> = Vec::new();

    for (i, part) in words.chunks(part_len).enumerate() {
        if part.len() > FALLBACK_DROP_WORDS {
            let body = part.join(" ");
            chapters.push(Chapter {
                number: 0,
                title: format!("{PART_LABEL} {}", i + 1),
                estimated_duration_seconds: estimate_duration_seconds(&body),
                text: body,
            });
        }
    }

    // Inputs shorter than one full part still produce a single chapter.
    if chapters.is_empty() {
        let body = words.join(" ");
        chapters.push(Chapter {
            number: 0,
            title: format!("{PART_LABEL} 1"),
            estimated_duration_seconds: estimate_duration_seconds(&body),
            text: body,
        });
    }

    chapters
}

fn buffer_chars(buffer: &[&str]) -> usize {
    buffer.iter().map(|l| l.chars().count()).sum()
}

fn push_chapter(chapters: &mut Vec<Chapter>, title: &str, buffer: &[&str]) {
    let body = buffer.join("\n");
    chapters.push(Chapter {
        number: 0,
        title: title.to_string(),
        estimated_duration_seconds: estimate_duration_seconds(&body),
        text: body,
    });
}

fn renumber(chapters: &mut [Chapter]) {
    for (i, chapter) in chapters.iter_mut().enumerate() {
        chapter.number = (i + 1) as u32;
    }
}

/// Listening-time estimate from word count. Display only.
fn estimate_duration_seconds(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words as f32 / WORDS_PER_SECOND) as u32
}
