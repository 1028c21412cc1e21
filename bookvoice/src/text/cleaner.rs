//! Boilerplate removal for raw extracted book text.

use crate::config::MIN_LINE_CHARS;
use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns for lines that carry no narration value: page numbers, footnote
/// markers, ISBN and copyright lines, asterisk separators.
static BOILERPLATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+$",
        r"(?i)^(?:Page|Страница)\s+\d+$",
        r"^[\[(]\d+[\])]$",
        r"(?i)ISBN\s*:?\s*[\d\-]+",
        r"©\s*\d{4}",
        r"^\*(?:\s*\*)+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("boilerplate pattern should compile"))
    .collect()
});

fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Clean raw extracted text for segmentation.
///
/// Drops boilerplate lines and near-empty fragments, collapses runs of blank
/// lines to a single blank line, and trims the result. Pure and idempotent;
/// empty input yields empty output.
pub fn clean(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut blank_pending = false;

    for line in raw.lines() {
        let line = line.trim();

        if line.is_empty() {
            blank_pending = true;
            continue;
        }
        if is_boilerplate(line) {
            continue;
        }
        // Very short fragments are junk unless purely numeric.
        if line.chars().count() < MIN_LINE_CHARS && !line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        if blank_pending && !kept.is_empty() {
            kept.push("");
        }
        blank_pending = false;
        kept.push(line);
    }

    kept.join("\n")
}
