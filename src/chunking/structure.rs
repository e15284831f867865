//! Line classifiers for headings, page markers, list items, and bullets.

use regex::Regex;
use std::sync::LazyLock;

/// Lines longer than this are body text even when they match a heading pattern.
const MAX_HEADING_CHARS: usize = 120;

static HEADING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[A-Z][A-Z\s]{10,}$",
        r"^\d+\.\s+[A-Z]",
        r"(?i)^chapter\s+\d+",
        r"(?i)^section\s+\d+",
        r"^\d+\.\d+\s+[A-Z]",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid heading regex"))
    .collect()
});

static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^-{3}\s*page\s+(\d+)\s*-{3}$").expect("valid page marker regex")
});

static LIST_ITEM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*[-*\u{2022}]\s+",
        r"^\s*\d+\.\s+",
        r"^\s*[a-z]\)\s+",
        r"^\s*[ivxIVX]+\.\s+",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid list regex"))
    .collect()
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*\u{2022}]\s+").expect("valid bullet regex"));

/// Whether a single line reads as a section heading.
pub(crate) fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.chars().count() > MAX_HEADING_CHARS || page_marker(line).is_some()
    {
        return false;
    }
    HEADING_PATTERNS.iter().any(|pattern| pattern.is_match(line))
}

/// Page number announced by a `--- Page N ---` marker line.
pub(crate) fn page_marker(line: &str) -> Option<u32> {
    PAGE_MARKER
        .captures(line.trim())
        .and_then(|captures| captures[1].parse().ok())
}

/// Whether a paragraph starts like a bulleted, numbered, lettered, or roman list item.
pub(crate) fn is_list_item(text: &str) -> bool {
    LIST_ITEM_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}

/// Whether a line starts with a bullet glyph.
pub(crate) fn is_bullet(line: &str) -> bool {
    BULLET.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_heading_shapes() {
        assert!(is_heading("INTRODUCTION AND SCOPE"));
        assert!(is_heading("1. Background"));
        assert!(is_heading("2.3 Results"));
        assert!(is_heading("CHAPTER 1: INTRODUCTION"));
        assert!(is_heading("Section 4 - Methods"));
        assert!(!is_heading("SHORT CAPS"));
        assert!(!is_heading("An ordinary sentence."));
        assert!(!is_heading(&format!("1. {}", "Long ".repeat(40))));
    }

    #[test]
    fn parses_page_markers() {
        assert_eq!(page_marker("--- Page 12 ---"), Some(12));
        assert_eq!(page_marker("  ---page 3---  "), Some(3));
        assert_eq!(page_marker("Page 3"), None);
        assert!(!is_heading("--- PAGE 12 ---"));
    }

    #[test]
    fn recognizes_list_items() {
        assert!(is_list_item("- bullet"));
        assert!(is_list_item("\u{2022} dot"));
        assert!(is_list_item("3. third"));
        assert!(is_list_item("b) second"));
        assert!(is_list_item("iv. fourth"));
        assert!(!is_list_item("Plain paragraph"));
        assert!(is_bullet("  * star"));
        assert!(!is_bullet("1. numbered"));
    }
}
