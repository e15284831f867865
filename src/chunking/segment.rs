//! Unit segmentation: lines, paragraphs, sentences, and oversized-unit splitting.
//!
//! Every helper works on byte [`Span`]s into the original text so that chunk offsets can be
//! reported against the exact source the caller supplied.

use regex::Regex;
use std::sync::LazyLock;

/// Sentence terminator followed by the whitespace that separates it from the next sentence.
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]+["')\]\u{201D}\u{2019}]*\s+"#).expect("valid sentence regex")
});

/// Lowercased words that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "no",
    "vol", "inc", "ltd", "co", "approx", "dept", "est", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Half-open byte range into a source string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Span {
    pub(crate) const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub(crate) fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub(crate) fn char_len(&self, text: &str) -> usize {
        self.slice(text).chars().count()
    }
}

/// Shrink `span` to exclude surrounding whitespace; `None` when nothing remains.
pub(crate) fn trim(text: &str, span: Span) -> Option<Span> {
    let slice = span.slice(text);
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - slice.trim_start().len();
    let start = span.start + lead;
    Some(Span::new(start, start + trimmed.len()))
}

/// Lines inside `span`, without their `\n` / `\r\n` terminators. Blank lines are included.
pub(crate) fn lines(text: &str, span: Span) -> Vec<Span> {
    let slice = span.slice(text);
    let mut out = Vec::new();
    let mut line_start = 0;

    for (idx, _) in slice.match_indices('\n') {
        out.push(strip_carriage_return(
            text,
            Span::new(span.start + line_start, span.start + idx),
        ));
        line_start = idx + 1;
    }
    if line_start < slice.len() {
        out.push(strip_carriage_return(
            text,
            Span::new(span.start + line_start, span.end),
        ));
    }

    out
}

fn strip_carriage_return(text: &str, span: Span) -> Span {
    if span.end > span.start && text.as_bytes()[span.end - 1] == b'\r' {
        Span::new(span.start, span.end - 1)
    } else {
        span
    }
}

/// Paragraphs inside `span`: runs of non-blank lines, trimmed.
pub(crate) fn paragraphs(text: &str, span: Span) -> Vec<Span> {
    let mut out = Vec::new();
    let mut current: Option<Span> = None;

    for line in lines(text, span) {
        if line.slice(text).trim().is_empty() {
            if let Some(paragraph) = current.take().and_then(|p| trim(text, p)) {
                out.push(paragraph);
            }
            continue;
        }
        current = Some(match current {
            Some(open) => Span::new(open.start, line.end),
            None => line,
        });
    }
    if let Some(paragraph) = current.and_then(|p| trim(text, p)) {
        out.push(paragraph);
    }

    out
}

/// Sentences inside `span`, trimmed. Paragraph breaks always end a sentence.
pub(crate) fn sentences(text: &str, span: Span) -> Vec<Span> {
    paragraphs(text, span)
        .into_iter()
        .flat_map(|paragraph| sentences_in_paragraph(text, paragraph))
        .collect()
}

fn sentences_in_paragraph(text: &str, span: Span) -> Vec<Span> {
    let slice = span.slice(text);
    let mut out = Vec::new();
    let mut sentence_start = 0;

    for found in SENTENCE_END.find_iter(slice) {
        if !is_sentence_break(slice, sentence_start, found.start(), found.end()) {
            continue;
        }
        let matched = found.as_str();
        let boundary = found.end() - (matched.len() - matched.trim_end().len());
        if let Some(sentence) = trim(
            text,
            Span::new(span.start + sentence_start, span.start + boundary),
        ) {
            out.push(sentence);
        }
        sentence_start = found.end();
    }
    if let Some(rest) = trim(text, Span::new(span.start + sentence_start, span.end)) {
        out.push(rest);
    }

    out
}

fn is_sentence_break(slice: &str, sentence_start: usize, term_start: usize, next: usize) -> bool {
    if slice[next..]
        .chars()
        .next()
        .is_some_and(|c| c.is_lowercase())
    {
        return false;
    }
    if !slice[term_start..].starts_with('.') {
        return true;
    }

    let word = slice[sentence_start..term_start]
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    let mut chars = word.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if only.is_alphabetic() {
            return false;
        }
    }
    !ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Split a unit longer than `max_chars` characters into pieces that each fit.
///
/// Cuts prefer a line break in the back half of the window, then the last whitespace, and
/// fall back to a hard cut on a character boundary.
pub(crate) fn split_oversized(text: &str, span: Span, max_chars: usize) -> Vec<Span> {
    if span.char_len(text) <= max_chars {
        return vec![span];
    }

    let mut out = Vec::new();
    let mut start = span.start;

    while start < span.end {
        let rest = &text[start..span.end];
        if rest.chars().count() <= max_chars {
            out.extend(trim(text, Span::new(start, span.end)));
            break;
        }

        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];
        let cut = window
            .rfind('\n')
            .filter(|&idx| idx >= window.len() / 2)
            .or_else(|| window.rfind(char::is_whitespace).filter(|&idx| idx > 0));

        let (piece_end, next_start) = match cut {
            Some(idx) => {
                let after = &rest[idx..];
                (idx, idx + (after.len() - after.trim_start().len()))
            }
            None => (window_end, window_end),
        };

        out.extend(trim(text, Span::new(start, start + piece_end)));
        start += next_start;
    }

    out
}
