//! Slide-aware chunking for presentations.
//!
//! Each slide is a logical unit: a slide that fits the budget becomes exactly one chunk, and
//! larger slides are split by lines (when they carry bullets) or by paragraphs.

use super::{
    ChunkingStrategy,
    estimate::estimate_tokens,
    packer::{Draft, Unit, finalize, pack},
    segment::{Span, lines, paragraphs, trim},
    structure::is_bullet,
    types::{Chunk, ChunkMetadata, ChunkOptions, DocumentKind},
};
use regex::Regex;
use std::sync::LazyLock;

/// Slide separators in priority order; the first one present in the text wins.
static SLIDE_SEPARATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)---\s*Slide\s+(\d+)\s*---",
        r"(?i)=====\s*Slide\s+(\d+)\s*=====",
        r"(?i)Slide\s+(\d+):",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("valid slide separator regex"))
    .collect()
});

const SLIDE_GAP: &str = "\n\n\n";

/// Chunking strategy for slide decks.
pub struct PptxStrategy {
    options: ChunkOptions,
}

impl PptxStrategy {
    /// Create a strategy with the given budget.
    pub const fn new(options: ChunkOptions) -> Self {
        Self { options }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Slide {
    span: Span,
    number: Option<u32>,
}

impl ChunkingStrategy for PptxStrategy {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pptx
    }

    fn options(&self) -> ChunkOptions {
        self.options
    }

    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let slides = detect_slides(text);
        let mut drafts = Vec::new();

        for slide in &slides {
            let mut metadata = ChunkMetadata::new(DocumentKind::Pptx);
            metadata.slide_number = slide.number;

            if estimate_tokens(slide.span.slice(text)) <= self.options.chunk_size {
                drafts.push(Draft {
                    span: slide.span,
                    metadata,
                });
                continue;
            }

            let slide_lines = lines(text, slide.span);
            let units: Vec<Unit> = if slide_lines.iter().any(|line| is_bullet(line.slice(text))) {
                slide_lines
                    .into_iter()
                    .filter_map(|line| trim(text, line))
                    .map(Unit::new)
                    .collect()
            } else {
                paragraphs(text, slide.span)
                    .into_iter()
                    .map(Unit::new)
                    .collect()
            };
            tracing::debug!(
                slide = ?slide.number,
                units = units.len(),
                "Splitting oversized slide"
            );
            drafts.extend(pack(text, &units, &self.options).into_iter().map(|span| Draft {
                span,
                metadata: metadata.clone(),
            }));
        }

        tracing::debug!(
            slides = slides.len(),
            chunks = drafts.len(),
            "Chunked PPTX text"
        );
        finalize(text, drafts)
    }
}

fn detect_slides(text: &str) -> Vec<Slide> {
    for separator in SLIDE_SEPARATORS.iter() {
        let markers: Vec<_> = separator.captures_iter(text).collect();
        let Some(first) = markers.first() else {
            continue;
        };

        let mut slides = Vec::with_capacity(markers.len() + 1);
        if let Some(span) = trim(text, Span::new(0, first.get(0).map_or(0, |m| m.start()))) {
            slides.push(Slide { span, number: None });
        }
        for (idx, captures) in markers.iter().enumerate() {
            let Some(marker) = captures.get(0) else {
                continue;
            };
            let end = markers
                .get(idx + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());
            if let Some(span) = trim(text, Span::new(marker.end(), end)) {
                slides.push(Slide {
                    span,
                    number: captures[1].parse().ok(),
                });
            }
        }
        return slides;
    }

    let mut slides = Vec::new();
    let mut start = 0;
    for (idx, _) in text
        .match_indices(SLIDE_GAP)
        .chain(std::iter::once((text.len(), "")))
    {
        if let Some(span) = trim(text, Span::new(start, idx)) {
            slides.push(Slide {
                span,
                number: Some(slides.len() as u32 + 1),
            });
        }
        start = (idx + SLIDE_GAP.len()).min(text.len());
    }
    slides
}
