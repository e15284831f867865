//! Section-aware chunking for text extracted from PDFs.
//!
//! Headings split the document into sections that are chunked independently, so a chunk
//! never mixes content from two sections. Inside a section the units are sentences.
//! `--- Page N ---` markers bound sentences and feed the `page_start` / `page_end` metadata.

use super::{
    ChunkingStrategy,
    packer::{Draft, Unit, finalize, pack},
    segment::{Span, lines, sentences, trim},
    structure::{is_heading, page_marker},
    types::{Chunk, ChunkMetadata, ChunkOptions, DocumentKind},
};
use std::mem;

/// Chunking strategy for paged documents with section headings.
pub struct PdfStrategy {
    options: ChunkOptions,
}

impl PdfStrategy {
    /// Create a strategy with the given budget.
    pub const fn new(options: ChunkOptions) -> Self {
        Self { options }
    }
}

struct Section {
    heading: Option<String>,
    units: Vec<Unit>,
}

struct Layout {
    sections: Vec<Section>,
    /// Byte position of each page marker and the page it opens, in text order.
    pages: Vec<(usize, u32)>,
}

impl Layout {
    fn page_at(&self, position: usize) -> Option<u32> {
        let idx = self.pages.partition_point(|(start, _)| *start <= position);
        idx.checked_sub(1).map(|idx| self.pages[idx].1)
    }
}

impl ChunkingStrategy for PdfStrategy {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn options(&self) -> ChunkOptions {
        self.options
    }

    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let layout = scan(text);
        let mut drafts = Vec::new();
        for section in &layout.sections {
            for span in pack(text, &section.units, &self.options) {
                let mut metadata = ChunkMetadata::new(DocumentKind::Pdf);
                metadata.section_heading = section.heading.clone();
                metadata.page_start = layout.page_at(span.start);
                metadata.page_end = layout.page_at(span.end - 1);
                drafts.push(Draft { span, metadata });
            }
        }

        tracing::debug!(
            sections = layout.sections.len(),
            pages = layout.pages.len(),
            chunks = drafts.len(),
            "Chunked PDF text"
        );
        finalize(text, drafts)
    }
}

fn scan(text: &str) -> Layout {
    let mut sections = Vec::new();
    let mut pages = Vec::new();
    let mut current = Section {
        heading: None,
        units: Vec::new(),
    };
    let mut block: Option<Span> = None;

    for line in lines(text, Span::new(0, text.len())) {
        let content = line.slice(text);

        if let Some(page) = page_marker(content) {
            flush_block(text, &mut block, &mut current.units);
            pages.push((line.start, page));
            continue;
        }

        if is_heading(content) {
            flush_block(text, &mut block, &mut current.units);
            let finished = mem::replace(
                &mut current,
                Section {
                    heading: Some(content.trim().to_string()),
                    units: Vec::new(),
                },
            );
            if !finished.units.is_empty() {
                sections.push(finished);
            }
            current.units.extend(trim(text, line).map(Unit::new));
            continue;
        }

        block = Some(match block {
            Some(open) => Span::new(open.start, line.end),
            None => line,
        });
    }

    flush_block(text, &mut block, &mut current.units);
    if !current.units.is_empty() {
        sections.push(current);
    }

    Layout { sections, pages }
}

fn flush_block(text: &str, block: &mut Option<Span>, units: &mut Vec<Unit>) {
    if let Some(span) = block.take() {
        units.extend(sentences(text, span).into_iter().map(Unit::new));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "--- Page 1 ---
CHAPTER 1: INTRODUCTION

This is the introduction section. It contains multiple sentences to demonstrate chunking.
We want to see how the PDF chunking strategy handles section boundaries.

1.1 Background

This subsection provides background information about the topic.
--- Page 2 ---
It should be chunked appropriately with the heading preserved.

CHAPTER 2: METHODOLOGY

This chapter describes the methodology used in the research.";

    fn chunk(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
        PdfStrategy::new(ChunkOptions::new(size, overlap).unwrap()).chunk(text)
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("  \n\n ", 100, 10).is_empty());
    }

    #[test]
    fn sections_reset_at_headings() {
        let chunks = chunk(SAMPLE, 800, 100);
        let headings: Vec<_> = chunks
            .iter()
            .map(|c| c.metadata.section_heading.as_deref())
            .collect();
        assert_eq!(
            headings,
            vec![
                Some("CHAPTER 1: INTRODUCTION"),
                Some("1.1 Background"),
                Some("CHAPTER 2: METHODOLOGY")
            ]
        );
        assert!(chunks[0].text.starts_with("CHAPTER 1: INTRODUCTION"));
        assert!(chunks[0].text.ends_with("section boundaries."));
    }

    #[test]
    fn page_range_follows_markers() {
        let chunks = chunk(SAMPLE, 800, 100);
        assert_eq!(chunks[0].metadata.page_start, Some(1));
        assert_eq!(chunks[0].metadata.page_end, Some(1));
        assert_eq!(chunks[1].metadata.page_start, Some(1));
        assert_eq!(chunks[1].metadata.page_end, Some(2));
        assert_eq!(chunks[2].metadata.page_start, Some(2));
    }

    #[test]
    fn small_budget_splits_sentences_with_overlap() {
        let chunks = chunk(SAMPLE, 35, 20);
        assert!(chunks.len() > 3);
        for window in chunks.windows(2) {
            assert!(window[0].start_offset <= window[1].start_offset);
        }
        for chunk in &chunks {
            assert!(chunk.token_count <= 35, "chunk over budget: {chunk:?}");
        }
        let intro: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata.section_heading.as_deref() == Some("CHAPTER 1: INTRODUCTION"))
            .collect();
        assert_eq!(intro.len(), 2);
        assert!(intro[0].text.ends_with("demonstrate chunking."));
        // the second chunk re-opens with the last sentence of the first
        assert!(intro[1].text.starts_with("It contains multiple sentences"));
        assert!(intro[1].text.ends_with("section boundaries."));
    }

    #[test]
    fn text_without_headings_is_one_section() {
        let chunks = chunk("Plain text. More plain text.", 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section_heading, None);
        assert_eq!(chunks[0].metadata.page_start, None);
        assert_eq!(chunks[0].text, "Plain text. More plain text.");
    }
}
