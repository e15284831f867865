//! Paragraph-based chunking for word-processor documents.

use super::{
    ChunkingStrategy,
    estimate::max_chars_for,
    packer::{Draft, Unit, finalize, pack},
    segment::{Span, paragraphs},
    structure::{is_heading, is_list_item},
    types::{Chunk, ChunkMetadata, ChunkOptions, DocumentKind},
};

/// Chunking strategy that respects paragraph boundaries and keeps lists together.
pub struct DocxStrategy {
    options: ChunkOptions,
}

impl DocxStrategy {
    /// Create a strategy with the given budget.
    pub const fn new(options: ChunkOptions) -> Self {
        Self { options }
    }
}

impl ChunkingStrategy for DocxStrategy {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    fn options(&self) -> ChunkOptions {
        self.options
    }

    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let paras = paragraphs(text, Span::new(0, text.len()));
        let max_chars = max_chars_for(self.options.chunk_size);
        let mut units = Vec::with_capacity(paras.len());
        let mut headings: Vec<(usize, String)> = Vec::new();

        let mut idx = 0;
        while idx < paras.len() {
            let content = paras[idx].slice(text);
            if is_list_item(content) {
                let mut last = idx;
                while last + 1 < paras.len() && is_list_item(paras[last + 1].slice(text)) {
                    last += 1;
                }
                let group = Span::new(paras[idx].start, paras[last].end);
                if last > idx && group.char_len(text) <= max_chars {
                    units.push(Unit::fresh(group));
                } else {
                    units.extend(paras[idx..=last].iter().copied().map(Unit::fresh));
                }
                idx = last + 1;
                continue;
            }

            if !content.contains('\n') && is_heading(content) {
                headings.push((paras[idx].start, content.to_string()));
            }
            units.push(Unit::new(paras[idx]));
            idx += 1;
        }

        let drafts: Vec<Draft> = pack(text, &units, &self.options)
            .into_iter()
            .map(|span| {
                let mut metadata = ChunkMetadata::new(DocumentKind::Docx);
                metadata.section_heading = heading_at(&headings, span.start);
                Draft { span, metadata }
            })
            .collect();

        tracing::debug!(
            paragraphs = paras.len(),
            units = units.len(),
            chunks = drafts.len(),
            "Chunked DOCX text"
        );
        finalize(text, drafts)
    }
}

fn heading_at(headings: &[(usize, String)], position: usize) -> Option<String> {
    let idx = headings.partition_point(|(start, _)| *start <= position);
    idx.checked_sub(1).map(|idx| headings[idx].1.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
        DocxStrategy::new(ChunkOptions::new(size, overlap).unwrap()).chunk(text)
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let chunks = chunk(text, 700, 80);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].metadata.source, DocumentKind::Docx);
    }

    #[test]
    fn overflow_carries_the_previous_paragraph() {
        // each paragraph is 40 characters
        let para = |c: char| format!("{} {}.", c.to_string().repeat(19), c.to_string().repeat(19));
        let text = format!("{}\n\n{}\n\n{}", para('a'), para('b'), para('c'));
        let chunks = chunk(&text, 21, 15);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with('a'));
        assert!(chunks[0].text.ends_with("b."));
        assert!(chunks[1].text.starts_with('b'));
        assert!(chunks[1].text.ends_with("c."));
    }

    #[test]
    fn lists_start_fresh_and_stay_together() {
        let intro = "Intro paragraph that is long enough to fill most of the budget here.";
        let text = format!("{intro}\n\nBridge sentence.\n\n- first item\n\n- second item\n\n- third item");
        let chunks = chunk(&text, 22, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "- first item\n\n- second item\n\n- third item");
    }

    #[test]
    fn headings_label_following_chunks() {
        let text = "PROJECT OVERVIEW NOTES\n\nBody text under the heading.";
        let chunks = chunk(text, 700, 80);
        assert_eq!(
            chunks[0].metadata.section_heading.as_deref(),
            Some("PROJECT OVERVIEW NOTES")
        );
    }
}
