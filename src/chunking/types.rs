//! Chunk records, per-format options, and chunking errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced while turning extracted text into chunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Caller requested an impossible token budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Document format that selects a chunking strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Paged documents with section headings.
    Pdf,
    /// Word-processor documents made of paragraphs and lists.
    Docx,
    /// Slide decks.
    Pptx,
}

impl DocumentKind {
    /// Resolve a file type or extension (`"pdf"`, `".DOCX"`, `"ppt"`) to a known kind.
    ///
    /// Returns `None` for types without a dedicated strategy.
    pub fn from_file_type(file_type: &str) -> Option<Self> {
        let normalized = file_type.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "pptx" | "ppt" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Lowercase label used in responses and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token budget for a chunking run, expressed in estimated tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Upper bound on the estimated token count of each chunk.
    pub chunk_size: usize,
    /// Upper bound on the estimated token count of the unit carried into the next chunk.
    pub chunk_overlap: usize,
}

impl ChunkOptions {
    /// Build options, rejecting a zero budget and clamping the overlap below the budget.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        })
    }

    /// Defaults tuned per format: long-form PDFs get the largest budget, slides the smallest.
    pub const fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Pdf => Self {
                chunk_size: 800,
                chunk_overlap: 100,
            },
            DocumentKind::Docx => Self {
                chunk_size: 700,
                chunk_overlap: 80,
            },
            DocumentKind::Pptx => Self {
                chunk_size: 500,
                chunk_overlap: 50,
            },
        }
    }

    /// Apply optional caller overrides on top of the per-format defaults.
    pub fn resolve(
        kind: DocumentKind,
        chunk_size: Option<usize>,
        chunk_overlap: Option<usize>,
    ) -> Result<Self, ChunkingError> {
        let defaults = Self::for_kind(kind);
        Self::new(
            chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap.unwrap_or(defaults.chunk_overlap),
        )
    }
}

/// Structural context attached to a chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Strategy that produced the chunk.
    pub source: DocumentKind,
    /// Heading of the section the chunk belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_heading: Option<String>,
    /// Slide the chunk was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<u32>,
    /// Page in effect at the first character of the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
    /// Page in effect at the last character of the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_end: Option<u32>,
}

impl ChunkMetadata {
    /// Metadata carrying only the source format.
    pub const fn new(source: DocumentKind) -> Self {
        Self {
            source,
            section_heading: None,
            slide_number: None,
            page_start: None,
            page_end: None,
        }
    }
}

/// A bounded text segment prepared for downstream retrieval.
///
/// `text` is exactly the source characters in `start_offset..end_offset`; offsets count
/// Unicode scalar values, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk content.
    pub text: String,
    /// Character offset of the first character.
    pub start_offset: usize,
    /// Character offset one past the last character.
    pub end_offset: usize,
    /// Estimated token count (`chars / 4`).
    pub token_count: usize,
    /// Position in the document's chunk list.
    pub chunk_index: usize,
    /// Structural context.
    pub metadata: ChunkMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_map_to_strategies() {
        assert_eq!(DocumentKind::from_file_type("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_file_type(".doc"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_type("ppt"), Some(DocumentKind::Pptx));
        assert_eq!(DocumentKind::from_file_type("txt"), None);
    }

    #[test]
    fn options_reject_zero_budget_and_clamp_overlap() {
        assert_eq!(ChunkOptions::new(0, 0), Err(ChunkingError::InvalidChunkSize));
        let options = ChunkOptions::new(10, 50).expect("valid options");
        assert_eq!(options.chunk_overlap, 9);
    }

    #[test]
    fn resolve_prefers_overrides_over_format_defaults() {
        let defaults = ChunkOptions::resolve(DocumentKind::Pptx, None, None).unwrap();
        assert_eq!(defaults, ChunkOptions::for_kind(DocumentKind::Pptx));

        let custom = ChunkOptions::resolve(DocumentKind::Docx, Some(120), None).unwrap();
        assert_eq!(custom.chunk_size, 120);
        assert_eq!(custom.chunk_overlap, 80);
    }

    #[test]
    fn metadata_omits_absent_fields() {
        let json = serde_json::to_value(ChunkMetadata::new(DocumentKind::Docx)).unwrap();
        assert_eq!(json, serde_json::json!({ "source": "docx" }));
    }
}
