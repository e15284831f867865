//! Structure-aware chunking of extracted document text.
//!
//! Each document format has a [`ChunkingStrategy`] that picks its own segmentation units
//! (sentences for PDFs, paragraphs and list groups for DOCX, slides for PPTX) and hands them to
//! a shared packer that enforces the token budget and the one-unit overlap rule. Every chunk's
//! `text` is the exact slice `start_offset..end_offset` of the input, counted in characters.

mod docx;
mod estimate;
mod packer;
mod pdf;
mod pptx;
mod segment;
mod structure;
mod types;

pub use docx::DocxStrategy;
pub use estimate::{CHARS_PER_TOKEN, estimate_tokens};
pub use pdf::PdfStrategy;
pub use pptx::PptxStrategy;
pub use types::{Chunk, ChunkMetadata, ChunkOptions, ChunkingError, DocumentKind};

/// Format-specific segmentation behind a common chunking entry point.
pub trait ChunkingStrategy: Send + Sync {
    /// Format this strategy handles.
    fn kind(&self) -> DocumentKind;

    /// Budget the strategy was configured with.
    fn options(&self) -> ChunkOptions;

    /// Split `text` into ordered chunks. Blank input yields no chunks.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Build the strategy for `kind`.
pub fn strategy_for(kind: DocumentKind, options: ChunkOptions) -> Box<dyn ChunkingStrategy> {
    match kind {
        DocumentKind::Pdf => Box::new(PdfStrategy::new(options)),
        DocumentKind::Docx => Box::new(DocxStrategy::new(options)),
        DocumentKind::Pptx => Box::new(PptxStrategy::new(options)),
    }
}

/// Map a caller-supplied file type to a strategy, falling back to PDF for unknown types.
pub fn resolve_kind(file_type: &str) -> DocumentKind {
    DocumentKind::from_file_type(file_type).unwrap_or_else(|| {
        tracing::warn!(file_type, "Unknown file type for chunking; using pdf strategy");
        DocumentKind::Pdf
    })
}

/// Result of a chunking run, including the strategy and budget that were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingOutcome {
    /// Strategy that produced the chunks.
    pub strategy: DocumentKind,
    /// Effective budget after defaults and clamping.
    pub options: ChunkOptions,
    /// Chunks in document order.
    pub chunks: Vec<Chunk>,
}

impl ChunkingOutcome {
    /// Sum of the estimated token counts across all chunks.
    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.token_count).sum()
    }
}

/// Chunk `text` with the strategy for `file_type`, applying per-format defaults for any
/// budget the caller leaves unset.
///
/// # Errors
///
/// Returns [`ChunkingError::InvalidChunkSize`] when the effective chunk size is zero.
pub fn chunk_text(
    text: &str,
    file_type: &str,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
) -> Result<ChunkingOutcome, ChunkingError> {
    let kind = resolve_kind(file_type);
    let options = ChunkOptions::resolve(kind, chunk_size, chunk_overlap)?;
    let chunks = strategy_for(kind, options).chunk(text);

    tracing::info!(
        strategy = %kind,
        chunk_size = options.chunk_size,
        chunk_overlap = options.chunk_overlap,
        chunks = chunks.len(),
        "Chunked document text"
    );

    Ok(ChunkingOutcome {
        strategy: kind,
        options,
        chunks,
    })
}
