//! Core data types and error definitions for the processing service.

use crate::chunking::{ChunkMetadata, ChunkingError, DocumentKind};
use crate::extraction::{ExtractedImage, ExtractedTable, ExtractionError, SourceFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by the document processing service.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Chunk options were rejected.
    #[error("Invalid chunk options: {0}")]
    Chunking(#[from] ChunkingError),
    /// Extraction failed for a document of the given format.
    #[error("Failed to process {format}: {source}")]
    Extraction {
        /// Format label of the document being processed.
        format: &'static str,
        /// Underlying extraction failure.
        #[source]
        source: ExtractionError,
    },
    /// Automatic dispatch met an extension it does not handle.
    #[error(
        "Unsupported file type: {extension}. Supported: .pdf, .docx, .pptx, .jpg, .png, .gif, .bmp, .tiff"
    )]
    UnsupportedFileType {
        /// Extension found on the upload, or an empty string.
        extension: String,
    },
    /// The request did not carry a usable upload.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    /// A JSON request body could not be decoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// A blocking worker panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub(crate) fn extraction(format: SourceFormat, source: ExtractionError) -> Self {
        Self::Extraction {
            format: format.as_str(),
            source,
        }
    }

    pub(crate) fn unsupported(filename: &str) -> Self {
        Self::UnsupportedFileType {
            extension: super::sanitize::extension_of(filename)
                .map(|ext| format!(".{ext}"))
                .unwrap_or_default(),
        }
    }

    /// Whether the failure was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Chunking(_)
                | Self::UnsupportedFileType { .. }
                | Self::InvalidUpload(_)
                | Self::InvalidRequest(_)
        )
    }

    /// Whether the failure was caused by a missing external tool.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Extraction {
                source: ExtractionError::ToolUnavailable { .. },
                ..
            }
        )
    }
}

/// An uploaded file with a sanitized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Sanitized filename, safe to join onto a directory.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Wrap an upload, rejecting empty files.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ProcessingError> {
        if bytes.is_empty() {
            return Err(ProcessingError::InvalidUpload(
                "uploaded file is empty".to_string(),
            ));
        }
        Ok(Self {
            filename: filename.into(),
            bytes,
        })
    }

    /// Format implied by the filename extension.
    pub fn detect_format(&self) -> Result<SourceFormat, ProcessingError> {
        SourceFormat::from_filename(&self.filename)
            .ok_or_else(|| ProcessingError::unsupported(&self.filename))
    }
}

/// Result of a text extraction request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    /// Extracted text.
    pub text: String,
    /// Always `true`; failures are reported as error responses.
    pub success: bool,
    /// Sanitized upload filename.
    pub filename: String,
    /// Format label (`pdf`, `docx`, `pptx`, `image`).
    pub format: String,
    /// Character count of `text`.
    pub char_count: usize,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub sha256: String,
    /// Page count (PDF).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    /// Non-empty body paragraphs (DOCX).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraphs: Option<usize>,
    /// Tables in the body (DOCX).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<usize>,
    /// Table rows appended to the text (DOCX).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_rows: Option<usize>,
    /// Slide count (PPTX).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<usize>,
    /// Mean word confidence (OCR).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Width and height of the recognized image (OCR).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<[u32; 2]>,
    /// Set when extraction succeeded but found no text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ExtractionReport {
    /// Chunking strategy that matches the extracted text.
    pub fn document_kind(&self) -> DocumentKind {
        DocumentKind::from_file_type(&self.format).unwrap_or(DocumentKind::Pdf)
    }
}

/// Tables found in a PDF upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablesResponse {
    /// Always `true`.
    pub success: bool,
    /// Sanitized upload filename.
    pub filename: String,
    /// Number of tables found.
    pub table_count: usize,
    /// Tables in page order.
    pub tables: Vec<ExtractedTable>,
}

/// Images written for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagesResponse {
    /// Always `true`.
    pub success: bool,
    /// Sanitized upload filename.
    pub filename: String,
    /// Directory that received the images.
    pub output_dir: String,
    /// Number of images written.
    pub image_count: usize,
    /// Written images.
    pub images: Vec<ExtractedImage>,
}

/// PDF produced by converting an office document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPdf {
    /// Name to offer in `Content-Disposition`.
    pub filename: String,
    /// PDF contents.
    pub bytes: Vec<u8>,
}

/// Request body for `POST /chunk`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkRequest {
    /// Text to chunk.
    pub text: String,
    /// File type that selects the strategy (`pdf`, `docx`, `pptx`, ...).
    pub file_type: String,
    /// Budget override in estimated tokens.
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// Overlap override in estimated tokens.
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

/// A chunk as returned over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Chunk content.
    pub text: String,
    /// Character offset of the first character.
    pub start_offset: usize,
    /// Character offset one past the last character.
    pub end_offset: usize,
    /// Estimated token count.
    pub token_count: usize,
    /// Position in the chunk list.
    pub chunk_index: usize,
    /// Structural context.
    pub metadata: ChunkMetadata,
    /// SHA-256 of `text`, hex encoded.
    pub chunk_hash: String,
}

/// Response body for `POST /chunk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkResponse {
    /// Always `true`.
    pub success: bool,
    /// Strategy that produced the chunks.
    pub strategy: DocumentKind,
    /// Effective chunk size.
    pub chunk_size: usize,
    /// Effective overlap.
    pub chunk_overlap: usize,
    /// Number of chunks.
    pub chunk_count: usize,
    /// Sum of chunk token estimates.
    pub total_tokens: usize,
    /// Chunks whose hash repeats an earlier chunk.
    pub duplicate_chunks: usize,
    /// Chunks in document order.
    pub chunks: Vec<ChunkPayload>,
}

/// Response body for `POST /process`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResponse {
    /// Always `true`.
    pub success: bool,
    /// Extraction step result.
    pub extraction: ExtractionReport,
    /// Chunking step result.
    pub chunking: ChunkResponse,
}

/// Service and tool availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `healthy` while the service answers.
    pub status: &'static str,
    /// Service identifier.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether OCR can run.
    pub tesseract_available: bool,
    /// Whether office conversion can run.
    pub libreoffice_available: bool,
}
