//! Bindings that turn uploaded document bytes into plain text.
//!
//! PDF parsing goes through `lopdf`; DOCX and PPTX are read as zip archives of XML parts;
//! images are recognized by the Tesseract CLI and office files are converted to PDF by
//! LibreOffice. The text formats emitted here (`--- Page N ---`, `--- Slide N ---`) are the
//! markers the chunking strategies read as structure.

use std::path::Path;
use thiserror::Error;

pub mod convert;
pub mod docx;
pub mod images;
pub mod ocr;
mod office;
pub mod pdf;
pub mod pptx;
mod scratch;
pub mod tables;

pub use docx::{DocxExtraction, extract_docx};
pub use images::{ExtractedImage, extract_images};
pub use ocr::{OcrEngine, OcrOutput};
pub use pdf::{PageText, PdfExtraction, extract_pdf};
pub use pptx::{PptxExtraction, extract_pptx};
pub use scratch::ScratchDir;
pub use tables::{ExtractedTable, extract_tables};

/// Failures raised while extracting content from a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF could not be parsed.
    #[error("invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    /// The office document is not a readable zip archive.
    #[error("invalid office archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// An XML part of an office document is malformed.
    #[error("malformed XML in {part}: {message}")]
    Xml {
        /// Archive entry that failed to parse.
        part: String,
        /// Parser error message.
        message: String,
    },
    /// An archive entry inflates past the per-part size limit.
    #[error("document part {part} exceeds {limit} bytes")]
    PartTooLarge {
        /// Archive entry that was too large.
        part: String,
        /// Limit in bytes.
        limit: u64,
    },
    /// A required archive entry is absent.
    #[error("missing document part: {0}")]
    MissingPart(String),
    /// The image could not be decoded or re-encoded.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// An external tool is not installed or not runnable.
    #[error("{tool} is not available")]
    ToolUnavailable {
        /// Human-readable tool name.
        tool: &'static str,
    },
    /// An external tool ran past its time limit.
    #[error("{tool} timed out after {seconds}s")]
    Timeout {
        /// Human-readable tool name.
        tool: &'static str,
        /// Limit that was exceeded.
        seconds: u64,
    },
    /// An external tool exited unsuccessfully or produced no output.
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Human-readable tool name.
        tool: &'static str,
        /// Diagnostic text, usually the tool's stderr.
        message: String,
    },
    /// Filesystem or process I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extensions accepted by the OCR endpoint and by automatic dispatch.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif"];

/// Upload formats understood by the extraction layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word-processing document.
    Docx,
    /// Office Open XML presentation.
    Pptx,
    /// Raster image routed to OCR.
    Image,
}

impl SourceFormat {
    /// Detect the format from a filename extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            other if IMAGE_EXTENSIONS.contains(&other) => Some(Self::Image),
            _ => None,
        }
    }

    /// Lowercase label used in responses and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Image => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_from_extensions() {
        assert_eq!(SourceFormat::from_filename("report.PDF"), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_filename("a.b.docx"), Some(SourceFormat::Docx));
        assert_eq!(SourceFormat::from_filename("deck.pptx"), Some(SourceFormat::Pptx));
        assert_eq!(SourceFormat::from_filename("scan.TIF"), Some(SourceFormat::Image));
        assert_eq!(SourceFormat::from_filename("notes.txt"), None);
        assert_eq!(SourceFormat::from_filename("README"), None);
    }
}
