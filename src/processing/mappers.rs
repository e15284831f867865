//! Mapping helpers between library results and response payloads.

use crate::chunking::{Chunk, ChunkingOutcome};
use crate::extraction::{DocxExtraction, OcrOutput, PdfExtraction, PptxExtraction, SourceFormat};
use crate::processing::types::{ChunkPayload, ChunkResponse, ExtractionReport};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const EMPTY_PDF_WARNING: &str =
    "No text extracted. This may be a scanned PDF. Try /extract/ocr endpoint.";
const EMPTY_DOCX_WARNING: &str = "No text content found in document";
const EMPTY_PPTX_WARNING: &str = "No text content found in presentation";
const EMPTY_IMAGE_WARNING: &str = "No text detected in image";

/// Hex-encoded SHA-256 digest of `bytes`.
pub(crate) fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Attach hashes to chunks and count repeats, keeping every chunk in place.
pub(crate) fn chunk_payloads(chunks: Vec<Chunk>) -> (Vec<ChunkPayload>, usize) {
    let mut seen = HashSet::new();
    let mut duplicates = 0;

    let payloads = chunks
        .into_iter()
        .map(|chunk| {
            let chunk_hash = compute_hash(chunk.text.as_bytes());
            if !seen.insert(chunk_hash.clone()) {
                duplicates += 1;
            }
            ChunkPayload {
                text: chunk.text,
                start_offset: chunk.start_offset,
                end_offset: chunk.end_offset,
                token_count: chunk.token_count,
                chunk_index: chunk.chunk_index,
                metadata: chunk.metadata,
                chunk_hash,
            }
        })
        .collect();

    (payloads, duplicates)
}

pub(crate) fn chunk_response(outcome: ChunkingOutcome) -> ChunkResponse {
    let total_tokens = outcome.total_tokens();
    let ChunkingOutcome {
        strategy,
        options,
        chunks,
    } = outcome;
    let (chunks, duplicate_chunks) = chunk_payloads(chunks);

    ChunkResponse {
        success: true,
        strategy,
        chunk_size: options.chunk_size,
        chunk_overlap: options.chunk_overlap,
        chunk_count: chunks.len(),
        total_tokens,
        duplicate_chunks,
        chunks,
    }
}

/// Report skeleton shared by every format.
fn base_report(format: SourceFormat, filename: &str, bytes: &[u8], text: String) -> ExtractionReport {
    ExtractionReport {
        char_count: text.chars().count(),
        text,
        success: true,
        filename: filename.to_string(),
        format: format.as_str().to_string(),
        sha256: compute_hash(bytes),
        ..ExtractionReport::default()
    }
}

fn warn_if_empty(report: &mut ExtractionReport, warning: &str) {
    if report.text.trim().is_empty() {
        report.warning = Some(warning.to_string());
    }
}

pub(crate) fn pdf_report(filename: &str, bytes: &[u8], pdf: PdfExtraction) -> ExtractionReport {
    let mut report = base_report(SourceFormat::Pdf, filename, bytes, pdf.text);
    report.pages = Some(pdf.page_count);
    warn_if_empty(&mut report, EMPTY_PDF_WARNING);
    report
}

pub(crate) fn docx_report(filename: &str, bytes: &[u8], docx: DocxExtraction) -> ExtractionReport {
    let mut report = base_report(SourceFormat::Docx, filename, bytes, docx.text);
    report.paragraphs = Some(docx.paragraphs);
    report.tables = Some(docx.tables);
    report.table_rows = Some(docx.table_rows);
    warn_if_empty(&mut report, EMPTY_DOCX_WARNING);
    report
}

pub(crate) fn pptx_report(filename: &str, bytes: &[u8], pptx: PptxExtraction) -> ExtractionReport {
    let mut report = base_report(SourceFormat::Pptx, filename, bytes, pptx.text);
    report.slides = Some(pptx.slides);
    warn_if_empty(&mut report, EMPTY_PPTX_WARNING);
    report
}

pub(crate) fn ocr_report(filename: &str, bytes: &[u8], ocr: OcrOutput) -> ExtractionReport {
    let mut report = base_report(SourceFormat::Image, filename, bytes, ocr.text);
    report.confidence = ocr.confidence;
    report.image_size = Some([ocr.image_size.0, ocr.image_size.1]);
    warn_if_empty(&mut report, EMPTY_IMAGE_WARNING);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{ChunkMetadata, DocumentKind};

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            start_offset: index * 10,
            end_offset: index * 10 + text.chars().count(),
            token_count: text.chars().count() / 4,
            chunk_index: index,
            metadata: ChunkMetadata::new(DocumentKind::Pdf),
        }
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        assert_eq!(
            compute_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn repeated_chunks_are_counted_but_kept() {
        let (payloads, duplicates) =
            chunk_payloads(vec![chunk(0, "same"), chunk(1, "other"), chunk(2, "same")]);
        assert_eq!(payloads.len(), 3);
        assert_eq!(duplicates, 1);
        assert_eq!(payloads[0].chunk_hash, payloads[2].chunk_hash);
        assert_eq!(payloads[2].chunk_index, 2);
    }

    #[test]
    fn empty_pdf_text_carries_scan_hint() {
        let report = pdf_report(
            "scan.pdf",
            b"%PDF",
            PdfExtraction {
                text: String::new(),
                page_count: 3,
                pages: Vec::new(),
            },
        );
        assert_eq!(report.pages, Some(3));
        assert_eq!(report.char_count, 0);
        assert_eq!(report.warning.as_deref(), Some(EMPTY_PDF_WARNING));
    }

    #[test]
    fn char_count_counts_characters() {
        let report = ocr_report(
            "scan.png",
            b"png",
            OcrOutput {
                text: "héllo".to_string(),
                confidence: Some(91.5),
                image_size: (10, 20),
            },
        );
        assert_eq!(report.char_count, 5);
        assert_eq!(report.image_size, Some([10, 20]));
        assert!(report.warning.is_none());
        assert_eq!(report.format, "image");
    }
}
