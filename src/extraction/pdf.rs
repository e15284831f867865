//! Per-page text extraction for PDF uploads.

use super::ExtractionError;
use lopdf::Document;

/// Text recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Page text with surrounding whitespace removed.
    pub text: String,
}

/// Result of extracting a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExtraction {
    /// Pages rendered as `--- Page N ---` blocks separated by blank lines.
    pub text: String,
    /// Number of pages in the document, including pages without text.
    pub page_count: usize,
    /// Pages that produced text, in order.
    pub pages: Vec<PageText>,
}

/// Parse `bytes` as a PDF and extract the text of every page.
///
/// Pages whose content cannot be decoded are logged and skipped; a document without any text
/// (for example a scan) yields an empty `text`.
pub fn extract_pdf(bytes: &[u8]) -> Result<PdfExtraction, ExtractionError> {
    let document = Document::load_mem(bytes)?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let mut pages = Vec::new();
    for number in &page_numbers {
        match document.extract_text(&[*number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pages.push(PageText {
                        number: *number,
                        text: text.to_string(),
                    });
                }
            }
            Err(err) => {
                tracing::warn!(page = number, error = %err, "Failed to extract page text; skipping");
            }
        }
    }

    let text = render_pages(&pages);
    tracing::debug!(
        pages = page_numbers.len(),
        text_pages = pages.len(),
        chars = text.chars().count(),
        "Extracted PDF text"
    );

    Ok(PdfExtraction {
        text,
        page_count: page_numbers.len(),
        pages,
    })
}

fn render_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| format!("--- Page {} ---\n{}", page.number, page.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pages_with_markers() {
        let bytes = fixtures::text_pdf(&["Hello from page one", "Second page here"]);
        let extraction = extract_pdf(&bytes).unwrap();
        assert_eq!(extraction.page_count, 2);
        assert_eq!(extraction.pages.len(), 2);
        assert!(extraction.text.starts_with("--- Page 1 ---\n"));
        assert!(extraction.text.contains("Hello from page one"));
        assert!(extraction.text.contains("\n\n--- Page 2 ---\n"));
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        assert!(matches!(
            extract_pdf(b"definitely not a pdf"),
            Err(ExtractionError::Pdf(_))
        ));
    }

    #[test]
    fn renders_only_pages_with_text() {
        let pages = vec![PageText {
            number: 3,
            text: "Only page".into(),
        }];
        assert_eq!(render_pages(&pages), "--- Page 3 ---\nOnly page");
    }
}
