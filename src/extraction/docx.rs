//! Text extraction for word-processor documents (`word/document.xml`).

use super::{
    ExtractionError,
    office::{open_package, require_part, xml_error},
};
use quick_xml::Reader;
use quick_xml::events::Event;

const DOCUMENT_PART: &str = "word/document.xml";

/// Result of extracting a DOCX document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxExtraction {
    /// Body paragraphs separated by blank lines, then table rows after `--- Tables ---`.
    pub text: String,
    /// Non-empty body paragraphs.
    pub paragraphs: usize,
    /// Tables in the document body.
    pub tables: usize,
    /// Table rows rendered as `cell | cell`.
    pub table_rows: usize,
}

/// Extract body paragraphs and table rows from a DOCX package.
pub fn extract_docx(bytes: &[u8]) -> Result<DocxExtraction, ExtractionError> {
    let mut package = open_package(bytes)?;
    let xml = require_part(&mut package, DOCUMENT_PART)?;
    let body = parse_document(&xml)?;

    let mut text = body.paragraphs.join("\n\n");
    if !body.rows.is_empty() {
        text.push_str("\n\n--- Tables ---\n");
        text.push_str(&body.rows.join("\n"));
    }

    tracing::debug!(
        paragraphs = body.paragraphs.len(),
        tables = body.tables,
        rows = body.rows.len(),
        "Extracted DOCX text"
    );

    Ok(DocxExtraction {
        text,
        paragraphs: body.paragraphs.len(),
        tables: body.tables,
        table_rows: body.rows.len(),
    })
}

#[derive(Default)]
struct Body {
    paragraphs: Vec<String>,
    rows: Vec<String>,
    tables: usize,
}

fn parse_document(xml: &[u8]) -> Result<Body, ExtractionError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut body = Body::default();

    let mut table_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row: Vec<String> = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(DOCUMENT_PART, err))?
        {
            Event::Start(element) => match element.local_name().as_ref() {
                b"tbl" => {
                    if table_depth == 0 {
                        body.tables += 1;
                    }
                    table_depth += 1;
                }
                b"tr" => row.clear(),
                b"tc" => cell.clear(),
                b"p" => paragraph.clear(),
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(element) if run_depth > 0 => match element.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(content) if in_text => {
                let value = content
                    .unescape()
                    .map_err(|err| xml_error(DOCUMENT_PART, err))?;
                paragraph.push_str(&value);
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => {
                    let text = paragraph.trim();
                    if table_depth > 0 {
                        if !text.is_empty() {
                            if !cell.is_empty() {
                                cell.push(' ');
                            }
                            cell.push_str(text);
                        }
                    } else if !text.is_empty() {
                        body.paragraphs.push(text.to_string());
                    }
                    paragraph.clear();
                }
                b"tc" => row.push(std::mem::take(&mut cell)),
                b"tr" => {
                    if row.iter().any(|cell| !cell.is_empty()) {
                        body.rows.push(row.join(" | "));
                    }
                    row.clear();
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{docx, paragraph};
    use super::*;

    #[test]
    fn joins_paragraphs_and_appends_tables() {
        let body = format!(
            "{}<w:p/>{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            paragraph("Introduction"),
            paragraph("Tom &amp; Jerry"),
            paragraph("Name"),
            paragraph("Role"),
            paragraph("Ada"),
            paragraph("Engineer"),
        );
        let extraction = extract_docx(&docx(&body)).unwrap();
        assert_eq!(
            extraction.text,
            "Introduction\n\nTom & Jerry\n\n--- Tables ---\nName | Role\nAda | Engineer"
        );
        assert_eq!(extraction.paragraphs, 2);
        assert_eq!(extraction.tables, 1);
        assert_eq!(extraction.table_rows, 2);
    }

    #[test]
    fn runs_tabs_and_breaks_are_preserved() {
        let body = "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
                    <w:r><w:t>Left</w:t></w:r><w:r><w:tab/><w:t>Right</w:t><w:br/><w:t>Next</w:t></w:r></w:p>";
        let extraction = extract_docx(&docx(body)).unwrap();
        assert_eq!(extraction.text, "Left\tRight\nNext");
    }

    #[test]
    fn missing_document_part_is_an_error() {
        let bytes = crate::extraction::office::fixtures::package(&[("other.xml", b"<x/>".as_slice())]);
        assert!(matches!(
            extract_docx(&bytes),
            Err(ExtractionError::MissingPart(_))
        ));
    }
}
