//! Text extraction for slide decks (`ppt/slides/slideN.xml`).
//!
//! Slides are read in numeric part order. Shape text and table rows appear in document order;
//! speaker notes come from the body placeholder of the linked notes slide.

use super::{
    ExtractionError,
    office::{Package, attribute, open_package, read_part, resolve_target, xml_error},
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::sync::LazyLock;

static SLIDE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid slide part regex"));

const NOTES_RELATIONSHIP: &str = "/notesSlide";

/// Result of extracting a PPTX deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PptxExtraction {
    /// Slides rendered as `--- Slide N ---` blocks separated by blank lines.
    pub text: String,
    /// Number of slides in the deck, including slides without text.
    pub slides: usize,
    /// Slides that carried speaker notes.
    pub slides_with_notes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Shape {
        placeholder: Option<String>,
        text: String,
    },
    TableRow(String),
}

/// Extract slide text, tables, and speaker notes from a PPTX package.
pub fn extract_pptx(bytes: &[u8]) -> Result<PptxExtraction, ExtractionError> {
    let mut package = open_package(bytes)?;
    let mut parts: Vec<(u32, String)> = package
        .file_names()
        .filter_map(|name| {
            let number = SLIDE_PART.captures(name)?[1].parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    parts.sort();

    let mut rendered = Vec::new();
    let mut slides_with_notes = 0;

    for (position, (_, part)) in parts.iter().enumerate() {
        let Some(xml) = read_part(&mut package, part)? else {
            continue;
        };
        let mut lines: Vec<String> = parse_blocks(&xml, part)?
            .into_iter()
            .map(|block| match block {
                Block::Shape { text, .. } | Block::TableRow(text) => text,
            })
            .collect();

        if let Some(notes) = slide_notes(&mut package, part)? {
            slides_with_notes += 1;
            lines.push(format!("Notes: {notes}"));
        }

        if !lines.is_empty() {
            rendered.push(format!("--- Slide {} ---\n{}", position + 1, lines.join("\n")));
        }
    }

    tracing::debug!(
        slides = parts.len(),
        rendered = rendered.len(),
        slides_with_notes,
        "Extracted PPTX text"
    );

    Ok(PptxExtraction {
        text: rendered.join("\n\n"),
        slides: parts.len(),
        slides_with_notes,
    })
}

fn slide_notes(
    package: &mut Package<'_>,
    slide_part: &str,
) -> Result<Option<String>, ExtractionError> {
    let (dir, file) = slide_part.rsplit_once('/').unwrap_or(("", slide_part));
    let rels_part = format!("{dir}/_rels/{file}.rels");
    let Some(rels) = read_part(package, &rels_part)? else {
        return Ok(None);
    };
    let Some(target) = notes_target(&rels, &rels_part)? else {
        return Ok(None);
    };

    let notes_part = resolve_target(slide_part, &target);
    let Some(xml) = read_part(package, &notes_part)? else {
        tracing::debug!(part = %notes_part, "Notes relationship points at a missing part");
        return Ok(None);
    };

    let notes: Vec<String> = parse_blocks(&xml, &notes_part)?
        .into_iter()
        .filter_map(|block| match block {
            Block::Shape {
                placeholder: Some(kind),
                text,
            } if kind == "body" => Some(text),
            _ => None,
        })
        .collect();
    Ok((!notes.is_empty()).then(|| notes.join("\n")))
}

fn notes_target(rels: &[u8], part: &str) -> Result<Option<String>, ExtractionError> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(part, err))?
        {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"Relationship" =>
            {
                let is_notes = attribute(&element, b"Type")
                    .is_some_and(|kind| kind.ends_with(NOTES_RELATIONSHIP));
                if is_notes {
                    return Ok(attribute(&element, b"Target"));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

#[derive(Default)]
struct BlockReader {
    blocks: Vec<Block>,
    shape_depth: usize,
    table_depth: usize,
    in_text: bool,
    placeholder: Option<String>,
    shape_paragraphs: Vec<String>,
    paragraph: String,
    cell: String,
    row: Vec<String>,
}

impl BlockReader {
    fn start(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"sp" => {
                self.shape_depth += 1;
                self.placeholder = None;
                self.shape_paragraphs.clear();
            }
            b"ph" if self.shape_depth > 0 => {
                self.placeholder =
                    Some(attribute(element, b"type").unwrap_or_else(|| "obj".to_string()));
            }
            b"tbl" => self.table_depth += 1,
            b"tr" => self.row.clear(),
            b"tc" => self.cell.clear(),
            b"p" => self.paragraph.clear(),
            b"t" => self.in_text = true,
            _ => {}
        }
    }

    fn empty(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"br" => self.paragraph.push('\n'),
            b"ph" => self.start(element),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"t" => self.in_text = false,
            b"p" => {
                let text = self.paragraph.trim_end().to_string();
                self.paragraph.clear();
                if self.table_depth > 0 {
                    let text = text.trim();
                    if !text.is_empty() {
                        if !self.cell.is_empty() {
                            self.cell.push(' ');
                        }
                        self.cell.push_str(text);
                    }
                } else if self.shape_depth > 0 {
                    self.shape_paragraphs.push(text);
                }
            }
            b"tc" => self.row.push(std::mem::take(&mut self.cell)),
            b"tr" => {
                if self.row.iter().any(|cell| !cell.is_empty()) {
                    self.blocks.push(Block::TableRow(self.row.join(" | ")));
                }
                self.row.clear();
            }
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"sp" => {
                self.shape_depth = self.shape_depth.saturating_sub(1);
                let text = self.shape_paragraphs.join("\n").trim().to_string();
                self.shape_paragraphs.clear();
                if !text.is_empty() {
                    self.blocks.push(Block::Shape {
                        placeholder: self.placeholder.take(),
                        text,
                    });
                }
            }
            _ => {}
        }
    }
}

fn parse_blocks(xml: &[u8], part: &str) -> Result<Vec<Block>, ExtractionError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut state = BlockReader::default();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(part, err))?
        {
            Event::Start(element) => state.start(&element),
            Event::Empty(element) => state.empty(&element),
            Event::Text(content) if state.in_text => {
                let value = content.unescape().map_err(|err| xml_error(part, err))?;
                state.paragraph.push_str(&value);
            }
            Event::End(element) => state.end(element.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(state.blocks)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::extraction::office::fixtures::package;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    /// A text shape with one paragraph per entry.
    pub(crate) fn shape(placeholder: Option<&str>, paragraphs: &[&str]) -> String {
        let ph = placeholder
            .map(|kind| format!("<p:nvSpPr><p:nvPr><p:ph type=\"{kind}\"/></p:nvPr></p:nvSpPr>"))
            .unwrap_or_default();
        let body: String = paragraphs
            .iter()
            .map(|text| format!("<a:p><a:r><a:t>{text}</a:t></a:r></a:p>"))
            .collect();
        format!("<p:sp>{ph}<p:txBody>{body}</p:txBody></p:sp>")
    }

    /// Wrap shapes in a slide (or notes slide) document.
    pub(crate) fn slide_xml(root: &str, shapes: &str) -> String {
        format!("<p:{root} {NS}><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:{root}>")
    }

    /// Build a deck from per-slide shape markup and optional notes text.
    pub(crate) fn pptx(slides: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        for (idx, (shapes, notes)) in slides.iter().enumerate() {
            let number = idx + 1;
            parts.push((
                format!("ppt/slides/slide{number}.xml"),
                slide_xml("sld", shapes).into_bytes(),
            ));
            if let Some(notes) = notes {
                parts.push((
                    format!("ppt/slides/_rels/slide{number}.xml.rels"),
                    format!(
                        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide{number}.xml"/></Relationships>"#
                    )
                    .into_bytes(),
                ));
                let notes_shapes = format!(
                    "{}{}",
                    shape(Some("sldImg"), &[]),
                    shape(Some("body"), &[notes])
                );
                parts.push((
                    format!("ppt/notesSlides/notesSlide{number}.xml"),
                    slide_xml("notes", &notes_shapes).into_bytes(),
                ));
            }
        }
        let borrowed: Vec<(&str, &[u8])> = parts
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .collect();
        package(&borrowed)
    }
}
