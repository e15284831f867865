use docproc::chunking::{CHARS_PER_TOKEN, Chunk, chunk_text};
use regex::Regex;

const BUDGETS: &[(usize, usize)] = &[(12, 4), (30, 10), (64, 0), (200, 50), (800, 100)];

fn pdf_document() -> String {
    let mut pages = Vec::new();
    for page in 1..=3 {
        let mut body = vec![format!("CHAPTER {page}: RESULTS AND NOTES")];
        for sentence in 0..6 {
            body.push(format!(
                "Sentence {sentence} on page {page} talks about measurement {} in some detail.",
                sentence * page
            ));
        }
        body.push(format!("{page}.1 Détails supplémentaires"));
        // one long run without sentence punctuation forces a hard split
        body.push("word ".repeat(120).trim_end().to_string());
        pages.push(format!("--- Page {page} ---\n{}", body.join("\n")));
    }
    pages.join("\n\n")
}

fn docx_document() -> String {
    let mut paragraphs = vec!["1. Overview".to_string()];
    for idx in 0..5 {
        paragraphs.push(format!(
            "Paragraph {idx} explains the project scope. It has a second sentence too."
        ));
    }
    paragraphs.extend((0..6).map(|idx| format!("- checklist item number {idx}")));
    paragraphs.push("2. Appendix".to_string());
    paragraphs.extend((1..=4).map(|idx| format!("{idx}. numbered step {idx} with some text")));
    paragraphs.push("Closing remarks follow the appendix and end the document.".to_string());
    paragraphs.join("\n\n")
}

fn pptx_document() -> String {
    (1..=5)
        .map(|slide| {
            let bullets: Vec<String> = (0..slide * 2)
                .map(|idx| format!("- bullet {idx} of slide {slide} with extra words"))
                .collect();
            format!("--- Slide {slide} ---\nSlide title {slide}\n{}", bullets.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn documents() -> Vec<(&'static str, String)> {
    vec![
        ("pdf", pdf_document()),
        ("docx", docx_document()),
        ("pptx", pptx_document()),
    ]
}

fn chunks_for(text: &str, file_type: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    chunk_text(text, file_type, Some(size), Some(overlap))
        .expect("valid budget")
        .chunks
}

#[test]
fn every_chunk_fits_the_budget() {
    for (file_type, text) in documents() {
        for &(size, overlap) in BUDGETS {
            for chunk in chunks_for(&text, file_type, size, overlap) {
                assert!(
                    chunk.token_count <= size,
                    "{file_type} chunk over budget {size}: {chunk:?}"
                );
                assert_eq!(chunk.token_count, chunk.text.chars().count() / CHARS_PER_TOKEN);
            }
        }
    }
}

#[test]
fn chunk_text_is_the_source_slice() {
    for (file_type, text) in documents() {
        let chars: Vec<char> = text.chars().collect();
        for &(size, overlap) in BUDGETS {
            for chunk in chunks_for(&text, file_type, size, overlap) {
                let slice: String = chars[chunk.start_offset..chunk.end_offset].iter().collect();
                assert_eq!(slice, chunk.text, "{file_type} offsets drifted");
                assert!(!chunk.text.trim().is_empty());
                assert_eq!(chunk.text.trim(), chunk.text);
            }
        }
    }
}

#[test]
fn offsets_and_indices_are_ordered() {
    for (file_type, text) in documents() {
        for &(size, overlap) in BUDGETS {
            let chunks = chunks_for(&text, file_type, size, overlap);
            for (idx, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.chunk_index, idx);
                assert!(chunk.start_offset < chunk.end_offset);
            }
            for pair in chunks.windows(2) {
                assert!(
                    pair[0].start_offset <= pair[1].start_offset,
                    "{file_type} offsets went backwards"
                );
            }
        }
    }
}

#[test]
fn chunks_cover_all_content_outside_markers() {
    let marker = Regex::new(r"^--- (Page|Slide) \d+ ---$").unwrap();
    for (file_type, text) in documents() {
        for &(size, overlap) in BUDGETS {
            let chunks = chunks_for(&text, file_type, size, overlap);
            let total = text.chars().count();
            let mut covered = vec![false; total];
            for chunk in &chunks {
                covered[chunk.start_offset..chunk.end_offset].fill(true);
            }

            let mut offset = 0;
            for line in text.split('\n') {
                if !marker.is_match(line.trim()) {
                    for (idx, ch) in line.chars().enumerate() {
                        assert!(
                            ch.is_whitespace() || covered[offset + idx],
                            "{file_type} ({size}/{overlap}) lost {ch:?} in line {line:?}"
                        );
                    }
                }
                offset += line.chars().count() + 1;
            }
        }
    }
}

#[test]
fn zero_overlap_never_repeats_content() {
    for (file_type, text) in documents() {
        let chunks = chunks_for(&text, file_type, 30, 0);
        for pair in chunks.windows(2) {
            assert!(
                pair[0].end_offset <= pair[1].start_offset,
                "{file_type} chunks overlap without an overlap budget"
            );
        }
    }
}
