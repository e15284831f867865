//! The accumulation loop shared by every strategy, plus final chunk construction.

use super::{
    estimate::{CharCursor, estimate_tokens, max_chars_for},
    segment::{Span, split_oversized},
    types::{Chunk, ChunkMetadata, ChunkOptions},
};

/// Smallest segment a strategy hands to the packer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Unit {
    pub(crate) span: Span,
    /// When this unit opens a chunk, do not carry the previous unit over.
    pub(crate) fresh_start: bool,
}

impl Unit {
    pub(crate) const fn new(span: Span) -> Self {
        Self {
            span,
            fresh_start: false,
        }
    }

    pub(crate) const fn fresh(span: Span) -> Self {
        Self {
            span,
            fresh_start: true,
        }
    }
}

/// Chunk span plus metadata, before offsets and indices are assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Draft {
    pub(crate) span: Span,
    pub(crate) metadata: ChunkMetadata,
}

/// Group units into chunk spans that each fit the token budget.
///
/// Units larger than the budget are split first, so every returned span fits. Consecutive
/// spans overlap by at most one unit.
pub(crate) fn pack(text: &str, units: &[Unit], options: &ChunkOptions) -> Vec<Span> {
    let max_chars = max_chars_for(options.chunk_size);
    let units: Vec<Unit> = units
        .iter()
        .flat_map(|unit| {
            split_oversized(text, unit.span, max_chars)
                .into_iter()
                .enumerate()
                .map(move |(piece, span)| Unit {
                    span,
                    fresh_start: unit.fresh_start && piece == 0,
                })
        })
        .collect();

    let fits = |first: usize, last: usize| {
        estimate_tokens(&text[units[first].span.start..units[last].span.end])
            <= options.chunk_size
    };

    let mut spans = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for idx in 0..units.len() {
        let Some((first, last)) = current else {
            current = Some((idx, idx));
            continue;
        };
        if fits(first, idx) {
            current = Some((first, idx));
            continue;
        }

        spans.push(Span::new(units[first].span.start, units[last].span.end));

        let carried = &units[last];
        let carry = options.chunk_overlap > 0
            && last > first
            && !units[idx].fresh_start
            && estimate_tokens(carried.span.slice(text)) <= options.chunk_overlap
            && fits(last, idx);
        current = Some((if carry { last } else { idx }, idx));
    }

    if let Some((first, last)) = current {
        spans.push(Span::new(units[first].span.start, units[last].span.end));
    }

    spans
}

/// Turn drafts into chunks with character offsets and sequential indices.
pub(crate) fn finalize(text: &str, drafts: Vec<Draft>) -> Vec<Chunk> {
    let mut starts = CharCursor::new(text);
    let mut ends = CharCursor::new(text);

    drafts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, draft)| {
            let content = draft.span.slice(text);
            Chunk {
                text: content.to_string(),
                start_offset: starts.char_offset(draft.span.start),
                end_offset: ends.char_offset(draft.span.end),
                token_count: estimate_tokens(content),
                chunk_index,
                metadata: draft.metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::segment::{paragraphs, sentences};

    fn whole(text: &str) -> Span {
        Span::new(0, text.len())
    }

    fn slices<'a>(text: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans.iter().map(|span| span.slice(text)).collect()
    }

    #[test]
    fn packs_sentences_with_one_unit_overlap() {
        // 16 characters per sentence including the trailing space
        let text = "Aaaa aaaa aaaaa. Bbbb bbbb bbbbb. Cccc cccc ccccc. Dddd dddd ddddd.";
        let units: Vec<Unit> = sentences(text, whole(text))
            .into_iter()
            .map(Unit::new)
            .collect();
        let options = ChunkOptions::new(8, 4).unwrap();
        let spans = pack(text, &units, &options);
        assert_eq!(
            slices(text, &spans),
            vec![
                "Aaaa aaaa aaaaa. Bbbb bbbb bbbbb.",
                "Bbbb bbbb bbbbb. Cccc cccc ccccc.",
                "Cccc cccc ccccc. Dddd dddd ddddd."
            ]
        );
    }

    #[test]
    fn zero_overlap_produces_disjoint_chunks() {
        let text = "Aaaa aaaa aaaaa. Bbbb bbbb bbbbb. Cccc cccc ccccc.";
        let units: Vec<Unit> = sentences(text, whole(text))
            .into_iter()
            .map(Unit::new)
            .collect();
        let options = ChunkOptions::new(8, 0).unwrap();
        let spans = pack(text, &units, &options);
        assert_eq!(
            slices(text, &spans),
            vec!["Aaaa aaaa aaaaa. Bbbb bbbb bbbbb.", "Cccc cccc ccccc."]
        );
    }

    #[test]
    fn fresh_units_open_chunks_without_overlap() {
        let text = "First paragraph here.\n\nSecond paragraph.\n\n- list item one";
        let paras = paragraphs(text, whole(text));
        let units = vec![Unit::new(paras[0]), Unit::new(paras[1]), Unit::fresh(paras[2])];
        let options = ChunkOptions::new(10, 9).unwrap();
        let spans = pack(text, &units, &options);
        assert_eq!(
            slices(text, &spans),
            vec![
                "First paragraph here.\n\nSecond paragraph.",
                "- list item one"
            ]
        );
    }

    #[test]
    fn oversized_units_are_split_to_fit() {
        let text = "word ".repeat(40);
        let units = vec![Unit::new(Span::new(0, text.trim_end().len()))];
        let options = ChunkOptions::new(5, 0).unwrap();
        let spans = pack(&text, &units, &options);
        assert!(spans.len() > 1);
        for span in spans {
            assert!(estimate_tokens(span.slice(&text)) <= 5);
        }
    }

    #[test]
    fn finalize_reports_character_offsets() {
        let text = "héllo wörld";
        let drafts = vec![Draft {
            span: Span::new(text.find('w').unwrap(), text.len()),
            metadata: ChunkMetadata::new(crate::chunking::DocumentKind::Pdf),
        }];
        let chunks = finalize(text, drafts);
        assert_eq!(chunks[0].text, "wörld");
        assert_eq!(chunks[0].start_offset, 6);
        assert_eq!(chunks[0].end_offset, 11);
        assert_eq!(chunks[0].token_count, 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }
}
