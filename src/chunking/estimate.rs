//! Token estimation and byte/character offset bookkeeping.

/// Rough characters-per-token ratio used for every budget decision.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text` as its character count divided by four.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Largest character count whose estimate still fits `chunk_size` tokens.
///
/// Saturates at `usize::MAX`, so huge budgets behave as unlimited.
pub(crate) fn max_chars_for(chunk_size: usize) -> usize {
    chunk_size
        .saturating_add(1)
        .saturating_mul(CHARS_PER_TOKEN)
        .saturating_sub(1)
}

/// Converts byte offsets into character offsets for mostly ascending queries.
///
/// Each lookup resumes from the previous position; a lookup behind the cursor restarts from
/// the beginning of the text.
pub(crate) struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Character offset of `byte`, which must lie on a char boundary.
    pub(crate) fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_uses_integer_division_of_chars() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        // multi-byte characters count once
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn max_chars_is_the_largest_fitting_length() {
        let limit = max_chars_for(3);
        assert_eq!(estimate_tokens(&"x".repeat(limit)), 3);
        assert_eq!(estimate_tokens(&"x".repeat(limit + 1)), 4);
    }

    #[test]
    fn max_chars_saturates_for_huge_budgets() {
        assert_eq!(max_chars_for(usize::MAX), usize::MAX - 1);
        assert_eq!(max_chars_for(usize::MAX / 4), usize::MAX - 1);
        assert_eq!(max_chars_for(0), CHARS_PER_TOKEN - 1);
    }

    #[test]
    fn cursor_counts_chars_and_rewinds() {
        let text = "añb—c";
        let mut cursor = CharCursor::new(text);
        let dash = text.find('—').unwrap();
        assert_eq!(cursor.char_offset(dash), 3);
        assert_eq!(cursor.char_offset(text.len()), 5);
        assert_eq!(cursor.char_offset(1), 1);
    }
}
