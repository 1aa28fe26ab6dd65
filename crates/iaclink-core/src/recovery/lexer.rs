//! Lexer-level strategies. Offsets are byte offsets into the scanned text
//! and always land on a char boundary.

/// Stand-in for a character the lexer could not accept
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Offset of the next whitespace at or after `offset`, or the end of input.
pub fn skip_to_safe_point(source: &str, offset: usize) -> usize {
    let offset = floor_char_boundary(source, offset);
    source[offset..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| offset + i)
        .unwrap_or(source.len())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminatedString {
    pub value: String,
    /// Offset just past the assumed end of the literal
    pub end: usize,
}

/// Treats an unterminated string starting at `offset` (just after the
/// opening quote) as ending at the next newline.
pub fn insert_missing_terminator(source: &str, offset: usize) -> TerminatedString {
    let offset = floor_char_boundary(source, offset);
    let rest = &source[offset..];
    let end = rest.find(['\n', '\r']).map(|i| offset + i).unwrap_or(source.len());
    TerminatedString { value: source[offset..end].to_string(), end }
}

/// Skips the single character at `offset`, returning the offset after it
/// together with the character it stands for.
pub fn replace_and_skip(source: &str, offset: usize) -> (usize, char) {
    let offset = floor_char_boundary(source, offset);
    match source[offset..].chars().next() {
        Some(c) => (offset + c.len_utf8(), REPLACEMENT_CHARACTER),
        None => (source.len(), REPLACEMENT_CHARACTER),
    }
}

pub(crate) fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("foo@bar baz", 3, 7)]
    #[test_case("abc\ndef", 0, 3)]
    #[test_case("abc", 1, 3; "end of input")]
    #[test_case("x", 10, 1; "offset past the end")]
    fn test_skip_to_safe_point(source: &str, offset: usize, expected: usize) {
        assert_eq!(skip_to_safe_point(source, offset), expected);
    }

    #[test]
    fn test_insert_missing_terminator() {
        let source = "name = \"vpc\nregion = \"us-east-1\"";
        let terminated = insert_missing_terminator(source, 8);
        assert_eq!(terminated.value, "vpc");
        assert_eq!(&source[terminated.end..terminated.end + 1], "\n");

        let terminated = insert_missing_terminator("x = \"open", 5);
        assert_eq!(terminated.value, "open");
        assert_eq!(terminated.end, 9);
    }

    #[test]
    fn test_replace_and_skip_multibyte() {
        let source = "a€b";
        assert_eq!(replace_and_skip(source, 1), (4, REPLACEMENT_CHARACTER));
        // inside the euro sign, floors to its start
        assert_eq!(replace_and_skip(source, 2), (4, REPLACEMENT_CHARACTER));
        assert_eq!(replace_and_skip(source, 5).0, 5);
    }
}
