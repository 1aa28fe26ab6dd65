//! Block-level strategies: skipping a broken block, re-synchronising on the
//! next block keyword, and keeping what was parsed before the failure.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::BLOCK_KEYWORDS;

use super::lexer::floor_char_boundary;

/// Offset just past the `}` that ends the block containing `offset`, or the
/// first block opened at or after it when `offset` sits between blocks. A
/// `}` met before any `{` closes the enclosing block. Braces inside strings
/// and comments are ignored. `None` when the input ends first.
pub fn skip_to_matching_brace(source: &str, offset: usize) -> Option<usize> {
    let start = floor_char_boundary(source, offset);
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i + 1);
                continue;
            }
            b'#' => i = skip_line(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find(bytes, i + 2, b"*/").map(|end| end + 2).unwrap_or(bytes.len());
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                if depth <= 1 {
                    return Some(i + 1);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Start of the first line after `offset` that opens a known block.
pub fn sync_to_next_block(source: &str, offset: usize) -> Option<usize> {
    let start = floor_char_boundary(source, offset);
    let mut line_start = start + source[start..].find('\n')? + 1;

    while line_start < source.len() {
        let line = &source[line_start..];
        let line = line.split('\n').next().unwrap_or_default();
        let trimmed = line.trim_start();
        if starts_block(trimmed) {
            return Some(line_start + (line.len() - trimmed.len()));
        }
        line_start += line.len() + 1;
    }
    None
}

fn starts_block(line: &str) -> bool {
    BLOCK_KEYWORDS.iter().any(|keyword| {
        line.strip_prefix(keyword)
            .and_then(|rest| rest.chars().next())
            .map(|next| next.is_whitespace() || next == '{' || next == '"')
            .unwrap_or(false)
    })
}

fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            // an unterminated string ends at the newline
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], i: usize) -> usize {
    find(bytes, i, b"\n").unwrap_or(bytes.len())
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| from + p)
}

/// A block whose body failed to parse, with the attributes read before the
/// failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialBlock {
    pub block_type: String,
    pub labels: Vec<String>,
    pub attributes: IndexMap<String, Value>,
    pub complete: bool,
}

impl PartialBlock {
    pub fn new(block_type: impl Into<String>, labels: Vec<String>, attributes: IndexMap<String, Value>) -> Self {
        PartialBlock { block_type: block_type.into(), labels, attributes, complete: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_nested_blocks() {
        let source = "locals {\n  a = { b = 1 }\n  c = 2\n}\nterraform {}";
        let end = skip_to_matching_brace(source, 0).unwrap();
        assert_eq!(&source[end..], "\nterraform {}");
    }

    #[test]
    fn test_ignores_braces_in_strings_and_comments() {
        let source = "inputs {\n  a = \"}\" # }\n  // }\n  /* } */ b = \"\\\"}\"\n}\nnext";
        let end = skip_to_matching_brace(source, 0).unwrap();
        assert_eq!(&source[end..], "\nnext");
    }

    #[test]
    fn test_error_inside_body_keeps_next_block() {
        let source = "locals {\n  a = = 1\n}\ninputs = {\n  x = 1\n}\n";
        let offset = source.find("= 1").unwrap();
        let end = skip_to_matching_brace(source, offset).unwrap();
        assert_eq!(&source[end..], "\ninputs = {\n  x = 1\n}\n");
    }

    #[test]
    fn test_error_inside_nested_value_closes_innermost_block() {
        let source = "locals {\n  a = { b = = 1 }\n  c = 2\n}\nterraform {}";
        let offset = source.find("= = 1").unwrap() + 2;
        let end = skip_to_matching_brace(source, offset).unwrap();
        assert_eq!(&source[end..], "\n  c = 2\n}\nterraform {}");
    }

    #[test]
    fn test_unbalanced_block() {
        assert_eq!(skip_to_matching_brace("locals {\n  a = {\n", 0), None);
    }

    #[test]
    fn test_sync_to_next_block() {
        let source = "locals {\n  broken = \n  dependency_x = 1\n  dependency \"vpc\" {\n}";
        let offset = sync_to_next_block(source, 10).unwrap();
        assert!(source[offset..].starts_with("dependency \"vpc\""));
        assert_eq!(sync_to_next_block("locals {\n  a = 1\n", 0), None);
    }
}
