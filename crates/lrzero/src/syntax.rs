//! Parsing of the line-based grammar text format.
//!
//! Each non-blank line is one raw production: a left side, an arrow, and
//! `|`-separated alternatives, e.g. `S -> B B | b`. Everything after `#` is
//! a comment. Alternatives are plain space-separated symbol strings; their
//! tokenization belongs to the normalizer, not to this parser.

use crate::grammar::{RawGrammar, RawProduction};

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("IO error: {}", _0)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {}", _0)]
    Json(#[from] serde_json::Error),

    #[error("line {}: missing `->' between left and right sides", line)]
    MissingArrow { line: usize },

    #[error("line {}: missing left side before `->'", line)]
    MissingLeftSide { line: usize },

    #[error("line {}: left side `{}' is not a single symbol", line, found)]
    MalformedLeftSide { line: usize, found: String },
}

pub fn parse(source: &str) -> Result<RawGrammar, SyntaxError> {
    let mut productions = vec![];

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let text = match raw_line.split_once('#') {
            Some((before, _comment)) => before,
            None => raw_line,
        };
        if text.trim().is_empty() {
            continue;
        }

        let (left, right) = text
            .split_once("->")
            .ok_or(SyntaxError::MissingArrow { line })?;

        let left = left.trim();
        if left.is_empty() {
            return Err(SyntaxError::MissingLeftSide { line });
        }
        if left.split_whitespace().count() > 1 {
            return Err(SyntaxError::MalformedLeftSide {
                line,
                found: left.to_owned(),
            });
        }

        productions.push(RawProduction {
            left_side: left.to_owned(),
            right_side: right.split('|').map(|alt| alt.trim().to_owned()).collect(),
        });
    }

    Ok(RawGrammar {
        name: None,
        productions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_productions_with_alternatives() {
        let grammar = parse("S -> B B\nB -> a B | b\n").unwrap();
        assert_eq!(grammar.productions.len(), 2);
        assert_eq!(grammar.productions[0].left_side, "S");
        assert_eq!(grammar.productions[0].right_side, vec!["B B"]);
        assert_eq!(grammar.productions[1].right_side, vec!["a B", "b"]);
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let grammar = parse("# toy grammar\n\nS -> a S # right recursion\nS -> b\n").unwrap();
        assert_eq!(grammar.productions.len(), 2);
        assert_eq!(grammar.productions[0].right_side, vec!["a S"]);
    }

    #[test]
    fn rejects_line_without_arrow() {
        let err = parse("S a b\n").unwrap_err();
        assert!(matches!(err, SyntaxError::MissingArrow { line: 1 }));
    }

    #[test]
    fn rejects_missing_left_side() {
        let err = parse("-> a\n").unwrap_err();
        assert!(matches!(err, SyntaxError::MissingLeftSide { line: 1 }));
    }

    #[test]
    fn rejects_multi_symbol_left_side() {
        let err = parse("S a -> b\n").unwrap_err();
        assert!(matches!(err, SyntaxError::MalformedLeftSide { line: 1, .. }));
    }
}
