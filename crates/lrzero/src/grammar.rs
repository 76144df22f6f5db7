//! Grammar types and normalization.

use crate::types::Set;
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, path::Path, sync::Arc};

/// The terminal symbol marking the end of input, rendered as `$`.
pub const END_MARKER: &str = "$";

/// An interned grammar symbol. Equality is structural; clones are cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn end_marker() -> Self {
        Self::new(END_MARKER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// One user-supplied production: a left side plus its alternative
/// right-hand sides, each alternative a space-separated symbol string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduction {
    pub left_side: String,
    pub right_side: Vec<String>,
}

/// A grammar as entered by the user, before normalization.
///
/// This is also the persisted JSON shape: `{"name": ..., "productions":
/// [{"leftSide": "S", "rightSide": ["B B", "b"]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub productions: Vec<RawProduction>,
}

impl RawGrammar {
    /// Read a raw grammar from a file, dispatching on the extension:
    /// `.json` is parsed as the persisted JSON shape, anything else as the
    /// line-based text format.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::syntax::SyntaxError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&source)?),
            _ => crate::syntax::parse(&source),
        }
    }

    pub fn from_text(source: &str) -> Result<Self, crate::syntax::SyntaxError> {
        crate::syntax::parse(source)
    }

    pub fn from_json(source: &str) -> Result<Self, crate::syntax::SyntaxError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("raw grammar is always serializable")
    }
}

/// A single flat production of the standard grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    left: Symbol,
    right: Vec<Symbol>,
}

impl Production {
    pub fn left(&self) -> &Symbol {
        &self.left
    }

    pub fn right(&self) -> &[Symbol] {
        &self.right
    }
}

impl fmt::Display for Production {
    // `"LHS -> R1 R2 R3"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.left)?;
        for symbol in &self.right {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("the grammar has no productions")]
    EmptyGrammar,
}

/// The normalized, augmented grammar.
///
/// Production order is significant: the production index is the stable
/// identifier used for reduce actions, and index 0 is always the synthesized
/// `start' -> start` production.
#[derive(Debug, Clone)]
pub struct StandardGrammar {
    productions: Vec<Production>,
    non_terminals: Set<Symbol>,
    terminals: Set<Symbol>,
    start: Symbol,
}

impl StandardGrammar {
    /// Normalize a raw grammar into the augmented standard form.
    ///
    /// Alternatives that tokenize to zero symbols are treated as unfilled
    /// input rows and skipped; a left side all of whose alternatives are
    /// empty still declares its non-terminal, which the validator reports
    /// if the symbol is referenced anywhere.
    pub fn normalize(raw: &RawGrammar) -> Result<Self, GrammarError> {
        if raw.productions.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut non_terminals = Set::default();
        for production in &raw.productions {
            non_terminals.insert(Symbol::new(&production.left_side));
        }

        let mut productions = vec![];
        for production in &raw.productions {
            let left = Symbol::new(&production.left_side);
            for alternative in &production.right_side {
                let right: Vec<Symbol> =
                    alternative.split_whitespace().map(Symbol::new).collect();
                if right.is_empty() {
                    continue;
                }
                productions.push(Production { left: left.clone(), right });
            }
        }
        if productions.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut terminals = Set::default();
        for production in &productions {
            for symbol in &production.right {
                if !non_terminals.contains(symbol) {
                    terminals.insert(symbol.clone());
                }
            }
        }

        let start_original = non_terminals
            .iter()
            .find(|n| productions.iter().all(|p| !p.right.contains(*n)))
            .or_else(|| non_terminals.first())
            .cloned()
            .expect("non-terminal set is non-empty");

        // The augmented start symbol must not collide with user symbols.
        let mut start_name = format!("{}'", start_original);
        while non_terminals.contains(start_name.as_str())
            || terminals.contains(start_name.as_str())
        {
            start_name.push('\'');
        }
        let start = Symbol::new(&start_name);

        productions.insert(
            0,
            Production {
                left: start.clone(),
                right: vec![start_original],
            },
        );
        non_terminals.insert(start.clone());

        Ok(Self {
            productions,
            non_terminals,
            terminals,
            start,
        })
    }

    /// Check the grammar for a unique start symbol and for non-terminals
    /// lacking a defining production. All checks run; the returned messages
    /// are empty for a valid grammar.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        let referenced: Set<&Symbol> = self
            .productions
            .iter()
            .skip(1)
            .flat_map(|p| p.right.iter())
            .collect();

        let candidates: Vec<&Symbol> = self
            .non_terminals
            .iter()
            .filter(|n| **n != self.start && !referenced.contains(*n))
            .collect();
        match candidates.len() {
            0 => errors.push(
                "no start symbol candidate: every non-terminal appears on a right-hand side"
                    .to_owned(),
            ),
            1 => {}
            _ => errors.push(format!(
                "multiple start symbol candidates: {}",
                candidates
                    .iter()
                    .map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }

        for non_terminal in &self.non_terminals {
            if *non_terminal == self.start || !referenced.contains(non_terminal) {
                continue;
            }
            if self
                .productions
                .iter()
                .all(|p| p.left != *non_terminal)
            {
                errors.push(format!(
                    "non-terminal `{}' has no associated production rule",
                    non_terminal
                ));
            }
        }

        errors
    }

    pub fn start(&self) -> &Symbol {
        &self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Look up a production by index. Panics if the index is out of range,
    /// since indices originate from this grammar's own item sets.
    pub fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }

    pub fn productions_for<'g>(
        &'g self,
        left: &'g Symbol,
    ) -> impl Iterator<Item = usize> + 'g {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.left == *left)
            .map(|(i, _)| i)
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.non_terminals.iter()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.terminals.iter()
    }

    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        self.terminals.contains(symbol)
    }

    /// All grammar symbols in recorded order, terminals first.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.terminals.iter().chain(self.non_terminals.iter())
    }
}

impl fmt::Display for StandardGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in &self.terminals {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## non-terminals:")?;
        for non_terminal in &self.non_terminals {
            write!(f, "{}", non_terminal)?;
            if *non_terminal == self.start {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for (index, production) in self.productions.iter().enumerate() {
            writeln!(f, "{}: {}", index, production)?;
        }

        Ok(())
    }
}

/// Normalize a raw grammar and collect the validator's diagnostics in one
/// call. Non-empty diagnostics are expected to block further progression,
/// but the decision is the caller's.
pub fn normalize_and_validate(
    raw: &RawGrammar,
) -> Result<(StandardGrammar, Vec<String>), GrammarError> {
    let grammar = StandardGrammar::normalize(raw)?;
    let errors = grammar.validate();
    Ok((grammar, errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(productions: &[(&str, &[&str])]) -> RawGrammar {
        RawGrammar {
            name: None,
            productions: productions
                .iter()
                .map(|(left, alternatives)| RawProduction {
                    left_side: left.to_string(),
                    right_side: alternatives.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn normalize_expands_alternatives() {
        let g = StandardGrammar::normalize(&raw(&[
            ("S", &["B B"]),
            ("B", &["a B", "b"]),
        ]))
        .unwrap();

        let rendered: Vec<String> =
            g.productions().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["S' -> S", "S -> B B", "B -> a B", "B -> b"],
        );
        assert_eq!(g.start().as_str(), "S'");

        let terminals: Vec<&str> = g.terminals().map(|t| t.as_str()).collect();
        assert_eq!(terminals, vec!["a", "b"]);
        let non_terminals: Vec<&str> = g.non_terminals().map(|n| n.as_str()).collect();
        assert_eq!(non_terminals, vec!["S", "B", "S'"]);
    }

    #[test]
    fn normalize_skips_empty_alternatives() {
        let g = StandardGrammar::normalize(&raw(&[("S", &["a", "", "  "])])).unwrap();
        assert_eq!(g.productions().len(), 2);
    }

    #[test]
    fn empty_grammar_is_rejected() {
        assert!(matches!(
            StandardGrammar::normalize(&raw(&[])),
            Err(GrammarError::EmptyGrammar)
        ));
        assert!(matches!(
            StandardGrammar::normalize(&raw(&[("S", &["", ""])])),
            Err(GrammarError::EmptyGrammar)
        ));
    }

    #[test]
    fn augmented_start_avoids_collisions() {
        let g = StandardGrammar::normalize(&raw(&[
            ("S", &["S' a"]),
            ("S'", &["b"]),
        ]))
        .unwrap();
        assert_eq!(g.start().as_str(), "S''");
    }

    #[test]
    fn validate_accepts_well_formed_grammar() {
        let (_, errors) = normalize_and_validate(&raw(&[
            ("S", &["B B"]),
            ("B", &["a B", "b"]),
        ]))
        .unwrap();
        assert!(errors.is_empty(), "unexpected diagnostics: {:?}", errors);
    }

    #[test]
    fn validate_reports_multiple_start_candidates() {
        let (_, errors) = normalize_and_validate(&raw(&[
            ("S", &["a"]),
            ("T", &["b"]),
        ]))
        .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], "multiple start symbol candidates: S, T");
    }

    #[test]
    fn validate_reports_missing_definition() {
        // `A` is declared by an unfilled row and referenced by `S`.
        let (_, errors) = normalize_and_validate(&raw(&[
            ("S", &["A b"]),
            ("A", &[""]),
        ]))
        .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0], "non-terminal `A' has no associated production rule");
    }

    #[test]
    fn validate_reports_cyclic_grammar_without_start() {
        let (_, errors) = normalize_and_validate(&raw(&[("S", &["S a", "a"])])).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("no start symbol candidate"));
    }

    #[test]
    fn validator_checks_are_not_short_circuited() {
        let (_, errors) = normalize_and_validate(&raw(&[
            ("S", &["A a"]),
            ("A", &[""]),
            ("T", &["b"]),
        ]))
        .unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("multiple start symbol candidates"));
        assert!(errors[1].contains("`A'"));
    }

    #[test]
    fn raw_grammar_json_round_trip() {
        let grammar = raw(&[("S", &["B B"]), ("B", &["a B", "b"])]);
        let json = grammar.to_json();
        assert!(json.contains("\"leftSide\""));
        let reloaded = RawGrammar::from_json(&json).unwrap();
        assert_eq!(reloaded, grammar);
    }
}
