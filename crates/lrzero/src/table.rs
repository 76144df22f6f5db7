//! Derivation of the ACTION/GOTO table.
//!
//! The table is a read-only view for presentation. The stepper computes
//! its shifts and reduces directly from the automaton, so this module has
//! no bearing on parse correctness; cells holding more than one entry are
//! exposed as-is to show why a grammar is not LR(0).

use crate::automaton::{Automaton, StateId};
use crate::grammar::{Symbol, END_MARKER};
use crate::types::Map;
use std::fmt;

/// A single ACTION entry. Rendered in the original `s3`/`r2`/`acc` codes
/// by its `Display` impl.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(usize),
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(target) => write!(f, "s{}", target),
            Self::Reduce(production) => write!(f, "r{}", production),
            Self::Accept => f.write_str("acc"),
        }
    }
}

/// One table row: ACTION cells per terminal plus the end-of-input column,
/// and GOTO targets per non-terminal.
#[derive(Debug, Clone)]
pub struct TableRow {
    actions: Map<Symbol, Vec<Action>>,
    end_actions: Vec<Action>,
    gotos: Map<Symbol, Option<StateId>>,
}

impl TableRow {
    pub fn action(&self, terminal: &Symbol) -> &[Action] {
        self.actions.get(terminal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn end_actions(&self) -> &[Action] {
        &self.end_actions
    }

    pub fn goto(&self, non_terminal: &Symbol) -> Option<StateId> {
        self.gotos.get(non_terminal).copied().flatten()
    }

    pub fn is_conflicted(&self) -> bool {
        self.actions.values().any(|cell| cell.len() > 1) || self.end_actions.len() > 1
    }
}

/// The derived ACTION/GOTO table, one row per automaton state.
#[derive(Debug, Clone)]
pub struct ParseTable {
    rows: Vec<TableRow>,
    terminals: Vec<Symbol>,
    non_terminals: Vec<Symbol>,
}

impl ParseTable {
    /// Read the automaton into per-state ACTION/GOTO cells. Safe to call
    /// on demand; the automaton is not modified.
    pub fn derive(automaton: &Automaton) -> Self {
        let grammar = automaton.grammar();
        let terminals: Vec<Symbol> = grammar.terminals().cloned().collect();
        let non_terminals: Vec<Symbol> = grammar
            .non_terminals()
            .filter(|n| *n != grammar.start())
            .cloned()
            .collect();

        let rows = automaton
            .states()
            .iter()
            .map(|state| {
                // Complete items reduce on every lookahead; the augmented
                // production is the accepting state's business, not a
                // reduce entry.
                let mut reduces: Vec<usize> = vec![];
                for item in state.items().iter() {
                    if item.production != 0
                        && item.is_complete(grammar)
                        && !reduces.contains(&item.production)
                    {
                        reduces.push(item.production);
                    }
                }

                let mut actions = Map::default();
                for terminal in &terminals {
                    let mut cell: Vec<Action> = vec![];
                    if let Some(target) = state.transition(terminal) {
                        cell.push(Action::Shift(target));
                    }
                    cell.extend(reduces.iter().map(|&production| Action::Reduce(production)));
                    actions.insert(terminal.clone(), cell);
                }

                let end_actions = if state.id() == automaton.end_id() {
                    vec![Action::Accept]
                } else {
                    reduces.iter().map(|&production| Action::Reduce(production)).collect()
                };

                let mut gotos = Map::default();
                for non_terminal in &non_terminals {
                    gotos.insert(non_terminal.clone(), state.transition(non_terminal));
                }

                TableRow {
                    actions,
                    end_actions,
                    gotos,
                }
            })
            .collect();

        Self {
            rows,
            terminals,
            non_terminals,
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, id: StateId) -> &TableRow {
        &self.rows[id.index()]
    }

    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &[Symbol] {
        &self.non_terminals
    }

    /// Whether any cell holds more than one entry, i.e. the grammar is not
    /// a valid LR(0) grammar.
    pub fn has_conflicts(&self) -> bool {
        self.rows.iter().any(TableRow::is_conflicted)
    }
}

impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_cell(f: &mut fmt::Formatter<'_>, cell: &[Action]) -> fmt::Result {
            for (i, action) in cell.iter().enumerate() {
                if i > 0 {
                    f.write_str("/")?;
                }
                write!(f, "{}", action)?;
            }
            Ok(())
        }

        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "#### state {}", index)?;
            writeln!(f, "## actions")?;
            for terminal in &self.terminals {
                let cell = row.action(terminal);
                if cell.is_empty() {
                    continue;
                }
                write!(f, "- {} => ", terminal)?;
                write_cell(f, cell)?;
                writeln!(f)?;
            }
            if !row.end_actions.is_empty() {
                write!(f, "- {} => ", END_MARKER)?;
                write_cell(f, &row.end_actions)?;
                writeln!(f)?;
            }
            let gotos: Vec<_> = self
                .non_terminals
                .iter()
                .filter_map(|n| row.goto(n).map(|target| (n, target)))
                .collect();
            if !gotos.is_empty() {
                writeln!(f, "## gotos")?;
                for (non_terminal, target) in gotos {
                    writeln!(f, "- {} => {}", non_terminal, target)?;
                }
            }
        }
        Ok(())
    }
}
