//! Shift-reduce simulation over a built automaton.
//!
//! A [`Configuration`] is an immutable snapshot of one parse; every step
//! produces a fresh configuration, so callers can keep a history for
//! replay or undo without any coordination.

use crate::automaton::{Automaton, StateId};
use crate::grammar::Symbol;
use std::{collections::VecDeque, fmt};

/// Which half of the two-part commit the configuration is in.
///
/// A reduce first rewrites the stacks and only then, on the next step,
/// performs the goto on the freshly pushed non-terminal; the pending goto
/// is recorded here instead of being inferred from stack lengths.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingShiftOrReduce,
    CommittingGotoAfterReduce,
}

/// The report produced by a single step. `Accept`, `Conflict` and `Stuck`
/// are terminal; `Conflict` and `Stuck` leave the configuration untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Accept,
    Conflict(String),
    Stuck(String),
}

impl StepOutcome {
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

const JAMMED: &str = "automaton jammed";
const SHIFT_REDUCE: &str = "shift/reduce conflict";

/// One snapshot of a shift-reduce parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    step_index: usize,
    phase: Phase,
    state_stack: Vec<StateId>,
    symbol_stack: Vec<Symbol>,
    remaining: VecDeque<Symbol>,
    initial_sentence: String,
}

impl Configuration {
    /// Start a parse from a sentence of one-character terminals.
    pub fn from_sentence(sentence: &str) -> Self {
        Self::start(
            sentence.to_owned(),
            sentence.chars().map(|c| Symbol::new(c.to_string())),
        )
    }

    /// Start a parse from pre-tokenized symbols, for grammars whose
    /// terminals are longer than one character.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Symbol>,
    {
        let tokens: Vec<Symbol> = tokens.into_iter().collect();
        let sentence = tokens
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self::start(sentence, tokens)
    }

    fn start(initial_sentence: String, tokens: impl IntoIterator<Item = Symbol>) -> Self {
        let mut remaining: VecDeque<Symbol> = tokens.into_iter().collect();
        remaining.push_back(Symbol::end_marker());
        Self {
            step_index: 0,
            phase: Phase::AwaitingShiftOrReduce,
            state_stack: vec![StateId::START],
            symbol_stack: vec![Symbol::end_marker()],
            remaining,
            initial_sentence,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state_stack(&self) -> &[StateId] {
        &self.state_stack
    }

    pub fn symbol_stack(&self) -> &[Symbol] {
        &self.symbol_stack
    }

    pub fn remaining(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.remaining.iter()
    }

    pub fn initial_sentence(&self) -> &str {
        &self.initial_sentence
    }

    fn current_state(&self) -> StateId {
        *self
            .state_stack
            .last()
            .expect("state stack is never empty during a parse")
    }

    /// Advance the parse by one step, returning the successor configuration
    /// and the step's outcome. `Conflict` and `Stuck` return the receiver
    /// unchanged.
    pub fn step(&self, automaton: &Automaton) -> (Configuration, StepOutcome) {
        let grammar = automaton.grammar();
        let current = automaton.state(self.current_state());

        // Reaching the accepting state decides the parse: accept on the end
        // marker, jam if input remains.
        if current.id() == automaton.end_id() {
            return if self.remaining.front() == Some(&Symbol::end_marker()) {
                let mut next = self.clone();
                next.remaining.pop_front();
                next.step_index += 1;
                tracing::trace!("accepted after {} steps", next.step_index);
                (next, StepOutcome::Accept)
            } else {
                (self.clone(), StepOutcome::Stuck(JAMMED.to_owned()))
            };
        }

        // Second half of a reduce: goto on the freshly pushed non-terminal.
        if self.phase == Phase::CommittingGotoAfterReduce {
            let symbol = self.symbol_stack.last().expect("symbol stack holds the sentinel");
            return match current.transition(symbol) {
                Some(target) => {
                    tracing::trace!("goto {:?} on `{}'", target, symbol);
                    let mut next = self.clone();
                    next.state_stack.push(target);
                    next.phase = Phase::AwaitingShiftOrReduce;
                    (next, StepOutcome::Continue)
                }
                None => (self.clone(), StepOutcome::Stuck(JAMMED.to_owned())),
            };
        }

        let lookahead = self.remaining.front();
        let shift = lookahead.and_then(|symbol| current.transition(symbol));

        // A complete item whose right-hand side matches the top of the
        // symbol stack (the bottom sentinel excluded) as a suffix.
        let reduce = current.items().iter().find(|item| {
            if !item.is_complete(grammar) {
                return false;
            }
            let right = grammar.production(item.production).right();
            let stack = &self.symbol_stack[1..];
            stack.len() >= right.len() && stack[stack.len() - right.len()..] == *right
        });

        match (shift, reduce) {
            (Some(_), Some(_)) => (self.clone(), StepOutcome::Conflict(SHIFT_REDUCE.to_owned())),

            (Some(target), None) => {
                let symbol = lookahead.expect("shift target implies a lookahead").clone();
                tracing::trace!("shift `{}' into {:?}", symbol, target);
                let mut next = self.clone();
                next.state_stack.push(target);
                next.symbol_stack.push(symbol);
                next.remaining.pop_front();
                next.step_index += 1;
                (next, StepOutcome::Continue)
            }

            (None, Some(item)) => {
                let production = grammar.production(item.production);
                tracing::trace!("reduce by {}: {}", item.production, production);
                let mut next = self.clone();
                let popped = production.right().len();
                next.symbol_stack.truncate(next.symbol_stack.len() - popped);
                next.state_stack.truncate(next.state_stack.len() - popped);
                next.symbol_stack.push(production.left().clone());
                next.phase = Phase::CommittingGotoAfterReduce;
                next.step_index += 1;
                (next, StepOutcome::Continue)
            }

            (None, None) => (self.clone(), StepOutcome::Stuck(JAMMED.to_owned())),
        }
    }

    /// Apply up to `count` single steps, stopping early at the first
    /// outcome other than `Continue`.
    pub fn step_many(&self, automaton: &Automaton, count: usize) -> (Configuration, StepOutcome) {
        let mut config = self.clone();
        let mut outcome = StepOutcome::Continue;
        for _ in 0..count {
            (config, outcome) = config.step(automaton);
            if !outcome.is_continue() {
                break;
            }
        }
        (config, outcome)
    }

    /// Step until a terminal outcome, bounded by `limit` single steps as a
    /// guard against grammars that reduce without ever consuming input. A
    /// final `Continue` means the limit elapsed first.
    pub fn run_to_completion(
        &self,
        automaton: &Automaton,
        limit: usize,
    ) -> (Configuration, StepOutcome) {
        self.step_many(automaton, limit)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "states:")?;
        for state in &self.state_stack {
            write!(f, " {}", state)?;
        }
        write!(f, " | symbols:")?;
        for symbol in &self.symbol_stack {
            write!(f, " {}", symbol)?;
        }
        write!(f, " | input:")?;
        for symbol in &self.remaining {
            write!(f, " {}", symbol)?;
        }
        if self.phase == Phase::CommittingGotoAfterReduce {
            write!(f, " (goto pending)")?;
        }
        Ok(())
    }
}
