//! Construction of the canonical LR(0) state graph.

use crate::grammar::{GrammarError, RawGrammar, StandardGrammar, Symbol};
use crate::item::{Item, ItemSet};
use crate::types::{Map, Set};
use crate::util::display_fn;
use std::{collections::VecDeque, fmt};

/// Identifier of an automaton state, assigned in discovery order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u16);

impl StateId {
    /// The seed state, holding the closure of the augmented start item.
    pub const START: Self = Self(0);

    pub fn index(self) -> usize {
        self.0.into()
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s#{:02}", self.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One automaton state: its closed item set plus the outgoing transitions,
/// keyed by target state with the set of symbols labeling the edge.
#[derive(Debug, Clone)]
pub struct State {
    id: StateId,
    items: ItemSet,
    targets: Map<StateId, Set<Symbol>>,
}

impl State {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn targets(&self) -> impl Iterator<Item = (StateId, &Set<Symbol>)> + '_ {
        self.targets.iter().map(|(id, symbols)| (*id, symbols))
    }

    /// The transition target on `symbol`, if any.
    pub fn transition(&self, symbol: &Symbol) -> Option<StateId> {
        self.targets
            .iter()
            .find(|(_, symbols)| symbols.contains(symbol))
            .map(|(id, _)| *id)
    }

    pub fn display<'g>(&'g self, g: &'g StandardGrammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            writeln!(f, "## items:")?;
            write!(f, "{}", self.items.display(g))?;
            if !self.targets.is_empty() {
                writeln!(f, "## transitions:")?;
                for (target, symbols) in &self.targets {
                    for symbol in symbols {
                        writeln!(f, "- {} => {:?}", symbol, target)?;
                    }
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AutomatonError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("malformed automaton: no state holds the augmented start item")]
    MalformedAutomaton,
}

/// The LR(0) automaton. Immutable once built; safe to share across any
/// number of simulation runs.
#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<State>,
    start_id: StateId,
    end_id: StateId,
    grammar: StandardGrammar,
}

impl Automaton {
    /// Normalize a raw grammar and build its automaton in one step.
    pub fn from_raw(raw: &RawGrammar) -> Result<Self, AutomatonError> {
        Self::build(StandardGrammar::normalize(raw)?)
    }

    /// Iterate closure/goto to a fixpoint over the standard grammar,
    /// breadth-first. State ids are assigned strictly in discovery order,
    /// so two runs over the same grammar number their states identically.
    pub fn build(grammar: StandardGrammar) -> Result<Self, AutomatonError> {
        let seed: ItemSet = [Item::new(0, 0)]
            .into_iter()
            .collect::<ItemSet>()
            .closure(&grammar);

        let mut states = vec![State {
            id: StateId(0),
            items: seed.clone(),
            targets: Map::default(),
        }];
        let mut isocores = Map::<Vec<Item>, StateId>::default();
        isocores.insert(seed.canonical(), StateId(0));

        let mut pending = VecDeque::from([StateId(0)]);
        while let Some(current) = pending.pop_front() {
            let items = states[current.index()].items.clone();
            for symbol in grammar.symbols() {
                let next_items = items.goto(symbol, &grammar);
                if next_items.is_empty() {
                    continue;
                }
                let next = match isocores.get(&next_items.canonical()) {
                    Some(id) => *id,
                    None => {
                        let id = StateId(states.len() as u16);
                        tracing::trace!("discovered {:?} via `{}'", id, symbol);
                        isocores.insert(next_items.canonical(), id);
                        states.push(State {
                            id,
                            items: next_items,
                            targets: Map::default(),
                        });
                        pending.push_back(id);
                        id
                    }
                };
                states[current.index()]
                    .targets
                    .entry(next)
                    .or_default()
                    .insert(symbol.clone());
            }
        }

        let find_augmented = |dot: usize| {
            states
                .iter()
                .find(|state| state.items.contains(Item::new(0, dot)))
                .map(|state| state.id)
        };
        let (Some(start_id), Some(end_id)) = (find_augmented(0), find_augmented(1)) else {
            return Err(AutomatonError::MalformedAutomaton);
        };

        tracing::debug!(
            "built automaton: {} states, start {:?}, end {:?}",
            states.len(),
            start_id,
            end_id
        );

        Ok(Self {
            states,
            start_id,
            end_id,
            grammar,
        })
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Look up a state by id. Panics on a foreign id, which would indicate
    /// a violated internal invariant rather than bad user input.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn start_id(&self) -> StateId {
        self.start_id
    }

    pub fn end_id(&self) -> StateId {
        self.end_id
    }

    pub fn grammar(&self) -> &StandardGrammar {
        &self.grammar
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "#### state {}", state.id)?;
            if state.id == self.start_id {
                write!(f, " (start)")?;
            }
            if state.id == self.end_id {
                write!(f, " (end)")?;
            }
            writeln!(f)?;
            write!(f, "{}", state.display(&self.grammar))?;
        }
        Ok(())
    }
}
