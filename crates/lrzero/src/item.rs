//! LR(0) items and item sets.

use crate::grammar::{StandardGrammar, Symbol};
use crate::types::Set;
use crate::util::display_fn;
use std::fmt;

/// An LR(0) item: a production index paired with a dot position in
/// `[0, right.len()]`. Production indices refer to the standard grammar's
/// production list, so item equality is structural.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: usize,
    pub dot: usize,
}

impl Item {
    pub fn new(production: usize, dot: usize) -> Self {
        Self { production, dot }
    }

    /// The symbol immediately after the dot, or `None` for a complete item.
    pub fn symbol_after_dot<'g>(&self, g: &'g StandardGrammar) -> Option<&'g Symbol> {
        g.production(self.production).right().get(self.dot)
    }

    pub fn is_complete(&self, g: &StandardGrammar) -> bool {
        self.dot == g.production(self.production).right().len()
    }

    fn advanced(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }

    // `"S -> B . B"`
    pub fn display<'g>(self, g: &'g StandardGrammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} ->", production.left())?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if self.dot == production.right().len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A deduplicated, unordered collection of items. Equality is set equality.
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    items: Set<Item>,
}

impl ItemSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: Item) -> bool {
        self.items.contains(&item)
    }

    pub fn iter(&self) -> impl Iterator<Item = Item> + '_ {
        self.items.iter().copied()
    }

    /// Items sorted by (production, dot); used as the deduplication key
    /// during automaton construction.
    pub fn canonical(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.iter().copied().collect();
        items.sort_unstable();
        items
    }

    /// Expand this set to its closure: for every item with a non-terminal
    /// after the dot, all of that non-terminal's productions are added as
    /// fresh dot-0 items, to a fixpoint.
    pub fn closure(mut self, g: &StandardGrammar) -> Self {
        let mut pending: Vec<Item> = self.items.iter().copied().collect();
        while let Some(item) = pending.pop() {
            let Some(symbol) = item.symbol_after_dot(g) else {
                continue;
            };
            if g.is_terminal(symbol) {
                continue;
            }
            for production in g.productions_for(symbol) {
                let item = Item::new(production, 0);
                if self.items.insert(item) {
                    pending.push(item);
                }
            }
        }
        self
    }

    /// The closed item set reached by advancing the dot past `symbol`.
    /// Empty when no item has `symbol` after its dot; complete items are
    /// inert here.
    pub fn goto(&self, symbol: &Symbol, g: &StandardGrammar) -> Self {
        let advanced: Self = self
            .items
            .iter()
            .filter(|item| item.symbol_after_dot(g) == Some(symbol))
            .map(|item| item.advanced())
            .collect();
        advanced.closure(g)
    }

    pub fn display<'g>(&'g self, g: &'g StandardGrammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for item in &self.items {
                writeln!(f, "- {}", item.display(g))?;
            }
            Ok(())
        })
    }
}

impl PartialEq for ItemSet {
    fn eq(&self, other: &Self) -> bool {
        // IndexSet equality is order-independent.
        self.items == other.items
    }
}

impl Eq for ItemSet {}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
