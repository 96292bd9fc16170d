//! Construction of the LR(0) automaton, i.e. the canonical collection of item sets.

use crate::{
    closure::{closure, Item, ItemSet},
    grammar::{Grammar, SymbolID},
    types::Map,
    util::display_fn,
};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);
impl StateID {
    /// The closure of `S' -> . S`.
    pub const INITIAL: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }
}
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub id: StateID,
    /// The closed item set of this state.
    pub items: ItemSet,
    /// Outgoing transitions, on terminal and nonterminal symbols alike.
    pub edges: Map<SymbolID, StateID>,
}

impl State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            writeln!(f, "State {}:", self.id)?;
            for item in &self.items {
                writeln!(f, "  {}", item.display(g))?;
            }
            for (&symbol, next) in &self.edges {
                writeln!(f, "  {} -> State {}", g.symbol_name(symbol), next)?;
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct Automaton {
    /// The states in discovery order.
    pub states: Map<StateID, State>,
}

impl Automaton {
    pub fn build(g: &Grammar) -> Self {
        build(g)
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[&id]
    }

    /// The transition function, defined on the symbols that appear after a
    /// dot in the state's items.
    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.states.get(&from)?.edges.get(&symbol).copied()
    }

    pub fn transitions(&self) -> impl Iterator<Item = ((StateID, SymbolID), StateID)> + '_ {
        self.states.values().flat_map(|state| {
            state
                .edges
                .iter()
                .map(move |(&symbol, &next)| ((state.id, symbol), next))
        })
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for (i, state) in self.states.values().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
pub fn build(g: &Grammar) -> Automaton {
    let span = tracing::trace_span!("lr0");
    let _entered = span.enter();

    let mut states = Map::<StateID, State>::default();
    // closed item set -> state, to resolve the successors to existing states.
    let mut known = Map::<ItemSet, StateID>::default();
    let mut pending = VecDeque::<StateID>::new();

    let initial = closure(g, [Item::start()]);
    known.insert(initial.clone(), StateID::INITIAL);
    states.insert(
        StateID::INITIAL,
        State {
            id: StateID::INITIAL,
            items: initial,
            edges: Map::default(),
        },
    );
    pending.push_back(StateID::INITIAL);

    let mut partitions = Map::<SymbolID, Vec<Item>>::default();
    while let Some(current) = pending.pop_front() {
        partitions.clear();
        for item in &states[&current].items {
            if let Some(symbol) = item.next_symbol(g) {
                partitions.entry(symbol).or_default().push(item.advance());
            }
        }

        let mut edges = Map::default();
        for (symbol, kernel) in partitions.drain(..) {
            let items = closure(g, kernel);
            let next = match known.get(&items) {
                Some(id) => *id,
                None => {
                    let id = StateID(states.len() as u32);
                    tracing::trace!(
                        "{:?} --({})--> {:?} (new)",
                        current,
                        g.symbol_name(symbol),
                        id
                    );
                    known.insert(items.clone(), id);
                    states.insert(
                        id,
                        State {
                            id,
                            items,
                            edges: Map::default(),
                        },
                    );
                    pending.push_back(id);
                    id
                }
            };
            edges.insert(symbol, next);
        }
        states[&current].edges = edges;
    }

    tracing::debug!("LR(0) automaton has {} states", states.len());
    Automaton { states }
}
