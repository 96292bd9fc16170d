//! Calculation of LR(0) ACTION/GOTO tables with conflict detection.

use crate::{
    automaton::{Automaton, StateID},
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    types::Map,
    util::display_fn,
};
use indexmap::map::Entry;
use std::fmt;

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(ProductionID),

    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "S{}", next),
            Self::Reduce(production) => write!(f, "R{}", production),
            Self::Accept => f.write_str("acc"),
        }
    }
}

/// Two different actions proposed for the same state and lookahead symbol.
///
/// The table keeps `first`; `second` is the action that was dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub terminal: TerminalID,
    pub first: Action,
    pub second: Action,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        use Action::*;
        match (self.first, self.second) {
            (Accept, _) | (_, Accept) => ConflictKind::Accept,
            (Shift(..), Shift(..)) => ConflictKind::ShiftShift,
            (Reduce(..), Reduce(..)) => ConflictKind::ReduceReduce,
            (Shift(..), Reduce(..)) | (Reduce(..), Shift(..)) => ConflictKind::ShiftReduce,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(
                f,
                "state {}, symbol '{}': {} vs {} ({})",
                self.state,
                g.terminals[&self.terminal],
                self.first,
                self.second,
                self.kind()
            )
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    ShiftShift,
    /// The accept action competes with another action on the end of input.
    Accept,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
            Self::ShiftShift => f.write_str("shift/shift"),
            Self::Accept => f.write_str("accept"),
        }
    }
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct TableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, TableRow>,
    /// Conflicts found during construction, in discovery order.
    pub conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn generate(g: &Grammar, automaton: &Automaton) -> Self {
        generate(g, automaton)
    }

    pub fn action(&self, state: StateID, terminal: TerminalID) -> Option<Action> {
        self.states.get(&state)?.actions.get(&terminal).copied()
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&symbol).copied()
    }

    /// Return whether the grammar is not LR(0).
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Render the table with a column per terminal (`$` last) and per nonterminal.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let terminals: Vec<TerminalID> = g
                .terminals
                .keys()
                .copied()
                .filter(|&t| t != TerminalID::EOI)
                .chain(Some(TerminalID::EOI))
                .collect();
            let nonterminals: Vec<NonterminalID> = g
                .nonterminals
                .keys()
                .copied()
                .filter(|&n| n != NonterminalID::START)
                .collect();

            let mut rows = vec![];
            let mut header = vec!["STATE".to_owned(), "|".to_owned()];
            header.extend(terminals.iter().map(|t| g.terminals[t].clone()));
            header.push("|".to_owned());
            header.extend(nonterminals.iter().map(|n| g.nonterminals[n].clone()));
            rows.push(header);

            for (id, row) in &self.states {
                let mut cells = vec![id.to_string(), "|".to_owned()];
                cells.extend(terminals.iter().map(|t| match row.actions.get(t) {
                    Some(action) => action.to_string(),
                    None => String::new(),
                }));
                cells.push("|".to_owned());
                cells.extend(nonterminals.iter().map(|n| match row.gotos.get(n) {
                    Some(next) => next.to_string(),
                    None => String::new(),
                }));
                rows.push(cells);
            }

            let mut widths = vec![0; rows[0].len()];
            for cells in &rows {
                for (width, cell) in widths.iter_mut().zip(cells) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            for cells in &rows {
                let mut line = String::new();
                for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
                    if i > 0 {
                        line.push(' ');
                    }
                    line.push_str(&format!("{:<width$}", cell, width = *width));
                }
                writeln!(f, "{}", line.trim_end())?;
            }

            Ok(())
        })
    }
}

/// Derive the ACTION/GOTO tables from the LR(0) automaton.
///
/// A complete item proposes its reduction on every terminal. When two
/// different actions are proposed for the same cell the first one is kept and
/// a [`Conflict`] is recorded.
pub fn generate(g: &Grammar, automaton: &Automaton) -> ParseTable {
    let span = tracing::trace_span!("table");
    let _entered = span.enter();

    let mut states = Map::default();
    let mut conflicts = vec![];
    for (&id, state) in &automaton.states {
        let mut row = TableRow::default();
        let mut propose = |terminal: TerminalID, action: Action| match row.actions.entry(terminal)
        {
            Entry::Vacant(entry) => {
                entry.insert(action);
            }
            Entry::Occupied(entry) if *entry.get() == action => (),
            Entry::Occupied(entry) => {
                let conflict = Conflict {
                    state: id,
                    terminal,
                    first: *entry.get(),
                    second: action,
                };
                tracing::debug!("conflict: {}", conflict.display(g));
                conflicts.push(conflict);
            }
        };

        for item in &state.items {
            match item.next_symbol(g) {
                Some(SymbolID::T(t)) => {
                    let next = state.edges[&SymbolID::T(t)];
                    propose(t, Action::Shift(next));
                }
                Some(SymbolID::N(..)) => (),
                None if item.production == ProductionID::ACCEPT => {
                    propose(TerminalID::EOI, Action::Accept);
                }
                None => {
                    for &t in g.terminals.keys() {
                        propose(t, Action::Reduce(item.production));
                    }
                }
            }
        }

        for (&symbol, &next) in &state.edges {
            if let SymbolID::N(n) = symbol {
                row.gotos.insert(n, next);
            }
        }

        states.insert(id, row);
    }

    tracing::debug!(
        "parse table has {} states and {} conflicts",
        states.len(),
        conflicts.len()
    );
    ParseTable { states, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compute(source: &str) -> (Grammar, ParseTable) {
        let g: Grammar = source.parse().unwrap();
        let automaton = Automaton::build(&g);
        let table = generate(&g, &automaton);
        (g, table)
    }

    fn row(g: &Grammar, table: &ParseTable, state: u32) -> Vec<(String, String)> {
        let row = &table.states[&StateID::from_raw(state)];
        let actions = row
            .actions
            .iter()
            .map(|(t, a)| (g.terminals[t].clone(), a.to_string()));
        let gotos = row
            .gotos
            .iter()
            .map(|(n, s)| (g.nonterminals[n].clone(), s.to_string()));
        actions.chain(gotos).collect()
    }

    fn pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn simple_grammar_has_no_conflicts() {
        let (g, table) = compute("S -> a A\nA -> c A | d");
        assert!(!table.has_conflicts());
        assert_eq!(row(&g, &table, 0), pairs(&[("a", "S2"), ("S", "1")]));
        assert_eq!(row(&g, &table, 1), pairs(&[("$", "acc")]));
        assert_eq!(
            row(&g, &table, 2),
            pairs(&[("c", "S4"), ("d", "S5"), ("A", "3")])
        );
        assert_eq!(
            row(&g, &table, 3),
            pairs(&[("$", "R1"), ("a", "R1"), ("c", "R1"), ("d", "R1")])
        );
        assert_eq!(
            row(&g, &table, 4),
            pairs(&[("c", "S4"), ("d", "S5"), ("A", "6")])
        );
        assert_eq!(
            row(&g, &table, 5),
            pairs(&[("$", "R3"), ("a", "R3"), ("c", "R3"), ("d", "R3")])
        );
        assert_eq!(
            row(&g, &table, 6),
            pairs(&[("$", "R2"), ("a", "R2"), ("c", "R2"), ("d", "R2")])
        );
    }

    #[test]
    fn ambiguous_grammar_has_shift_reduce_conflict() {
        let (g, table) = compute("E -> E + E | id");
        assert!(table.has_conflicts());
        assert_eq!(table.conflicts.len(), 1);

        let conflict = table.conflicts[0];
        assert_eq!(conflict.kind(), ConflictKind::ShiftReduce);
        assert_eq!(conflict.terminal, g.terminal("+").unwrap());
        // first write wins.
        assert_eq!(
            table.action(conflict.state, conflict.terminal),
            Some(conflict.first)
        );
        assert!(matches!(conflict.first, Action::Shift(..)));
        assert!(matches!(conflict.second, Action::Reduce(..)));
        assert_eq!(
            conflict.display(&g).to_string(),
            format!(
                "state {}, symbol '+': {} vs R1 (shift/reduce)",
                conflict.state, conflict.first
            )
        );
    }

    #[test]
    fn reduce_reduce_conflict() {
        let (_g, table) = compute("S -> A | B\nA -> x\nB -> x");
        assert!(table.has_conflicts());
        assert!(table
            .conflicts
            .iter()
            .all(|c| c.kind() == ConflictKind::ReduceReduce));
        // one conflict per terminal: `$` and `x`
        assert_eq!(table.conflicts.len(), 2);
    }

    #[test]
    fn accept_conflicts_with_reduce_on_end_of_input() {
        let (g, table) = compute("S -> A\nA -> S | x");
        assert_eq!(table.conflicts.len(), 1);

        let conflict = table.conflicts[0];
        assert_eq!(conflict.kind(), ConflictKind::Accept);
        assert_eq!(conflict.state, StateID::from_raw(1));
        assert_eq!(conflict.terminal, TerminalID::EOI);
        assert_eq!(conflict.first, Action::Accept);
        assert_eq!(
            table.action(conflict.state, TerminalID::EOI),
            Some(Action::Accept)
        );
        assert_eq!(
            conflict.display(&g).to_string(),
            "state 1, symbol '$': acc vs R2 (accept)"
        );
    }

    #[test]
    fn epsilon_reduction_conflicts_with_shift() {
        let (g, table) = compute("S -> A a\nA -> a | #");
        let a = g.terminal("a").unwrap();
        assert!(table
            .conflicts
            .iter()
            .any(|c| c.state == StateID::INITIAL && c.terminal == a));
    }

    #[test]
    fn reduce_actions_reference_existing_productions() {
        let (g, table) = compute("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id");
        for row in table.states.values() {
            for action in row.actions.values() {
                if let Action::Reduce(p) = action {
                    assert!(g.productions.contains_key(p));
                    assert_ne!(*p, ProductionID::ACCEPT);
                }
            }
        }
    }

    #[test]
    fn table_is_deterministic() {
        let source = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id";
        let (g1, t1) = compute(source);
        let (g2, t2) = compute(source);
        assert_eq!(t1.display(&g1).to_string(), t2.display(&g2).to_string());
        assert_eq!(t1.conflicts, t2.conflicts);
    }

    #[test]
    fn display_table() {
        let (g, table) = compute("S -> a A\nA -> c A | d");
        assert_eq!(
            table.display(&g).to_string(),
            [
                "STATE | a  c  d  $   | S A",
                "0     | S2           | 1",
                "1     |          acc |",
                "2     |    S4 S5     |   3",
                "3     | R1 R1 R1 R1  |",
                "4     |    S4 S5     |   6",
                "5     | R3 R3 R3 R3  |",
                "6     | R2 R2 R2 R2  |",
                "",
            ]
            .join("\n")
        );
    }
}
