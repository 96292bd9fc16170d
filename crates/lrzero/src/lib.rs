//! An LR(0) parser generator.

pub mod automaton;
pub mod closure;
pub mod driver;
pub mod grammar;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;

use crate::{automaton::Automaton, grammar::Grammar, table::ParseTable};

/// Build the LR(0) automaton of the grammar and derive its parse table.
pub fn compute(g: &Grammar) -> (Automaton, ParseTable) {
    let automaton = Automaton::build(g);
    let table = ParseTable::generate(g, &automaton);
    if table.has_conflicts() {
        tracing::warn!(
            "the grammar is not LR(0): {} conflict(s)",
            table.conflicts.len()
        );
    }
    (automaton, table)
}
