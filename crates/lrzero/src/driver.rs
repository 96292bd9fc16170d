//! Recognition of input strings with a generated parse table.

use crate::{
    automaton::StateID,
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID, EOI_NAME},
    table::{Action, ParseTable},
    util::display_fn,
};
use lrzero_runtime::{ParseAction, ParseEngine, ParserDef, Step, StepAction, Token, Verdict};
use std::fmt;

pub type ParseError = lrzero_runtime::ParseError<StateID, NonterminalID>;

/// The parser definition backed by a [`ParseTable`].
#[derive(Debug, Copy, Clone)]
pub struct TableDef<'t> {
    grammar: &'t Grammar,
    table: &'t ParseTable,
}

impl<'t> TableDef<'t> {
    pub fn new(grammar: &'t Grammar, table: &'t ParseTable) -> Self {
        Self { grammar, table }
    }
}

impl ParserDef for TableDef<'_> {
    type State = StateID;
    type Terminal = TerminalID;
    type Nonterminal = NonterminalID;
    type Production = ProductionID;

    fn initial_state(&self) -> StateID {
        StateID::INITIAL
    }

    fn action(
        &self,
        current: StateID,
        lookahead: Option<TerminalID>,
    ) -> Option<ParseAction<StateID, ProductionID>> {
        let action = self
            .table
            .action(current, lookahead.unwrap_or(TerminalID::EOI))?;
        Some(match action {
            Action::Shift(next) => ParseAction::Shift(next),
            Action::Reduce(production) => ParseAction::Reduce(production),
            Action::Accept => ParseAction::Accept,
        })
    }

    fn goto(&self, current: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.table.goto(current, symbol)
    }

    fn reduction(&self, production: ProductionID) -> (NonterminalID, usize) {
        let production = self.grammar.production(production);
        (production.left, production.right.len())
    }
}

/// A symbol of the input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSymbol {
    pub name: String,
    /// `None` if the symbol is not a terminal of the grammar.
    pub terminal: Option<TerminalID>,
}

impl Token<TerminalID> for InputSymbol {
    fn to_index(&self) -> Option<TerminalID> {
        self.terminal
    }
}

/// The outcome of [`parse`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub input: Vec<InputSymbol>,
    pub steps: Vec<Step<StateID, ProductionID>>,
    pub verdict: Verdict<StateID>,
}

impl ParseResult {
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Render the trace as stack / input / action columns, followed by the verdict.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let mut rows = vec![[
                "STACK".to_owned(),
                "INPUT".to_owned(),
                "ACTION".to_owned(),
            ]];
            for step in &self.steps {
                let stack = step
                    .stack
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                let input = self.input[step.cursor.min(self.input.len())..]
                    .iter()
                    .map(|symbol| symbol.name.as_str())
                    .chain(Some(EOI_NAME))
                    .collect::<Vec<_>>()
                    .join(" ");
                let action = match step.action {
                    StepAction::Shift(next) => Action::Shift(next).to_string(),
                    StepAction::Reduce(p) => {
                        format!("{} ({})", Action::Reduce(p), g.production(p).display(g))
                    }
                    StepAction::Accept => Action::Accept.to_string(),
                    StepAction::Reject => "error".to_owned(),
                };
                rows.push([stack, input, action]);
            }

            let mut widths = [0; 2];
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }
            for [stack, input, action] in &rows {
                writeln!(
                    f,
                    "{:<w0$}  {:<w1$}  {}",
                    stack,
                    input,
                    action,
                    w0 = widths[0],
                    w1 = widths[1]
                )?;
            }

            match &self.verdict {
                Verdict::Accepted => writeln!(f, "Accept"),
                Verdict::Rejected(rejection) => {
                    let symbol = match self.input.get(rejection.position) {
                        Some(symbol) => symbol.name.as_str(),
                        None => EOI_NAME,
                    };
                    writeln!(
                        f,
                        "Error: no action in state {} on '{}' at position {}",
                        rejection.state, symbol, rejection.position
                    )
                }
            }
        })
    }
}

/// Run the shift-reduce parser over `input`, with the end of input appended.
///
/// A rejected input is reported through [`ParseResult::verdict`]; an `Err` means
/// that the table is inconsistent with the grammar.
pub fn parse<I>(g: &Grammar, table: &ParseTable, input: I) -> Result<ParseResult, ParseError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    parse_with_limit(g, table, input, None)
}

/// Same as [`parse`], but gives up with [`ParseError::StepLimit`] after `limit` steps.
pub fn parse_with_limit<I>(
    g: &Grammar,
    table: &ParseTable,
    input: I,
    limit: Option<usize>,
) -> Result<ParseResult, ParseError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let input: Vec<InputSymbol> = input
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            InputSymbol {
                name: name.to_owned(),
                // the end of input is implicit and never matched by a token.
                terminal: g.terminal(name).filter(|&t| t != TerminalID::EOI),
            }
        })
        .collect();

    let mut engine = ParseEngine::new(TableDef::new(g, table), &input[..]);
    if let Some(limit) = limit {
        engine = engine.with_step_limit(limit);
    }
    let lrzero_runtime::Parse { steps, verdict } = engine.run()?;
    tracing::debug!("parsed in {} steps: {:?}", steps.len(), verdict);

    Ok(ParseResult {
        input,
        steps,
        verdict,
    })
}
