//! The implementation of table-driven shift-reduce parser engine.

use crate::definition::{ParseAction, ParserDef};
use std::fmt;

/// A trait for abstracting token symbols.
pub trait Token<TIdx> {
    /// Return the index value corresponding to this token.
    ///
    /// A token that is not a terminal symbol of the grammar returns `None`,
    /// and the engine rejects it since no action can be applied.
    fn to_index(&self) -> Option<TIdx>;
}

/// The instance of parser engine that recognizes a fixed input, one step at a time.
///
/// The end of input is implicitly appended after the last token.
pub struct ParseEngine<'i, TDef, TTok>
where
    TDef: ParserDef,
    TTok: Token<TDef::Terminal>,
{
    definition: TDef,
    input: &'i [TTok],
    cursor: usize,
    states_stack: Vec<TDef::State>,
    status: EngineStatus<TDef::State>,
    steps_taken: usize,
    step_limit: Option<usize>,
}

impl<TDef, TTok> fmt::Debug for ParseEngine<'_, TDef, TTok>
where
    TDef: ParserDef + fmt::Debug,
    TDef::State: fmt::Debug,
    TTok: Token<TDef::Terminal> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseEngine")
            .field("definition", &self.definition)
            .field("input", &self.input)
            .field("cursor", &self.cursor)
            .field("states_stack", &self.states_stack)
            .field("status", &self.status)
            .field("steps_taken", &self.steps_taken)
            .field("step_limit", &self.step_limit)
            .finish()
    }
}

#[derive(Debug, Copy, Clone)]
enum EngineStatus<TState> {
    Running,
    Accepted,
    Rejected(Rejection<TState>),
    Failed,
}

enum Lookahead<T> {
    Terminal(T),
    Unknown,
    EOI,
}

impl<'i, TDef, TTok> ParseEngine<'i, TDef, TTok>
where
    TDef: ParserDef,
    TTok: Token<TDef::Terminal>,
{
    /// Create a parser engine using the specified parser definition.
    pub fn new(definition: TDef, input: &'i [TTok]) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            input,
            cursor: 0,
            states_stack: vec![initial_state],
            status: EngineStatus::Running,
            steps_taken: 0,
            step_limit: None,
        }
    }

    /// Fail with [`ParseError::StepLimit`] instead of taking more than `limit` steps.
    ///
    /// A table with unresolved conflicts may reduce epsilon productions forever.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Return the current contents of the state stack, oldest first.
    pub fn stack(&self) -> &[TDef::State] {
        &self.states_stack[..]
    }

    /// Return the position of the next token to be read.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.status, EngineStatus::Running)
    }

    /// Perform a single shift/reduce step and return its trace record.
    ///
    /// Returns `Ok(None)` once the input has been accepted or rejected.
    #[allow(clippy::type_complexity)]
    pub fn step(
        &mut self,
    ) -> Result<
        Option<Step<TDef::State, TDef::Production>>,
        ParseError<TDef::State, TDef::Nonterminal>,
    > {
        if self.is_finished() {
            return Ok(None);
        }
        if let Some(limit) = self.step_limit {
            if self.steps_taken >= limit {
                self.status = EngineStatus::Failed;
                return Err(ParseError::StepLimit { limit });
            }
        }
        self.steps_taken += 1;

        let current = self.current_state();
        let lookahead = match self.input.get(self.cursor) {
            Some(token) => match token.to_index() {
                Some(index) => Lookahead::Terminal(index),
                None => Lookahead::Unknown,
            },
            None => Lookahead::EOI,
        };
        let action = match lookahead {
            Lookahead::Terminal(t) => self.definition.action(current, Some(t)),
            Lookahead::EOI => self.definition.action(current, None),
            Lookahead::Unknown => None,
        };

        let stack = self.states_stack.clone();
        let cursor = self.cursor;

        let action = match action {
            Some(ParseAction::Shift(next)) => {
                self.states_stack.push(next);
                self.cursor += 1;
                StepAction::Shift(next)
            }

            Some(ParseAction::Reduce(production)) => {
                let (left, len) = self.definition.reduction(production);
                let depth = self.states_stack.len();
                if len >= depth {
                    self.status = EngineStatus::Failed;
                    return Err(ParseError::StackUnderflow {
                        state: current,
                        len,
                        depth,
                    });
                }
                self.states_stack.truncate(depth - len);

                let top = self.current_state();
                let next = match self.definition.goto(top, left) {
                    Some(next) => next,
                    None => {
                        self.status = EngineStatus::Failed;
                        return Err(ParseError::MissingGoto {
                            state: top,
                            symbol: left,
                        });
                    }
                };
                self.states_stack.push(next);
                StepAction::Reduce(production)
            }

            Some(ParseAction::Accept) => {
                self.status = EngineStatus::Accepted;
                StepAction::Accept
            }

            None => {
                self.status = EngineStatus::Rejected(Rejection {
                    state: current,
                    position: cursor,
                });
                StepAction::Reject
            }
        };

        Ok(Some(Step {
            stack,
            cursor,
            action,
        }))
    }

    /// Drive the engine until the input is accepted or rejected.
    #[allow(clippy::type_complexity)]
    pub fn run(
        mut self,
    ) -> Result<Parse<TDef::State, TDef::Production>, ParseError<TDef::State, TDef::Nonterminal>>
    {
        let mut steps = vec![];
        while let Some(step) = self.step()? {
            steps.push(step);
        }

        let verdict = match self.status {
            EngineStatus::Accepted => Verdict::Accepted,
            EngineStatus::Rejected(rejection) => Verdict::Rejected(rejection),
            EngineStatus::Running | EngineStatus::Failed => {
                unreachable!("the engine stopped without a verdict")
            }
        };

        Ok(Parse { steps, verdict })
    }

    fn current_state(&self) -> TDef::State {
        match self.states_stack.last() {
            Some(state) => *state,
            None => unreachable!("the initial state is never popped"),
        }
    }
}

/// A trace record of a single parser step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<TState, TProduction> {
    /// The state stack before the step, oldest first.
    pub stack: Vec<TState>,
    /// The position of the remaining input before the step.
    pub cursor: usize,
    /// The action taken by the step.
    pub action: StepAction<TState, TProduction>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepAction<TState, TProduction> {
    Shift(TState),
    Reduce(TProduction),
    Accept,
    /// No action is defined for the lookahead symbol.
    Reject,
}

/// The location where the engine gave up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rejection<TState> {
    /// The state on top of the stack.
    pub state: TState,
    /// The position of the offending token.
    ///
    /// It equals to the length of input if the end of input was unexpected.
    pub position: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict<TState> {
    Accepted,
    Rejected(Rejection<TState>),
}

impl<TState> Verdict<TState> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// The trace and the verdict of a completed parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse<TState, TProduction> {
    pub steps: Vec<Step<TState, TProduction>>,
    pub verdict: Verdict<TState>,
}

/// Internal inconsistencies between the parse table and the automaton.
#[derive(Debug, thiserror::Error)]
pub enum ParseError<TState, TNonterminal> {
    #[error("no goto entry for {symbol:?} in state {state:?}")]
    MissingGoto { state: TState, symbol: TNonterminal },

    #[error("cannot pop {len} states from a stack of depth {depth} in state {state:?}")]
    StackUnderflow {
        state: TState,
        len: usize,
        depth: usize,
    },

    #[error("the parse did not finish within {limit} steps")]
    StepLimit { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Copy, Clone, PartialEq)]
    enum N {
        S,
        A,
    }

    // S -> a A ; A -> c A | d
    #[derive(Debug)]
    struct Simple;

    impl ParserDef for Simple {
        type State = u8;
        type Terminal = char;
        type Nonterminal = N;
        type Production = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, lookahead: Option<char>) -> Option<ParseAction<u8, u8>> {
            use ParseAction::*;
            match (current, lookahead) {
                (0, Some('a')) => Some(Shift(2)),
                (1, None) => Some(Accept),
                (2 | 4, Some('c')) => Some(Shift(4)),
                (2 | 4, Some('d')) => Some(Shift(5)),
                (3, _) => Some(Reduce(1)),
                (5, _) => Some(Reduce(3)),
                (6, _) => Some(Reduce(2)),
                _ => None,
            }
        }

        fn goto(&self, current: u8, symbol: N) -> Option<u8> {
            match (current, symbol) {
                (0, N::S) => Some(1),
                (2, N::A) => Some(3),
                (4, N::A) => Some(6),
                _ => None,
            }
        }

        fn reduction(&self, production: u8) -> (N, usize) {
            match production {
                1 => (N::S, 2),
                2 => (N::A, 2),
                3 => (N::A, 1),
                _ => panic!("unknown production {}", production),
            }
        }
    }

    /// Same table as `Simple` but every goto entry is missing.
    struct NoGotos;

    impl ParserDef for NoGotos {
        type State = u8;
        type Terminal = char;
        type Nonterminal = N;
        type Production = u8;

        fn initial_state(&self) -> u8 {
            Simple.initial_state()
        }
        fn action(&self, current: u8, lookahead: Option<char>) -> Option<ParseAction<u8, u8>> {
            Simple.action(current, lookahead)
        }
        fn goto(&self, _: u8, _: N) -> Option<u8> {
            None
        }
        fn reduction(&self, production: u8) -> (N, usize) {
            Simple.reduction(production)
        }
    }

    impl Token<char> for char {
        fn to_index(&self) -> Option<char> {
            matches!(self, 'a' | 'c' | 'd').then_some(*self)
        }
    }

    fn tokens(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn accepts_acd() {
        let input = tokens("acd");
        let parse = ParseEngine::new(Simple, &input).run().unwrap();
        assert_eq!(parse.verdict, Verdict::Accepted);

        let trace: Vec<_> = parse
            .steps
            .iter()
            .map(|step| (step.stack.clone(), step.cursor, step.action))
            .collect();
        assert_eq!(
            trace,
            vec![
                (vec![0], 0, StepAction::Shift(2)),
                (vec![0, 2], 1, StepAction::Shift(4)),
                (vec![0, 2, 4], 2, StepAction::Shift(5)),
                (vec![0, 2, 4, 5], 3, StepAction::Reduce(3)),
                (vec![0, 2, 4, 6], 3, StepAction::Reduce(2)),
                (vec![0, 2, 3], 3, StepAction::Reduce(1)),
                (vec![0, 1], 3, StepAction::Accept),
            ]
        );
    }

    #[test]
    fn accepted_stack_holds_start_goto() {
        let input = tokens("ad");
        let mut engine = ParseEngine::new(Simple, &input);
        while engine.step().unwrap().is_some() {}
        assert!(engine.is_finished());
        assert_eq!(engine.stack(), &[0, 1]);
        assert_eq!(engine.cursor(), 2);
    }

    #[test]
    fn rejects_unexpected_eoi() {
        let input = tokens("a");
        let parse = ParseEngine::new(Simple, &input).run().unwrap();
        assert_eq!(
            parse.verdict,
            Verdict::Rejected(Rejection {
                state: 2,
                position: 1
            })
        );
        assert_eq!(parse.steps.last().map(|s| s.action), Some(StepAction::Reject));
    }

    #[test]
    fn rejects_unknown_token() {
        let input = tokens("ax");
        let parse = ParseEngine::new(Simple, &input).run().unwrap();
        assert_eq!(
            parse.verdict,
            Verdict::Rejected(Rejection {
                state: 2,
                position: 1
            })
        );
        assert_eq!(parse.steps.len(), 2);
    }

    #[test]
    fn step_after_verdict_is_none() {
        let input = tokens("d");
        let mut engine = ParseEngine::new(Simple, &input);
        let step = engine.step().unwrap().unwrap();
        assert_eq!(step.action, StepAction::Reject);
        assert!(engine.step().unwrap().is_none());
        assert!(engine.step().unwrap().is_none());
    }

    #[test]
    fn missing_goto_is_an_error() {
        let input = tokens("ad");
        let err = ParseEngine::new(NoGotos, &input).run().unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingGoto {
                state: 2,
                symbol: N::A
            }
        ));
    }

    #[test]
    fn step_limit_stops_the_engine() {
        let input = tokens("acd");
        let mut engine = ParseEngine::new(Simple, &input).with_step_limit(3);
        for _ in 0..3 {
            assert!(engine.step().unwrap().is_some());
        }
        assert!(matches!(engine.step(), Err(ParseError::StepLimit { limit: 3 })));
        assert!(engine.is_finished());

        // seven steps are enough for the whole input.
        let parse = ParseEngine::new(Simple, &input)
            .with_step_limit(7)
            .run()
            .unwrap();
        assert!(parse.verdict.is_accepted());
    }

    #[test]
    fn definition_by_reference() {
        let input = tokens("acccd");
        let parse = ParseEngine::new(&Simple, &input).run().unwrap();
        assert!(parse.verdict.is_accepted());
    }
}
