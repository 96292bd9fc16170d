//! Parser definition.

/// The trait for abstracting the generated LR(0) parse table.
pub trait ParserDef {
    /// The number to identify the state of LR(0) automaton.
    type State: Copy;

    /// The number to identify the terminal symbols.
    type Terminal: Copy;

    /// The number to identify the nonterminal symbols.
    type Nonterminal: Copy;

    /// The number to identify the production rules.
    type Production: Copy;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// If there is no lookahead symbol, a `None` is passsed as the end of input.
    /// A `None` result means that the lookahead symbol is rejected in this state.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> Option<ParseAction<Self::State, Self::Production>>;

    /// Return the state to transition to after reducing to `symbol` in `current`.
    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State>;

    /// Return the left-hand side of the production and the number of symbols
    /// in its right-hand side.
    fn reduction(&self, production: Self::Production) -> (Self::Nonterminal, usize);
}

impl<T: ?Sized> ParserDef for &T
where
    T: ParserDef,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Production = T::Production;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> Option<ParseAction<Self::State, Self::Production>> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }

    fn reduction(&self, production: Self::Production) -> (Self::Nonterminal, usize) {
        (**self).reduction(production)
    }
}

impl<T: ?Sized> ParserDef for std::sync::Arc<T>
where
    T: ParserDef,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Production = T::Production;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Terminal>,
    ) -> Option<ParseAction<Self::State, Self::Production>> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }

    fn reduction(&self, production: Self::Production) -> (Self::Nonterminal, usize) {
        (**self).reduction(production)
    }
}

/// The action that the LR automaton performs in a state on a lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParseAction<TState, TProduction> {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Reduce to the specified production rule.
    Reduce(TProduction),

    Accept,
}
