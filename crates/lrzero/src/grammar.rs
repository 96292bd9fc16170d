//! Grammar types.

use crate::{types::Map, util::display_fn};
use std::{fmt, fs, io, path::Path, str::FromStr};

/// The reserved name of the end-of-input terminal.
pub const EOI_NAME: &str = "$";

/// The reserved symbol that denotes an empty right-hand side.
pub const EPSILON: &str = "#";

/// The marker of the recognition progress in the text form of an item.
pub const ITEM_DOT: &str = ".";

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// The synthetic start symbol of the augmented grammar.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

/// The index of a production rule, assigned in declaration order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID(u16);
impl ProductionID {
    /// The production `S' -> S` of the augmented grammar.
    pub const ACCEPT: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}
impl fmt::Display for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The type that represents a production rule in grammar.
///
/// An epsilon production has an empty right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
}
impl Production {
    /// `"LHS -> R1 R2 R3"`, or `"LHS -> #"` for an epsilon production.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} -> ", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                f.write_str(EPSILON)
            } else {
                crate::util::write_symbols(f, g, &self.right)
            }
        })
    }
}

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, String>,
    pub nonterminals: Map<NonterminalID, String>,
    pub productions: Map<ProductionID, Production>,
    /// The first declared nonterminal, i.e. the right-hand side of `S' -> S`.
    pub start_symbol: NonterminalID,
    symbols: Map<String, SymbolID>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (&id, nonterminal) in &self.nonterminals {
            write!(f, "{}", nonterminal)?;
            if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for (id, production) in &self.productions {
            writeln!(f, "{}: {}", id, production.display(self))?;
        }

        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = GrammarError;

    /// Read a grammar written in the `LHS -> alt1 | alt2` notation.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let declarations = crate::syntax::parse(source)?;
        Grammar::define(|def| {
            for decl in &declarations {
                for alternative in &decl.alternatives {
                    def.rule(&decl.left, alternative)
                        .map_err(|err| GrammarError::AtLine {
                            line: decl.line,
                            source: Box::new(err),
                        })?;
                }
            }
            Ok(())
        })
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        source.parse()
    }

    /// Define a grammar using the specified function.
    ///
    /// The first nonterminal passed to [`GrammarDef::rule`] becomes the start symbol.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef { rules: vec![] };
        f(&mut def)?;
        def.end()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    /// Iterate over the productions whose left-hand side is `n`, in declaration order.
    pub fn productions_of(
        &self,
        n: NonterminalID,
    ) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions
            .iter()
            .filter(move |(_, p)| p.left == n)
            .map(|(id, p)| (*id, p))
    }

    /// Look up the production with the specified left- and right-hand sides.
    pub fn find_production(&self, left: NonterminalID, right: &[SymbolID]) -> Option<ProductionID> {
        self.productions
            .iter()
            .find(|(_, p)| p.left == left && p.right == right)
            .map(|(id, _)| *id)
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolID> {
        self.symbols.get(name).copied()
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalID> {
        match self.symbol(name)? {
            SymbolID::T(t) => Some(t),
            SymbolID::N(..) => None,
        }
    }

    pub fn nonterminal(&self, name: &str) -> Option<NonterminalID> {
        match self.symbol(name)? {
            SymbolID::N(n) => Some(n),
            SymbolID::T(..) => None,
        }
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t],
            SymbolID::N(n) => &self.nonterminals[&n],
        }
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    rules: Vec<(String, Vec<String>)>,
}

impl GrammarDef {
    /// Specify a production rule into this grammer.
    ///
    /// An epsilon production is written as the single symbol `#`.
    pub fn rule<I>(&mut self, left: &str, right: I) -> Result<(), GrammarError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if matches!(left, EOI_NAME | EPSILON | ITEM_DOT) {
            return Err(GrammarError::ReservedSymbol { name: left.into() });
        }

        let mut right: Vec<String> = right.into_iter().map(|s| s.as_ref().to_owned()).collect();
        if right.is_empty() {
            return Err(GrammarError::EmptyProduction { left: left.into() });
        }
        if right.iter().any(|s| s == EPSILON) {
            if right.len() > 1 {
                return Err(GrammarError::MisplacedEpsilon { left: left.into() });
            }
            right.clear();
        }
        if let Some(name) = right.iter().find(|s| *s == EOI_NAME || *s == ITEM_DOT) {
            return Err(GrammarError::ReservedSymbol { name: name.clone() });
        }
        if self.rules.iter().any(|(l, r)| l == left && *r == right) {
            return Err(GrammarError::DuplicateProduction {
                production: format!("{} -> {}", left, display_right(&right)),
            });
        }

        self.rules.push((left.to_owned(), right));
        Ok(())
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        let start_name = match self.rules.first() {
            Some((left, _)) => left.clone(),
            None => return Err(GrammarError::NoProductions),
        };
        let accept_name = format!("{}'", start_name);

        let mut symbols = Map::<String, SymbolID>::default();
        let mut nonterminals = Map::default();
        nonterminals.insert(NonterminalID::START, accept_name.clone());
        for (left, _) in &self.rules {
            if symbols.contains_key(left) {
                continue;
            }
            let id = NonterminalID(next_raw(nonterminals.len(), NonterminalID::OFFSET)?);
            nonterminals.insert(id, left.clone());
            symbols.insert(left.clone(), SymbolID::N(id));
        }

        let mut terminals = Map::default();
        terminals.insert(TerminalID::EOI, EOI_NAME.to_owned());
        symbols.insert(EOI_NAME.to_owned(), SymbolID::T(TerminalID::EOI));
        for name in self.rules.iter().flat_map(|(_, right)| right) {
            if symbols.contains_key(name) {
                continue;
            }
            let id = TerminalID(next_raw(terminals.len(), TerminalID::OFFSET)?);
            terminals.insert(id, name.clone());
            symbols.insert(name.clone(), SymbolID::T(id));
        }

        if symbols.contains_key(&accept_name) {
            return Err(GrammarError::ReservedSymbol { name: accept_name });
        }
        symbols.insert(accept_name, SymbolID::N(NonterminalID::START));

        let start_symbol = match symbols[&start_name] {
            SymbolID::N(n) => n,
            SymbolID::T(..) => unreachable!("left-hand sides are always nonterminals"),
        };

        let mut productions = Map::default();
        productions.insert(
            ProductionID::ACCEPT,
            Production {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start_symbol)],
            },
        );
        for (left, right) in &self.rules {
            let production = Production {
                left: match symbols[left] {
                    SymbolID::N(n) => n,
                    SymbolID::T(..) => unreachable!("left-hand sides are always nonterminals"),
                },
                right: right.iter().map(|name| symbols[name]).collect(),
            };
            let id = ProductionID(next_raw(productions.len(), ProductionID::OFFSET)?);
            productions.insert(id, production);
        }

        let grammar = Grammar {
            terminals,
            nonterminals,
            productions,
            start_symbol,
            symbols,
        };
        tracing::debug!(
            "defined grammar: {} terminals, {} nonterminals, {} productions",
            grammar.terminals.len(),
            grammar.nonterminals.len(),
            grammar.productions.len()
        );
        Ok(grammar)
    }
}

/// Return the raw id for the entry appended to a map with `len` entries.
///
/// Ids are dense, so the reserved ids (`$`, `S'`, `S' -> S`) occupy the first slots.
fn next_raw(len: usize, offset: u16) -> Result<u16, GrammarError> {
    debug_assert!(len >= usize::from(offset));
    u16::try_from(len).map_err(|_| GrammarError::TooManySymbols)
}

fn display_right(right: &[String]) -> String {
    if right.is_empty() {
        EPSILON.to_owned()
    } else {
        right.join(" ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<GrammarError>,
    },

    #[error("the production of `{left}' has no symbols on its right-hand side")]
    EmptyProduction { left: String },

    #[error("`#' must be the only symbol in an epsilon production of `{left}'")]
    MisplacedEpsilon { left: String },

    #[error("no production rules are declared")]
    NoProductions,

    #[error("the symbol `{name}' is reserved")]
    ReservedSymbol { name: String },

    #[error("duplicate production rule detected: {production}")]
    DuplicateProduction { production: String },

    #[error("too many symbols or production rules")]
    TooManySymbols,
}
