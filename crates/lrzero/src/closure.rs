//! LR(0) items and the closure of item sets.

use crate::{
    grammar::{Grammar, ProductionID, SymbolID, ITEM_DOT},
    types::Set,
    util::display_fn,
};
use std::{collections::VecDeque, fmt};

/// The LR(0) item, i.e. a production with a dot marking recognition progress.
///
/// The production is referenced by its index, so that a complete item can be
/// reduced without searching the production table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub dot: u16,
}

impl Item {
    pub const fn new(production: ProductionID, dot: u16) -> Self {
        Self { production, dot }
    }

    /// `S' -> . S`
    pub const fn start() -> Self {
        Self::new(ProductionID::ACCEPT, 0)
    }

    /// Return the symbol immediately after the dot, or `None` for a complete item.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right
            .get(usize::from(self.dot))
            .copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.dot) == g.production(self.production).right.len()
    }

    /// Return the item with the dot moved over the next symbol.
    pub fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }

    /// `"A -> c . A"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.nonterminals[&production.left])?;
            for (i, symbol) in production.right.iter().enumerate() {
                if i == usize::from(self.dot) {
                    write!(f, " {}", ITEM_DOT)?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.is_complete(g) {
                write!(f, " {}", ITEM_DOT)?;
            }
            Ok(())
        })
    }

    /// Read an item written in the format of [`Item::display`].
    pub fn parse(g: &Grammar, text: &str) -> Result<Self, ItemParseError> {
        let mut tokens = text.split_whitespace();
        let left = tokens.next().ok_or(ItemParseError::MissingArrow)?;
        if tokens.next() != Some("->") {
            return Err(ItemParseError::MissingArrow);
        }
        let left = g
            .nonterminal(left)
            .ok_or_else(|| ItemParseError::UnknownSymbol(left.to_owned()))?;

        let mut dot = None;
        let mut right = vec![];
        for token in tokens {
            if token == ITEM_DOT {
                if dot.is_some() {
                    return Err(ItemParseError::Dot);
                }
                dot = Some(right.len());
                continue;
            }
            let symbol = g
                .symbol(token)
                .ok_or_else(|| ItemParseError::UnknownSymbol(token.to_owned()))?;
            right.push(symbol);
        }
        let dot = dot.ok_or(ItemParseError::Dot)?;

        let production = g
            .find_production(left, &right)
            .ok_or_else(|| ItemParseError::NoSuchProduction(text.trim().to_owned()))?;
        Ok(Self::new(production, dot as u16))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ItemParseError {
    #[error("expected `LHS -> ...'")]
    MissingArrow,

    #[error("unknown symbol `{}'", _0)]
    UnknownSymbol(String),

    #[error("an item must contain exactly one dot")]
    Dot,

    #[error("no production matches the item `{}'", _0)]
    NoSuchProduction(String),
}

/// A set of LR(0) items.
///
/// Items are kept sorted, so two sets with the same items compare (and hash)
/// equal regardless of the order they were built in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.binary_search(item).is_ok()
    }

    pub fn is_subset(&self, other: &ItemSet) -> bool {
        self.items.iter().all(|item| other.contains(item))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for item in &self.items {
                writeln!(f, "{}", item.display(g))?;
            }
            Ok(())
        })
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Item>,
    {
        let mut items: Vec<Item> = iter.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Calculate the closure of the specified items.
///
/// For every item `A -> α . B β` in the set, the items `B -> . γ` of all
/// productions of `B` are added until no new item appears.
pub fn closure<I>(g: &Grammar, items: I) -> ItemSet
where
    I: IntoIterator<Item = Item>,
{
    let mut closed = Set::<Item>::default();
    let mut pending = VecDeque::new();
    for item in items {
        if closed.insert(item) {
            pending.push_back(item);
        }
    }

    while let Some(item) = pending.pop_front() {
        if let Some(SymbolID::N(n)) = item.next_symbol(g) {
            for (id, _) in g.productions_of(n) {
                let new_item = Item::new(id, 0);
                // only the newly inserted items are expanded further.
                if closed.insert(new_item) {
                    pending.push_back(new_item);
                }
            }
        }
    }

    closed.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarError;
    use pretty_assertions::assert_eq;

    fn expr() -> Grammar {
        Grammar::define(|g| {
            g.rule("E", ["E", "+", "T"])?;
            g.rule("E", ["T"])?;
            g.rule("T", ["T", "*", "F"])?;
            g.rule("T", ["F"])?;
            g.rule("F", ["(", "E", ")"])?;
            g.rule("F", ["id"])?;
            Ok(())
        })
        .unwrap()
    }

    fn items(g: &Grammar, set: &ItemSet) -> Vec<String> {
        set.iter().map(|item| item.display(g).to_string()).collect()
    }

    #[test]
    fn closure_of_start_item_with_left_recursion() {
        let g = expr();
        let set = closure(&g, [Item::start()]);
        assert_eq!(
            items(&g, &set),
            [
                "E' -> . E",
                "E -> . E + T",
                "E -> . T",
                "T -> . T * F",
                "T -> . F",
                "F -> . ( E )",
                "F -> . id",
            ]
        );
    }

    #[test]
    fn closure_is_monotone_and_idempotent() {
        let g = expr();
        let seeds = [
            vec![Item::start()],
            vec![Item::new(ProductionID::ACCEPT, 1)],
            vec![Item::parse(&g, "F -> ( . E )").unwrap()],
            vec![
                Item::parse(&g, "E -> E + . T").unwrap(),
                Item::parse(&g, "T -> T * . F").unwrap(),
            ],
            vec![],
        ];
        for seed in seeds {
            let seed_set: ItemSet = seed.iter().copied().collect();
            let once = closure(&g, seed.iter().copied());
            assert!(seed_set.is_subset(&once));

            let twice = closure(&g, once.iter().copied());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn closure_without_nonterminal_after_dot() {
        let g = expr();
        let item = Item::parse(&g, "F -> id .").unwrap();
        let set = closure(&g, [item]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&item));
    }

    #[test]
    fn epsilon_items_are_complete() {
        let g = Grammar::define(|g| {
            g.rule("S", ["A", "b"])?;
            g.rule("A", ["#"])?;
            Ok(())
        })
        .unwrap();
        let set = closure(&g, [Item::start()]);
        assert_eq!(items(&g, &set), ["S' -> . S", "S -> . A b", "A -> ."]);

        let epsilon = Item::parse(&g, "A -> .").unwrap();
        assert!(epsilon.is_complete(&g));
        assert_eq!(epsilon.next_symbol(&g), None);
    }

    #[test]
    fn item_set_equality_ignores_order() {
        let a = Item::new(ProductionID::ACCEPT, 0);
        let b = Item::new(ProductionID::ACCEPT, 1);
        let s1: ItemSet = [a, b, a].into_iter().collect();
        let s2: ItemSet = [b, a].into_iter().collect();
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 2);
    }

    #[test]
    fn item_text_round_trip() {
        let g = expr();
        let set = closure(&g, [Item::parse(&g, "T -> T * . F").unwrap()]);
        let text = set.display(&g).to_string();
        let parsed: ItemSet = text
            .lines()
            .map(|line| Item::parse(&g, line).unwrap())
            .collect();
        assert_eq!(parsed, set);
    }

    #[test]
    fn dot_is_not_a_grammar_symbol() {
        let err = "S -> a . b".parse::<Grammar>().unwrap_err();
        assert!(matches!(
            err,
            GrammarError::AtLine { ref source, .. }
                if matches!(&**source, GrammarError::ReservedSymbol { name } if name == ".")
        ));

        // every item of a grammar with punctuation reads back from its text.
        let g: Grammar = "S -> a , b ; | S : S".parse().unwrap();
        for (&id, production) in &g.productions {
            for dot in 0..=production.right.len() {
                let item = Item::new(id, dot as u16);
                let text = item.display(&g).to_string();
                assert_eq!(Item::parse(&g, &text).unwrap(), item, "{}", text);
            }
        }
    }

    #[test]
    fn malformed_items() {
        let g = expr();
        assert!(matches!(
            Item::parse(&g, "E . E + T"),
            Err(ItemParseError::MissingArrow)
        ));
        assert!(matches!(
            Item::parse(&g, "E -> E + T"),
            Err(ItemParseError::Dot)
        ));
        assert!(matches!(
            Item::parse(&g, "E -> . E . + T"),
            Err(ItemParseError::Dot)
        ));
        assert!(matches!(
            Item::parse(&g, "E -> . x"),
            Err(ItemParseError::UnknownSymbol(name)) if name == "x"
        ));
        assert!(matches!(
            Item::parse(&g, "E -> . id"),
            Err(ItemParseError::NoSuchProduction(..))
        ));
    }
}
