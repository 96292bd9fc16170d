use crate::grammar::{Grammar, SymbolID};
use std::fmt;

pub fn display_fn(f: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result) -> impl fmt::Display {
    DisplayFn(f)
}

struct DisplayFn<F>(F);
impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(formatter)
    }
}

/// Write the names of `symbols` separated by single spaces.
pub(crate) fn write_symbols(
    f: &mut fmt::Formatter<'_>,
    g: &Grammar,
    symbols: &[SymbolID],
) -> fmt::Result {
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        f.write_str(g.symbol_name(*symbol))?;
    }
    Ok(())
}
