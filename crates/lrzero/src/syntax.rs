//! Reader for the line-oriented grammar notation.
//!
//! ```text
//! // comment
//! S -> a A
//! A -> c A | d | #
//! ```
//!
//! Each non-blank line declares the alternatives of one nonterminal, separated
//! by `|`. Symbols are separated by whitespace and `#` stands for the empty
//! right-hand side.

use crate::grammar::GrammarError;

/// A line of grammar source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// 1-based line number.
    pub line: usize,
    pub left: String,
    pub alternatives: Vec<Vec<String>>,
}

pub fn parse(source: &str) -> Result<Vec<Declaration>, GrammarError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut declarations = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let (left, right) = line.split_once("->").ok_or_else(|| GrammarError::Syntax {
            line: line_no,
            message: "missing `->'".into(),
        })?;

        let left = left.trim();
        if left.is_empty() {
            return Err(GrammarError::Syntax {
                line: line_no,
                message: "missing left-hand side".into(),
            });
        }
        if left.contains(char::is_whitespace) {
            return Err(GrammarError::Syntax {
                line: line_no,
                message: format!("left-hand side `{}' must be a single symbol", left),
            });
        }

        let alternatives: Vec<Vec<String>> = right
            .split('|')
            .map(|alt| alt.split_whitespace().map(str::to_owned).collect())
            .collect();

        tracing::trace!("line {}: {} -> {:?}", line_no, left, alternatives);
        declarations.push(Declaration {
            line: line_no,
            left: left.to_owned(),
            alternatives,
        });
    }

    Ok(declarations)
}
