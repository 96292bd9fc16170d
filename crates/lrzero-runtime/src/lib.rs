//! Runtime implementation for `lrzero` parse tables.

pub mod definition;
pub mod engine;

pub use crate::{
    definition::{ParseAction, ParserDef},
    engine::{Parse, ParseEngine, ParseError, Rejection, Step, StepAction, Token, Verdict},
};
