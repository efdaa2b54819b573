//! # CFBASIC
//!
//! A line-numbered BASIC interpreter in the Commodore tradition:
//! a 64K memory ceiling, `READY.` prompts, and `?SYNTAX ERROR`.
//!
//! The [`lang`] module holds the lexer and error type, [`mach`] the
//! machine itself (heap ledger, program store, variables, expression
//! evaluator, execution engine), and [`term`] the interactive
//! terminal front end.

pub mod lang;
pub mod mach;
pub mod term;
