/*!
Lexical analysis of the BASIC language: tokens, the on-demand line
lexer, and the interpreter's error type.
*/

#[macro_use]
mod error;
mod lex;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::leading_line_number;
pub use lex::Lexer;
pub use token::{Operator, Token, Word};

/// Line numbers are `None` for immediate-mode statements.
pub type LineNumber = Option<u16>;
