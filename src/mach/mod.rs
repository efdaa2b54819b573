/*!
The machine: bounded heap, program store, variable memory, expression
evaluator, built-in functions, and the execution engine. The terminal
and persistence collaborators are reached only through the `Console`
and `Storage` traits defined here.
*/

mod expr;
mod function;
mod heap;
mod interp;
mod program;
mod val;
mod var;

pub use expr::{evaluate, evaluate_list, Scope};
pub use function::Function;
pub use heap::{Heap, HeapStr, Reservation, DEFAULT_LIMIT};
pub use interp::{Entered, Interp, HELP_TEXT};
pub use program::Program;
pub use val::{format_number, Val};
pub use var::Vars;

use crate::lang::Error;

/// Emulated text screen geometry. Console implementations render this
/// grid; the engine clamps DRAW endpoints to it.
pub const SCREEN_COLS: i64 = 40;
pub const SCREEN_ROWS: i64 = 25;

/// Result of a line read from the console.
#[derive(Debug, PartialEq)]
pub enum Input {
    Line(String),
    Break,
    Eof,
}

/// The terminal collaborator: output sink, input source, and the
/// character-grid screen primitives POKE/PLOT/DRAW and PEEK reach.
pub trait Console {
    fn print(&mut self, text: &str);
    /// Line-buffered read; output written before this call must be
    /// visible before the read blocks.
    fn read_line(&mut self, prompt: &str) -> Input;
    /// Write one character cell. Out-of-bounds coordinates are
    /// silently ignored.
    fn plot(&mut self, x: i64, y: i64, ch: char);
    /// Write one byte of the text screen. Out-of-range addresses are
    /// silently ignored.
    fn poke(&mut self, addr: i64, value: u8);
    /// Read one byte of the text screen; zero when out of range.
    fn peek(&mut self, addr: i64) -> u8;
    /// Background color from the fixed 16-color palette.
    fn set_background(&mut self, color: u8);
    fn clear(&mut self);
}

/// Program text persistence.
pub trait Storage {
    fn load(&mut self, name: &str) -> Result<Vec<String>, Error>;
    fn save(&mut self, name: &str, lines: &[String]) -> Result<(), Error>;
}
