/*!
Interactive terminal front end: the line reader, the emulated text
screen behind POKE/PEEK/PLOT/DRAW, and file-backed program storage.
*/

use crate::error;
use crate::lang::Error;
use crate::mach::{Console, Entered, Input, Interp, Storage, SCREEN_COLS, SCREEN_ROWS};
use ansi_term::Style;
use linefeed::{DefaultTerminal, Interface, ReadResult, Signal};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The screen memory is mapped at the traditional base address.
const SCREEN_BASE: i64 = 1024;
const SCREEN_SIZE: i64 = SCREEN_COLS * SCREEN_ROWS;

pub fn main(memory_limit: usize, filename: Option<&str>) -> i32 {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .is_err()
    {
        eprintln!("unable to install interrupt handler");
        return 1;
    }
    match session(memory_limit, filename, interrupted) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error);
            1
        }
    }
}

fn session(
    memory_limit: usize,
    filename: Option<&str>,
    interrupted: Arc<AtomicBool>,
) -> std::io::Result<i32> {
    let mut interp = match Interp::new(memory_limit, interrupted.clone(), Box::new(FsStorage)) {
        Ok(interp) => interp,
        Err(error) => {
            eprintln!("{}", error);
            return Ok(1);
        }
    };
    let command = Interface::new("cfbasic")?;
    command.set_report_signal(Signal::Interrupt, true);
    let input = Interface::new("input")?;
    input.set_report_signal(Signal::Interrupt, true);
    let mut console = TermConsole {
        command: &command,
        input: &input,
        interrupted: interrupted.clone(),
        screen: Screen::new(),
    };

    if let Some(filename) = filename {
        let result = interp.load(filename).and_then(|_| interp.run(&mut console));
        return Ok(match result {
            Ok(()) => 0,
            Err(error) => {
                report(&command, &error)?;
                1
            }
        });
    }

    command.write_fmt(format_args!("{}", banner(&interp.heap().statistics())))?;
    while !interp.exit_requested() {
        let line = match command.read_line()? {
            ReadResult::Input(line) => line,
            ReadResult::Signal(Signal::Interrupt) => {
                interrupted.store(false, Ordering::SeqCst);
                command.write_fmt(format_args!("?BREAK\nREADY.\n"))?;
                continue;
            }
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        match interp.enter(&line, &mut console) {
            Ok(Entered::Stored) => {}
            Ok(Entered::Performed) => {
                if !interp.exit_requested() {
                    command.write_fmt(format_args!("READY.\n"))?;
                }
            }
            Err(error) => {
                report(&command, &error)?;
                command.write_fmt(format_args!("READY.\n"))?;
            }
        }
        command.add_history_unique(line);
    }
    Ok(0)
}

fn report(command: &Interface<DefaultTerminal>, error: &Error) -> std::io::Result<()> {
    command.write_fmt(format_args!(
        "{}\n",
        Style::new().bold().paint(error.to_string())
    ))
}

fn banner(statistics: &str) -> String {
    let line1 = format!("**** CFBASIC V{} ****", VERSION);
    let line2 = "A MICROSOFT BASIC INTERPRETER FOR MODERN SYSTEMS";
    format!(
        "{}{}\n{}{}\n\n {}\n\nREADY.\n",
        " ".repeat(centering(&line1)),
        line1,
        " ".repeat(centering(line2)),
        line2,
        statistics,
    )
}

fn centering(line: &str) -> usize {
    (80usize.saturating_sub(line.len())) / 2
}

/// The memory-mapped character screen. POKE stores raw screen codes
/// so PEEK reads back exactly what was written; the display gets the
/// ASCII rendering.
struct Screen {
    codes: Vec<u8>,
}

impl Screen {
    fn new() -> Screen {
        Screen {
            codes: vec![32; SCREEN_SIZE as usize],
        }
    }

    fn clear(&mut self) {
        for code in &mut self.codes {
            *code = 32;
        }
    }
}

/// Screen code to displayable ASCII.
fn screen_char(code: u8) -> char {
    match code {
        1..=31 => char::from(code + 64),
        32..=63 => char::from(code),
        64..=95 => char::from(code + 32),
        96..=127 => char::from(code),
        _ => '?',
    }
}

struct TermConsole<'a> {
    command: &'a Interface<DefaultTerminal>,
    input: &'a Interface<DefaultTerminal>,
    interrupted: Arc<AtomicBool>,
    screen: Screen,
}

impl<'a> TermConsole<'a> {
    /// Paint one cell in place: save the cursor, address the cell,
    /// write, restore.
    fn paint(&self, x: i64, y: i64, ch: char) {
        let _ = self.command.write_fmt(format_args!(
            "\x1b7\x1b[{};{}H{}\x1b8",
            y + 1,
            x + 1,
            ch
        ));
    }
}

impl<'a> Console for TermConsole<'a> {
    fn print(&mut self, text: &str) {
        let _ = self.command.write_fmt(format_args!("{}", text));
    }

    fn read_line(&mut self, prompt: &str) -> Input {
        if self.input.set_prompt(prompt).is_err() {
            return Input::Eof;
        }
        match self.input.read_line() {
            Ok(ReadResult::Input(line)) => {
                self.input.add_history_unique(line.clone());
                Input::Line(line)
            }
            Ok(ReadResult::Signal(Signal::Interrupt)) => {
                self.interrupted.store(false, Ordering::SeqCst);
                let _ = self.input.lock_reader().cancel_read_line();
                Input::Break
            }
            Ok(ReadResult::Signal(_)) | Ok(ReadResult::Eof) | Err(_) => Input::Eof,
        }
    }

    fn plot(&mut self, x: i64, y: i64, ch: char) {
        if x < 0 || x >= SCREEN_COLS || y < 0 || y >= SCREEN_ROWS {
            return;
        }
        let code = if ch.is_ascii() && !ch.is_ascii_control() {
            ch as u8
        } else {
            b'?'
        };
        self.screen.codes[(y * SCREEN_COLS + x) as usize] = code;
        self.paint(x, y, screen_char(code));
    }

    fn poke(&mut self, addr: i64, value: u8) {
        let offset = addr - SCREEN_BASE;
        if offset < 0 || offset >= SCREEN_SIZE {
            return;
        }
        self.screen.codes[offset as usize] = value;
        self.paint(
            offset % SCREEN_COLS,
            offset / SCREEN_COLS,
            screen_char(value),
        );
    }

    fn peek(&mut self, addr: i64) -> u8 {
        let offset = addr - SCREEN_BASE;
        if offset < 0 || offset >= SCREEN_SIZE {
            return 0;
        }
        self.screen.codes[offset as usize]
    }

    fn set_background(&mut self, color: u8) {
        let code = match color & 15 {
            c @ 0..=7 => 40 + u16::from(c),
            c => 100 + u16::from(c - 8),
        };
        let _ = self.command.write_fmt(format_args!("\x1b[{}m", code));
    }

    fn clear(&mut self) {
        self.screen.clear();
        let _ = self.command.write_fmt(format_args!("\x1b[2J\x1b[H"));
    }
}

/// Program persistence on the local filesystem.
pub struct FsStorage;

impl Storage for FsStorage {
    fn load(&mut self, name: &str) -> Result<Vec<String>, Error> {
        let file = match File::open(name) {
            Ok(file) => file,
            Err(error) => {
                return Err(match error.kind() {
                    ErrorKind::NotFound => error!(IoError; "FILE NOT FOUND"),
                    _ => error!(IoError; "CANNOT OPEN FILE"),
                })
            }
        };
        let mut lines = vec![];
        for line in BufReader::new(file).lines() {
            match line {
                Ok(line) => lines.push(line),
                Err(_) => return Err(error!(IoError; "CANNOT READ FILE")),
            }
        }
        Ok(lines)
    }

    fn save(&mut self, name: &str, lines: &[String]) -> Result<(), Error> {
        let mut file = match File::create(name) {
            Ok(file) => file,
            Err(_) => return Err(error!(IoError; "CANNOT CREATE FILE")),
        };
        for line in lines {
            if writeln!(file, "{}", line).is_err() {
                return Err(error!(IoError; "CANNOT WRITE FILE"));
            }
        }
        Ok(())
    }
}
