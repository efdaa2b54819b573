use cfbasic::lang::Error;
use cfbasic::mach::{Console, Input, Interp, Storage, DEFAULT_LIMIT};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Scripted console: output is captured, input is popped from a queue,
/// and the screen primitives record into maps for inspection.
#[derive(Default)]
pub struct TestConsole {
    pub output: String,
    pub input: VecDeque<String>,
    pub cells: HashMap<(i64, i64), char>,
    pub memory: HashMap<i64, u8>,
    pub background: Option<u8>,
    pub cleared: usize,
}

impl TestConsole {
    pub fn provide(&mut self, line: &str) {
        self.input.push_back(line.to_string());
    }
}

impl Console for TestConsole {
    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn read_line(&mut self, prompt: &str) -> Input {
        self.output.push_str(prompt);
        match self.input.pop_front() {
            Some(line) => Input::Line(line),
            None => Input::Eof,
        }
    }

    fn plot(&mut self, x: i64, y: i64, ch: char) {
        self.cells.insert((x, y), ch);
    }

    fn poke(&mut self, addr: i64, value: u8) {
        self.memory.insert(addr, value);
    }

    fn peek(&mut self, addr: i64) -> u8 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    fn set_background(&mut self, color: u8) {
        self.background = Some(color);
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.cleared += 1;
    }
}

/// In-memory storage shared with the test through an `Rc` so saved
/// programs can be inspected and fixtures pre-seeded.
#[derive(Clone, Default)]
pub struct TestStorage {
    pub files: Rc<RefCell<HashMap<String, Vec<String>>>>,
}

impl Storage for TestStorage {
    fn load(&mut self, name: &str) -> Result<Vec<String>, Error> {
        match self.files.borrow().get(name) {
            Some(lines) => Ok(lines.clone()),
            None => Err(cfbasic::error!(IoError; "FILE NOT FOUND")),
        }
    }

    fn save(&mut self, name: &str, lines: &[String]) -> Result<(), Error> {
        self.files
            .borrow_mut()
            .insert(name.to_string(), lines.to_vec());
        Ok(())
    }
}

pub struct Fixture {
    pub interp: Interp,
    pub console: TestConsole,
    pub breaker: Arc<AtomicBool>,
    pub files: Rc<RefCell<HashMap<String, Vec<String>>>>,
}

pub fn fixture() -> Fixture {
    let breaker = Arc::new(AtomicBool::new(false));
    let storage = TestStorage::default();
    let files = storage.files.clone();
    let interp = Interp::new(DEFAULT_LIMIT, breaker.clone(), Box::new(storage))
        .expect("interp with default limit");
    Fixture {
        interp,
        console: TestConsole::default(),
        breaker,
        files,
    }
}

impl Fixture {
    /// Enter one line and return everything printed, with any error
    /// rendered the way the terminal renders it.
    pub fn enter(&mut self, line: &str) -> String {
        if let Err(error) = self.interp.enter(line, &mut self.console) {
            self.console.output.push_str(&format!("{}\n", error));
        }
        std::mem::take(&mut self.console.output)
    }
}
