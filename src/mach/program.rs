use super::{Heap, HeapStr};
use crate::lang::Error;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Stored program
///
/// Line-number-indexed source text. The map keeps lines in ascending
/// order no matter what order they were entered, which is the order
/// LIST and RUN observe.
#[derive(Debug, Default)]
pub struct Program {
    lines: BTreeMap<u16, Rc<HeapStr>>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    /// Insert or replace a line. An empty body deletes the line.
    pub fn store(&mut self, heap: &Heap, number: u16, text: &str) -> Result<()> {
        if text.is_empty() {
            self.lines.remove(&number);
            return Ok(());
        }
        let line = Rc::new(HeapStr::copy_of(heap, text)?);
        self.lines.insert(number, line);
        Ok(())
    }

    pub fn get(&self, number: u16) -> Option<Rc<HeapStr>> {
        self.lines.get(&number).cloned()
    }

    pub fn first(&self) -> Option<(u16, Rc<HeapStr>)> {
        self.lines
            .iter()
            .next()
            .map(|(n, text)| (*n, text.clone()))
    }

    /// The next stored line strictly after `number`, for fall-through.
    pub fn next_after(&self, number: u16) -> Option<(u16, Rc<HeapStr>)> {
        self.lines
            .range((Excluded(number), Unbounded))
            .next()
            .map(|(n, text)| (*n, text.clone()))
    }

    /// Ascending traversal of `start..=end`; `end` of `None` is
    /// open-ended.
    pub fn range(
        &self,
        start: u16,
        end: Option<u16>,
    ) -> impl Iterator<Item = (u16, &Rc<HeapStr>)> {
        let end = end.unwrap_or(u16::max_value());
        let range = if start > end {
            // An inverted range lists nothing.
            self.lines.range(..0)
        } else {
            self.lines.range(start..=end)
        };
        range.map(|(n, text)| (*n, text))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Rc<HeapStr>)> {
        self.lines.iter().map(|(n, text)| (*n, text))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
