use crate::error;
use crate::lang::Error;
use std::cell::Cell;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Per-allocation bookkeeping overhead, charged in addition to the
/// requested size. Stands in for the size tag the machine being
/// emulated kept in front of every allocation.
const OVERHEAD: usize = std::mem::size_of::<usize>();

pub const DEFAULT_LIMIT: usize = 64 * 1024;

#[derive(Debug)]
struct Ledger {
    limit: usize,
    used: Cell<usize>,
}

/// ## Bounded allocation ledger
///
/// Every dynamically sized value in the interpreter (token payloads,
/// program-line buffers, variable slots, string values) holds a
/// `Reservation` against one of these. Reaching the limit is a
/// recoverable interpreter error, never a crash.
#[derive(Debug, Clone)]
pub struct Heap {
    ledger: Rc<Ledger>,
}

impl Default for Heap {
    fn default() -> Heap {
        Heap::new(DEFAULT_LIMIT)
    }
}

impl Heap {
    pub fn new(limit: usize) -> Heap {
        Heap {
            ledger: Rc::new(Ledger {
                limit,
                used: Cell::new(0),
            }),
        }
    }

    pub fn reserve(&self, size: usize) -> Result<Reservation> {
        let total = size + OVERHEAD;
        let used = self.ledger.used.get();
        if used + total > self.ledger.limit {
            return Err(error!(OutOfMemory));
        }
        self.ledger.used.set(used + total);
        Ok(Reservation {
            ledger: self.ledger.clone(),
            size,
        })
    }

    pub fn limit(&self) -> usize {
        self.ledger.limit
    }

    pub fn used(&self) -> usize {
        self.ledger.used.get()
    }

    pub fn free(&self) -> usize {
        self.ledger.limit - self.ledger.used.get()
    }

    /// Memory report for the MEMCHK command and the startup banner.
    pub fn statistics(&self) -> String {
        format!(
            "{} FREE, {} USED, {} ALLOCATED",
            format_size(self.free()),
            format_size(self.used()),
            format_size(self.limit()),
        )
    }
}

/// A charge against the ledger. Dropping it credits the ledger back
/// exactly once; the allocate/release pairing is enforced by ownership.
#[derive(Debug)]
pub struct Reservation {
    ledger: Rc<Ledger>,
    size: usize,
}

impl Reservation {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Release part of the charge.
    pub fn shrink(&mut self, new_size: usize) {
        debug_assert!(new_size <= self.size);
        let released = self.size.saturating_sub(new_size);
        self.ledger.used.set(self.ledger.used.get() - released);
        self.size -= released;
    }

    /// Adjust the charge. On failure the original reservation is
    /// untouched and still owned by the caller.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        let used = self.ledger.used.get();
        if new_size > self.size {
            let growth = new_size - self.size;
            if used + growth > self.ledger.limit {
                return Err(error!(OutOfMemory));
            }
            self.ledger.used.set(used + growth);
        } else {
            self.ledger.used.set(used - (self.size - new_size));
        }
        self.size = new_size;
        Ok(())
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let used = self.ledger.used.get();
        self.ledger.used.set(used - (self.size + OVERHEAD));
    }
}

/// An owned string charged against a `Heap`. Freeing the string frees
/// its ledger charge with it.
#[derive(Debug)]
pub struct HeapStr {
    text: String,
    charge: Reservation,
}

impl HeapStr {
    pub fn copy_of(heap: &Heap, s: &str) -> Result<HeapStr> {
        Ok(HeapStr {
            charge: heap.reserve(s.len())?,
            text: s.to_string(),
        })
    }

    pub fn take(heap: &Heap, s: String) -> Result<HeapStr> {
        Ok(HeapStr {
            charge: heap.reserve(s.len())?,
            text: s,
        })
    }

    pub fn push(&mut self, ch: char) -> Result<()> {
        self.charge.resize(self.text.len() + ch.len_utf8())?;
        self.text.push(ch);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::ops::Deref for HeapStr {
    type Target = str;
    fn deref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for HeapStr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl PartialEq for HeapStr {
    fn eq(&self, other: &HeapStr) -> bool {
        self.text == other.text
    }
}

impl PartialEq<str> for HeapStr {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

fn format_size(size: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", size, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release_balance() {
        let heap = Heap::new(1024);
        let before = heap.used();
        {
            let _a = heap.reserve(100).unwrap();
            let _b = heap.reserve(200).unwrap();
            assert_eq!(heap.used(), before + 100 + 200 + 2 * OVERHEAD);
        }
        assert_eq!(heap.used(), before);
    }

    #[test]
    fn test_limit_is_never_exceeded() {
        let heap = Heap::new(256);
        let _a = heap.reserve(200).unwrap();
        let err = heap.reserve(200).unwrap_err();
        assert_eq!(err.to_string(), "?OUT OF MEMORY ERROR");
        assert!(heap.used() <= heap.limit());
    }

    #[test]
    fn test_failed_resize_leaves_reservation_intact() {
        let heap = Heap::new(256);
        let mut a = heap.reserve(100).unwrap();
        let used = heap.used();
        assert!(a.resize(1000).is_err());
        assert_eq!(a.size(), 100);
        assert_eq!(heap.used(), used);
        a.resize(50).unwrap();
        assert_eq!(heap.used(), used - 50);
    }

    #[test]
    fn test_heap_str_charges_ledger() {
        let heap = Heap::new(256);
        let before = heap.used();
        let s = HeapStr::copy_of(&heap, "HELLO").unwrap();
        assert_eq!(&*s, "HELLO");
        assert_eq!(heap.used(), before + 5 + OVERHEAD);
        drop(s);
        assert_eq!(heap.used(), before);
    }

    #[test]
    fn test_statistics_format() {
        let heap = Heap::new(65536);
        assert_eq!(heap.statistics(), "64.00 KB FREE, 0 B USED, 64.00 KB ALLOCATED");
    }
}
