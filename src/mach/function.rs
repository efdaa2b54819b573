use super::{format_number, Console, Heap, HeapStr, Val};
use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions
///
/// Pure functions over already-evaluated arguments. Each arm validates
/// its own arity and argument kinds so the error can name the
/// offending function.
pub struct Function;

impl Function {
    pub fn is_function(name: &str) -> bool {
        matches!(
            name,
            "ABS" | "INT" | "SQR" | "SIN" | "COS" | "TAN" | "RND" | "PEEK" | "LEN" | "LEFT$"
                | "RIGHT$" | "MID$" | "STR$" | "VAL" | "CHR$" | "ASC"
        )
    }

    pub fn call(
        name: &str,
        args: Vec<Val>,
        heap: &Heap,
        console: &mut dyn Console,
    ) -> Result<Val> {
        use Val::*;
        match name {
            "ABS" => match args.as_slice() {
                [Number(n)] => Ok(Number(n.abs())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO ABS")),
            },
            "INT" => match args.as_slice() {
                [Number(n)] => Ok(Number(n.floor())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO INT")),
            },
            "SQR" => match args.as_slice() {
                [Number(n)] if *n >= 0.0 => Ok(Number(n.sqrt())),
                [Number(_)] => Err(error!(IllegalQuantity; "ILLEGAL QUANTITY IN SQR")),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO SQR")),
            },
            "SIN" => match args.as_slice() {
                [Number(n)] => Ok(Number(n.sin())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO SIN")),
            },
            "COS" => match args.as_slice() {
                [Number(n)] => Ok(Number(n.cos())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO COS")),
            },
            "TAN" => match args.as_slice() {
                [Number(n)] => Ok(Number(n.tan())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO TAN")),
            },
            "RND" => match args.as_slice() {
                // RND(1) is tolerated for compatibility; the argument
                // is ignored.
                [] | [Number(_)] => Ok(Number(rand::random::<f64>())),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO RND")),
            },
            "PEEK" => match args.as_slice() {
                [Number(n)] => Ok(Number(f64::from(console.peek(n.trunc() as i64)))),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO PEEK")),
            },
            "LEN" => match args.as_slice() {
                [String(s)] => Ok(Number(s.chars().count() as f64)),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO LEN")),
            },
            "LEFT$" => match args.as_slice() {
                [String(s), Number(count)] => {
                    let count = check_count(*count, "ILLEGAL QUANTITY IN LEFT$")?;
                    let text: std::string::String = s.chars().take(count).collect();
                    string_val(heap, text)
                }
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO LEFT$")),
            },
            "RIGHT$" => match args.as_slice() {
                [String(s), Number(count)] => {
                    let count = check_count(*count, "ILLEGAL QUANTITY IN RIGHT$")?;
                    let len = s.chars().count();
                    let text: std::string::String =
                        s.chars().skip(len.saturating_sub(count)).collect();
                    string_val(heap, text)
                }
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO RIGHT$")),
            },
            "MID$" => match args.as_slice() {
                [String(s), Number(start)] => {
                    mid(heap, s, *start, f64::from(u16::max_value()))
                }
                [String(s), Number(start), Number(len)] => mid(heap, s, *start, *len),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO MID$")),
            },
            "STR$" => match args.as_slice() {
                [Number(n)] => string_val(heap, format_number(*n)),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO STR$")),
            },
            "VAL" => match args.as_slice() {
                [String(s)] => Ok(Number(numeric_prefix(s))),
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO VAL")),
            },
            "CHR$" => match args.as_slice() {
                [Number(n)] => {
                    let code = n.trunc();
                    if !(0.0..=255.0).contains(&code) {
                        return Err(error!(IllegalQuantity; "ILLEGAL QUANTITY IN CHR$"));
                    }
                    string_val(heap, char::from(code as u8).to_string())
                }
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO CHR$")),
            },
            "ASC" => match args.as_slice() {
                [String(s)] => match s.chars().next() {
                    Some(ch) => Ok(Number(f64::from(u32::from(ch)))),
                    None => Err(error!(IllegalQuantity; "ILLEGAL QUANTITY IN ASC")),
                },
                _ => Err(error!(TypeMismatch; "BAD ARGUMENT TO ASC")),
            },
            _ => Err(error!(Syntax; "UNDEFINED FUNCTION")),
        }
    }
}

fn string_val(heap: &Heap, text: String) -> Result<Val> {
    Ok(Val::String(Rc::new(HeapStr::take(heap, text)?)))
}

fn check_count(count: f64, message: &'static str) -> Result<usize> {
    let count = count.trunc();
    if count < 0.0 {
        return Err(error!(IllegalQuantity; message));
    }
    Ok(count as usize)
}

/// MID$ start is 1-based; a start past the end yields the empty string.
fn mid(heap: &Heap, s: &Rc<HeapStr>, start: f64, len: f64) -> Result<Val> {
    let start = start.trunc();
    if start < 1.0 {
        return Err(error!(IllegalQuantity; "ILLEGAL QUANTITY IN MID$"));
    }
    let len = check_count(len, "ILLEGAL QUANTITY IN MID$")?;
    let text: String = s.chars().skip(start as usize - 1).take(len).collect();
    string_val(heap, text)
}

/// VAL parses the longest leading numeric prefix, zero if there is
/// none.
fn numeric_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits {
            end = exp;
        }
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("42ABC"), 42.0);
        assert_eq!(numeric_prefix("  -1.5"), -1.5);
        assert_eq!(numeric_prefix("1E2X"), 100.0);
        assert_eq!(numeric_prefix("ABC"), 0.0);
        assert_eq!(numeric_prefix(""), 0.0);
    }
}
