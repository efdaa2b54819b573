use super::HeapStr;
use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// An evaluated value. Strings are shared so that copying a value in
/// and out of the variable table never re-charges the heap.
#[derive(Debug, Clone)]
pub enum Val {
    Number(f64),
    String(Rc<HeapStr>),
}

impl Val {
    pub fn number(self) -> Result<f64> {
        match self {
            Val::Number(n) => Ok(n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn string(self) -> Result<Rc<HeapStr>> {
        match self {
            Val::String(s) => Ok(s),
            Val::Number(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Val::String(_))
    }

    /// GOTO/GOSUB/THEN targets must be whole non-negative numbers that
    /// fit a line number.
    pub fn line_number(self) -> Result<u16> {
        let n = self.number()?;
        if n < 0.0 || n > f64::from(u16::max_value()) || n.fract() != 0.0 {
            return Err(error!(Syntax; "INVALID LINE NUMBER"));
        }
        Ok(n as u16)
    }

    /// A subscript or other small whole quantity, truncated the way
    /// classic BASIC truncates.
    pub fn index(self) -> Result<i64> {
        Ok(self.number()?.trunc() as i64)
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::Number(n) => write!(f, "{}", format_number(*n)),
            Val::String(s) => write!(f, "{}", s),
        }
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::Number(a), Val::Number(b)) => a == b,
            (Val::String(a), Val::String(b)) => **a == **b,
            _ => false,
        }
    }
}

/// Textual form of a number, whole values without a decimal point.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_line_number_conversion() {
        assert_eq!(Val::Number(100.0).line_number().unwrap(), 100);
        assert!(Val::Number(-1.0).line_number().is_err());
        assert!(Val::Number(10.5).line_number().is_err());
        assert!(Val::Number(70000.0).line_number().is_err());
    }
}
