use super::LineNumber;

pub struct Error {
    code: ErrorCode,
    line_number: LineNumber,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ErrorCode {
    Lexical,
    Syntax,
    TypeMismatch,
    UndefinedStatement,
    ReturnWithoutGosub,
    NextWithoutFor,
    WhileWithoutWend,
    WendWithoutWhile,
    UntilWithoutRepeat,
    DivisionByZero,
    IllegalQuantity,
    SubscriptOutOfRange,
    OutOfMemory,
    IoError,
    Break,
}

impl ErrorCode {
    fn text(self) -> &'static str {
        use ErrorCode::*;
        match self {
            Lexical => "LEXICAL",
            Syntax => "SYNTAX",
            TypeMismatch => "TYPE MISMATCH",
            UndefinedStatement => "UNDEFINED STATEMENT",
            ReturnWithoutGosub => "RETURN WITHOUT GOSUB",
            NextWithoutFor => "NEXT WITHOUT FOR",
            WhileWithoutWend => "WHILE WITHOUT WEND",
            WendWithoutWhile => "WEND WITHOUT WHILE",
            UntilWithoutRepeat => "UNTIL WITHOUT REPEAT",
            DivisionByZero => "DIVISION BY ZERO",
            IllegalQuantity => "ILLEGAL QUANTITY",
            SubscriptOutOfRange => "SUBSCRIPT OUT OF RANGE",
            OutOfMemory => "OUT OF MEMORY",
            IoError => "I/O",
            Break => "BREAK",
        }
    }
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            message: "",
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn is_break(&self) -> bool {
        self.code == ErrorCode::Break
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    pub fn in_line_number(self, line: LineNumber) -> Error {
        debug_assert!(self.line_number.is_none());
        Error {
            line_number: line,
            ..self
        }
    }

    /// Attach a line number unless one is already recorded.
    pub fn located(self, line: LineNumber) -> Error {
        if self.line_number.is_some() {
            self
        } else {
            Error {
                line_number: line,
                ..self
            }
        }
    }

    pub fn message(self, message: &'static str) -> Error {
        debug_assert!(self.message.is_empty());
        Error { message, ..self }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = if self.message.is_empty() {
            self.code.text()
        } else {
            self.message
        };
        if self.code == ErrorCode::Break {
            write!(f, "?{}", text)?;
        } else {
            write!(f, "?{} ERROR", text)?;
        }
        if let Some(line_number) = self.line_number {
            write!(f, " IN {}", line_number)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = error!(Syntax);
        assert_eq!(e.to_string(), "?SYNTAX ERROR");
        let e = error!(UndefinedStatement, Some(20));
        assert_eq!(e.to_string(), "?UNDEFINED STATEMENT ERROR IN 20");
        let e = error!(Syntax; "FILENAME REQUIRED");
        assert_eq!(e.to_string(), "?FILENAME REQUIRED ERROR");
    }

    #[test]
    fn test_break_has_no_error_suffix() {
        let e = error!(Break);
        assert_eq!(e.to_string(), "?BREAK");
        let e = error!(Break, Some(10));
        assert_eq!(e.to_string(), "?BREAK IN 10");
    }

    #[test]
    fn test_located_keeps_first_line() {
        let e = error!(TypeMismatch, Some(30)).located(Some(40));
        assert_eq!(e.to_string(), "?TYPE MISMATCH ERROR IN 30");
    }
}
