use crate::mach::HeapStr;

/// One lexed token. Tokens own their text payload; dropping a token
/// releases the payload's charge against the heap that produced it.
#[derive(Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(HeapStr),
    Ident(HeapStr),
    Word(Word),
    Operator(Operator),
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    End,
}

impl Token {
    /// Keyword lookup, case-insensitive by construction: the lexer
    /// upcases identifiers before asking.
    pub fn from_name(s: &str) -> Option<Token> {
        use Operator::*;
        use Word::*;
        let word = match s {
            "LIST" => List,
            "RUN" => Run,
            "NEW" => New,
            "LOAD" => Load,
            "SAVE" => Save,
            "EXIT" => Exit,
            "HELP" => Help,
            "CLR" => Clr,
            "MEMCHK" => Memchk,
            "PRINT" => Print,
            "INPUT" => Input,
            "LET" => Let,
            "GOTO" => Goto,
            "GOSUB" => Gosub,
            "RETURN" => Return,
            "IF" => If,
            "THEN" => Then,
            "ELSE" => Else,
            "END" => End,
            "FOR" => For,
            "TO" => To,
            "STEP" => Step,
            "NEXT" => Next,
            "WHILE" => While,
            "WEND" => Wend,
            "REPEAT" => Repeat,
            "UNTIL" => Until,
            "DO" => Do,
            "LOOP" => Loop,
            "REM" => Rem,
            "POKE" => Poke,
            "PLOT" => Plot,
            "DRAW" => Draw,
            "AND" => return Some(Token::Operator(And)),
            "OR" => return Some(Token::Operator(Or)),
            "NOT" => return Some(Token::Operator(Not)),
            _ => return None,
        };
        Some(Token::Word(word))
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Number(n) => write!(f, "{}", n),
            Str(s) => write!(f, "\"{}\"", s),
            Ident(s) => write!(f, "{}", s),
            Word(w) => write!(f, "{}", w),
            Operator(op) => write!(f, "{}", op),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
            End => write!(f, ""),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Word {
    List,
    Run,
    New,
    Load,
    Save,
    Exit,
    Help,
    Clr,
    Memchk,
    Print,
    Input,
    Let,
    Goto,
    Gosub,
    Return,
    If,
    Then,
    Else,
    End,
    For,
    To,
    Step,
    Next,
    While,
    Wend,
    Repeat,
    Until,
    Do,
    Loop,
    Rem,
    Poke,
    Plot,
    Draw,
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        let s = match self {
            List => "LIST",
            Run => "RUN",
            New => "NEW",
            Load => "LOAD",
            Save => "SAVE",
            Exit => "EXIT",
            Help => "HELP",
            Clr => "CLR",
            Memchk => "MEMCHK",
            Print => "PRINT",
            Input => "INPUT",
            Let => "LET",
            Goto => "GOTO",
            Gosub => "GOSUB",
            Return => "RETURN",
            If => "IF",
            Then => "THEN",
            Else => "ELSE",
            End => "END",
            For => "FOR",
            To => "TO",
            Step => "STEP",
            Next => "NEXT",
            While => "WHILE",
            Wend => "WEND",
            Repeat => "REPEAT",
            Until => "UNTIL",
            Do => "DO",
            Loop => "LOOP",
            Rem => "REM",
            Poke => "POKE",
            Plot => "PLOT",
            Draw => "DRAW",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Caret,
    Multiply,
    Divide,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        let s = match self {
            Caret => "^",
            Multiply => "*",
            Divide => "/",
            Plus => "+",
            Minus => "-",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "NOT",
            And => "AND",
            Or => "OR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Token::from_name("REM"), Some(Token::Word(Word::Rem)));
        assert_eq!(Token::from_name("AND"), Some(Token::Operator(Operator::And)));
        assert_eq!(Token::from_name("PICKLES"), None);
    }
}
