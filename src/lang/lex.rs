use super::token::{Operator, Token, Word};
use crate::error;
use crate::lang::Error;
use crate::mach::{Heap, HeapStr};

type Result<T> = std::result::Result<T, Error>;

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Split a stored-program entry into its line number and body.
/// Returns `None` when the line does not begin with a number, in which
/// case it is an immediate command.
pub fn leading_line_number(s: &str) -> Option<(u16, &str)> {
    let mut pos = 0;
    let bytes = s.as_bytes();
    while pos < bytes.len() && is_basic_whitespace(bytes[pos] as char) {
        pos += 1;
    }
    let start = pos;
    while pos < bytes.len() && (bytes[pos] as char).is_ascii_digit() {
        pos += 1;
    }
    if pos == start {
        return None;
    }
    let number = s[start..pos].parse::<u16>().ok()?;
    while pos < bytes.len() && is_basic_whitespace(bytes[pos] as char) {
        pos += 1;
    }
    Some((number, &s[pos..]))
}

/// On-demand token stream over one line of source text.
///
/// The stream is restartable at any byte offset a previous lexer
/// reported, which is how the execution engine resumes loop bodies and
/// GOSUB return points mid-line.
pub struct Lexer<'a> {
    heap: &'a Heap,
    src: &'a str,
    pos: usize,
    peeked: Option<Token>,
    peek_start: usize,
    remark: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(heap: &'a Heap, src: &'a str) -> Lexer<'a> {
        Lexer::from_offset(heap, src, 0)
    }

    pub fn from_offset(heap: &'a Heap, src: &'a str, offset: usize) -> Lexer<'a> {
        Lexer {
            heap,
            src,
            pos: offset,
            peeked: None,
            peek_start: offset,
            remark: false,
        }
    }

    /// Byte offset of the next unconsumed token. Recording this and
    /// later constructing a lexer `from_offset` resumes the stream.
    pub fn offset(&self) -> usize {
        if self.peeked.is_some() {
            self.peek_start
        } else {
            self.pos
        }
    }

    pub fn peek(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            self.skip_whitespace();
            self.peek_start = self.pos;
            let token = self.scan()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().expect("just peeked"))
    }

    pub fn next(&mut self) -> Result<Token> {
        self.peek()?;
        Ok(self.peeked.take().expect("just peeked"))
    }

    pub fn expect(&mut self, token: Token) -> Result<()> {
        if *self.peek()? == token {
            self.next()?;
            return Ok(());
        }
        Err(error!(Syntax; match token {
            Token::Word(Word::Then) => "EXPECTED THEN",
            Token::Word(Word::To) => "EXPECTED TO",
            Token::Word(_) => "EXPECTED RESERVED WORD",
            Token::Operator(Operator::Equal) => "EXPECTED EQUALS SIGN",
            Token::Operator(_) => "EXPECTED OPERATOR",
            Token::LParen => "EXPECTED LEFT PARENTHESIS",
            Token::RParen => "EXPECTED RIGHT PARENTHESIS",
            Token::Comma => "EXPECTED COMMA",
            Token::Colon => "EXPECTED COLON",
            Token::Semicolon => "EXPECTED SEMICOLON",
            _ => "UNEXPECTED TOKEN",
        }))
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !is_basic_whitespace(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn scan(&mut self) -> Result<Token> {
        if self.remark {
            self.pos = self.src.len();
            return Ok(Token::End);
        }
        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::End),
        };
        if ch.is_ascii_digit() || ch == '.' {
            return self.number();
        }
        if ch.is_ascii_alphabetic() {
            return self.alphabetic();
        }
        if ch == '"' {
            return self.string();
        }
        self.minutia()
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut decimal = false;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.bump();
            } else if ch == '.' && !decimal {
                decimal = true;
                self.bump();
            } else {
                break;
            }
        }
        // Exponent only when digits follow, so `10E` remains a number
        // and a variable.
        if let Some('e') | Some('E') = self.peek_char() {
            let mark = self.pos;
            self.bump();
            if let Some('+') | Some('-') = self.peek_char() {
                self.bump();
            }
            let mut digits = false;
            while let Some(ch) = self.peek_char() {
                if !ch.is_ascii_digit() {
                    break;
                }
                digits = true;
                self.bump();
            }
            if !digits {
                self.pos = mark;
            }
        }
        match self.src[start..self.pos].parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            _ => Err(error!(Lexical; "MALFORMED NUMBER")),
        }
    }

    fn alphabetic(&mut self) -> Result<Token> {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() {
                name.push(ch.to_ascii_uppercase());
                self.bump();
            } else {
                break;
            }
        }
        if let Some('$') = self.peek_char() {
            name.push('$');
            self.bump();
        }
        if let Some(token) = Token::from_name(&name) {
            if token == Token::Word(Word::Rem) {
                self.remark = true;
            }
            return Ok(token);
        }
        Ok(Token::Ident(HeapStr::take(self.heap, name)?))
    }

    fn string(&mut self) -> Result<Token> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(HeapStr::take(self.heap, text)?)),
                Some(ch) => text.push(ch),
                None => return Err(error!(Lexical; "UNTERMINATED STRING")),
            }
        }
    }

    fn minutia(&mut self) -> Result<Token> {
        use Operator::*;
        let ch = self.bump().expect("scan checked for a character");
        let token = match ch {
            '^' => Token::Operator(Caret),
            '*' => Token::Operator(Multiply),
            '/' => Token::Operator(Divide),
            '+' => Token::Operator(Plus),
            '-' => Token::Operator(Minus),
            '=' => Token::Operator(Equal),
            '<' => match self.peek_char() {
                Some('=') => {
                    self.bump();
                    Token::Operator(LessEqual)
                }
                Some('>') => {
                    self.bump();
                    Token::Operator(NotEqual)
                }
                _ => Token::Operator(Less),
            },
            '>' => match self.peek_char() {
                Some('=') => {
                    self.bump();
                    Token::Operator(GreaterEqual)
                }
                _ => Token::Operator(Greater),
            },
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '?' => Token::Word(Word::Print),
            _ => return Err(error!(Lexical; "UNEXPECTED CHARACTER")),
        };
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        let heap = Heap::default();
        let mut lexer = Lexer::new(&heap, s);
        let mut v = vec![];
        loop {
            let t = lexer.next().unwrap();
            if t == Token::End {
                return v;
            }
            v.push(t);
        }
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            tokens("print PRINT pRiNt"),
            vec![
                Token::Word(Word::Print),
                Token::Word(Word::Print),
                Token::Word(Word::Print),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("1 2.5 .5 1e3 1.5E-2"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(1000.0),
                Token::Number(0.015),
            ]
        );
    }

    #[test]
    fn test_string_ident_gets_suffix() {
        let heap = Heap::default();
        let mut lexer = Lexer::new(&heap, "a$ = \"HI\"");
        match lexer.next().unwrap() {
            Token::Ident(name) => assert_eq!(&*name, "A$"),
            t => panic!("unexpected token {:?}", t),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let heap = Heap::default();
        let mut lexer = Lexer::new(&heap, "print \"oops");
        assert_eq!(lexer.next().unwrap(), Token::Word(Word::Print));
        let err = lexer.next().unwrap_err();
        assert_eq!(err.to_string(), "?UNTERMINATED STRING ERROR");
    }

    #[test]
    fn test_rem_consumes_rest_of_line() {
        assert_eq!(
            tokens("rem this : is ; not \" lexed"),
            vec![Token::Word(Word::Rem)]
        );
    }

    #[test]
    fn test_question_mark_is_print() {
        assert_eq!(
            tokens("? 1"),
            vec![Token::Word(Word::Print), Token::Number(1.0)]
        );
    }

    #[test]
    fn test_relational_operators() {
        assert_eq!(
            tokens("<= >= <> < > ="),
            vec![
                Token::Operator(Operator::LessEqual),
                Token::Operator(Operator::GreaterEqual),
                Token::Operator(Operator::NotEqual),
                Token::Operator(Operator::Less),
                Token::Operator(Operator::Greater),
                Token::Operator(Operator::Equal),
            ]
        );
    }

    #[test]
    fn test_leading_line_number() {
        assert_eq!(leading_line_number("10 PRINT"), Some((10, "PRINT")));
        assert_eq!(leading_line_number("  20"), Some((20, "")));
        assert_eq!(leading_line_number("PRINT 10"), None);
        assert_eq!(leading_line_number("99999 X"), None);
    }

    #[test]
    fn test_offset_resume() {
        let heap = Heap::default();
        let src = "A = 1 : B = 2";
        let mut lexer = Lexer::new(&heap, src);
        while *lexer.peek().unwrap() != Token::Colon {
            lexer.next().unwrap();
        }
        let offset = lexer.offset();
        let mut resumed = Lexer::from_offset(&heap, src, offset);
        assert_eq!(resumed.next().unwrap(), Token::Colon);
        match resumed.next().unwrap() {
            Token::Ident(name) => assert_eq!(&*name, "B"),
            t => panic!("unexpected token {:?}", t),
        }
    }
}
