use super::{Console, Function, Heap, HeapStr, Val, Vars};
use crate::error;
use crate::lang::{Error, Lexer, Operator, Token};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Everything an expression may touch while evaluating: the heap for
/// new strings, the variable table, and the console for PEEK.
pub struct Scope<'a> {
    pub heap: &'a Heap,
    pub vars: &'a mut Vars,
    pub console: &'a mut dyn Console,
}

/// Evaluate one expression from the live token stream, leaving the
/// lexer positioned on the first token past the expression.
///
/// Precedence, loosest to tightest: OR, AND, NOT, comparisons,
/// additive, multiplicative, unary minus, `^` (right-associative),
/// primary.
pub fn evaluate(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    or_level(scope, lexer)
}

/// Parse a parenthesized, comma-separated argument list. `()` is an
/// empty list.
pub fn evaluate_list(scope: &mut Scope, lexer: &mut Lexer) -> Result<Vec<Val>> {
    lexer.expect(Token::LParen)?;
    let mut list: Vec<Val> = vec![];
    if *lexer.peek()? == Token::RParen {
        lexer.next()?;
        return Ok(list);
    }
    loop {
        list.push(evaluate(scope, lexer)?);
        match lexer.next()? {
            Token::RParen => return Ok(list),
            Token::Comma => continue,
            _ => return Err(error!(Syntax; "EXPECTED RIGHT PARENTHESIS")),
        }
    }
}

fn truth(result: bool) -> Val {
    Val::Number(if result { 1.0 } else { 0.0 })
}

fn or_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    let mut lhs = and_level(scope, lexer)?;
    while *lexer.peek()? == Token::Operator(Operator::Or) {
        lexer.next()?;
        let rhs = and_level(scope, lexer)?;
        lhs = truth(lhs.number()? != 0.0 || rhs.number()? != 0.0);
    }
    Ok(lhs)
}

fn and_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    let mut lhs = not_level(scope, lexer)?;
    while *lexer.peek()? == Token::Operator(Operator::And) {
        lexer.next()?;
        let rhs = not_level(scope, lexer)?;
        lhs = truth(lhs.number()? != 0.0 && rhs.number()? != 0.0);
    }
    Ok(lhs)
}

fn not_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    if *lexer.peek()? == Token::Operator(Operator::Not) {
        lexer.next()?;
        let operand = not_level(scope, lexer)?;
        return Ok(truth(operand.number()? == 0.0));
    }
    compare_level(scope, lexer)
}

fn compare_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    use Operator::*;
    let mut lhs = add_level(scope, lexer)?;
    loop {
        let op = match lexer.peek()? {
            Token::Operator(op @ Equal)
            | Token::Operator(op @ NotEqual)
            | Token::Operator(op @ Less)
            | Token::Operator(op @ LessEqual)
            | Token::Operator(op @ Greater)
            | Token::Operator(op @ GreaterEqual) => *op,
            _ => return Ok(lhs),
        };
        lexer.next()?;
        let rhs = add_level(scope, lexer)?;
        let ordering = match (&lhs, &rhs) {
            (Val::Number(a), Val::Number(b)) => a.partial_cmp(b),
            (Val::String(a), Val::String(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => return Err(error!(TypeMismatch)),
        };
        let result = match ordering {
            Some(ordering) => match op {
                Equal => ordering == std::cmp::Ordering::Equal,
                NotEqual => ordering != std::cmp::Ordering::Equal,
                Less => ordering == std::cmp::Ordering::Less,
                LessEqual => ordering != std::cmp::Ordering::Greater,
                Greater => ordering == std::cmp::Ordering::Greater,
                GreaterEqual => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            },
            None => false,
        };
        lhs = truth(result);
    }
}

fn add_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    let mut lhs = mul_level(scope, lexer)?;
    loop {
        match lexer.peek()? {
            Token::Operator(Operator::Plus) => {
                lexer.next()?;
                let rhs = mul_level(scope, lexer)?;
                lhs = match (lhs, rhs) {
                    (Val::Number(a), Val::Number(b)) => Val::Number(a + b),
                    (Val::String(a), Val::String(b)) => {
                        let mut joined = String::with_capacity(a.len() + b.len());
                        joined.push_str(a.as_str());
                        joined.push_str(b.as_str());
                        Val::String(Rc::new(HeapStr::take(scope.heap, joined)?))
                    }
                    _ => return Err(error!(TypeMismatch)),
                };
            }
            Token::Operator(Operator::Minus) => {
                lexer.next()?;
                let rhs = mul_level(scope, lexer)?;
                lhs = Val::Number(lhs.number()? - rhs.number()?);
            }
            _ => return Ok(lhs),
        }
    }
}

fn mul_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    let mut lhs = unary_level(scope, lexer)?;
    loop {
        match lexer.peek()? {
            Token::Operator(Operator::Multiply) => {
                lexer.next()?;
                let rhs = unary_level(scope, lexer)?;
                lhs = Val::Number(lhs.number()? * rhs.number()?);
            }
            Token::Operator(Operator::Divide) => {
                lexer.next()?;
                let divisor = unary_level(scope, lexer)?.number()?;
                if divisor == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                lhs = Val::Number(lhs.number()? / divisor);
            }
            _ => return Ok(lhs),
        }
    }
}

fn unary_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    if *lexer.peek()? == Token::Operator(Operator::Minus) {
        lexer.next()?;
        let operand = unary_level(scope, lexer)?;
        return Ok(Val::Number(-operand.number()?));
    }
    power_level(scope, lexer)
}

fn power_level(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    let base = primary(scope, lexer)?;
    if *lexer.peek()? == Token::Operator(Operator::Caret) {
        lexer.next()?;
        // Right-associative, and the exponent may carry its own sign.
        let exponent = unary_level(scope, lexer)?;
        return Ok(Val::Number(base.number()?.powf(exponent.number()?)));
    }
    Ok(base)
}

fn primary(scope: &mut Scope, lexer: &mut Lexer) -> Result<Val> {
    match lexer.next()? {
        Token::Number(n) => Ok(Val::Number(n)),
        Token::Str(s) => Ok(Val::String(Rc::new(s))),
        Token::LParen => {
            let val = evaluate(scope, lexer)?;
            lexer.expect(Token::RParen)?;
            Ok(val)
        }
        Token::Ident(name) => {
            if Function::is_function(&name) {
                let args = if *lexer.peek()? == Token::LParen {
                    evaluate_list(scope, lexer)?
                } else {
                    vec![]
                };
                return Function::call(&name, args, scope.heap, scope.console);
            }
            if *lexer.peek()? == Token::LParen {
                let subscripts = evaluate_list(scope, lexer)?;
                return scope.vars.fetch_element(scope.heap, &name, subscripts);
            }
            scope.vars.fetch(scope.heap, &name)
        }
        _ => Err(error!(Syntax; "EXPECTED EXPRESSION")),
    }
}
