//! Infix to RPN conversion (shunting-yard) and stack evaluation

use super::function::Function;
use super::token::Token;
use crate::error::UtilityError;
use crate::Result;

/// Binds tighter than `* /` but looser than `^`, so `-2^2` is `-(2^2)`
const NEG_PRECEDENCE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Caret => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }

    fn right_associative(&self) -> bool {
        matches!(self, BinaryOp::Pow)
    }

    fn apply(&self, lhs: f64, rhs: f64) -> Result<f64> {
        let value = match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => {
                if rhs == 0.0 {
                    return Err(UtilityError::DivisionByZero);
                }
                lhs / rhs
            }
            BinaryOp::Pow => lhs.powf(rhs),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(UtilityError::NonFinite)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpnItem {
    Number(f64),
    /// Named constant, looked up at evaluation time
    Constant(String),
    Binary(BinaryOp),
    Neg,
    Call(Function),
}

/// Operator stack entries
#[derive(Debug, Clone, Copy)]
enum Pending {
    Binary(BinaryOp),
    Neg,
    Call(Function),
    LParen,
}

impl Pending {
    fn precedence(&self) -> Option<u8> {
        match self {
            Pending::Binary(op) => Some(op.precedence()),
            Pending::Neg => Some(NEG_PRECEDENCE),
            Pending::Call(_) | Pending::LParen => None,
        }
    }

    fn into_item(self) -> Option<RpnItem> {
        match self {
            Pending::Binary(op) => Some(RpnItem::Binary(op)),
            Pending::Neg => Some(RpnItem::Neg),
            Pending::Call(f) => Some(RpnItem::Call(f)),
            Pending::LParen => None,
        }
    }
}

/// Pop operators onto `output` until the nearest open parenthesis, which is
/// also removed. Fails when there is none.
fn unwind_to_paren(ops: &mut Vec<Pending>, output: &mut Vec<RpnItem>) -> Result<()> {
    while let Some(top) = ops.pop() {
        match top.into_item() {
            Some(item) => output.push(item),
            None => return Ok(()),
        }
    }
    Err(UtilityError::MismatchedParentheses)
}

pub fn to_rpn(tokens: &[Token]) -> Result<Vec<RpnItem>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut ops: Vec<Pending> = Vec::new();
    // One frame per open parenthesis: the called function and arguments seen so far
    let mut frames: Vec<Option<(Function, usize)>> = Vec::new();
    let mut expect_operand = true;
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Number(value) => {
                if !expect_operand {
                    return Err(UtilityError::Malformed("missing operator".to_string()));
                }
                output.push(RpnItem::Number(*value));
                expect_operand = false;
            }
            Token::Ident(name) => {
                if !expect_operand {
                    return Err(UtilityError::Malformed("missing operator".to_string()));
                }
                if matches!(iter.peek(), Some(Token::LParen)) {
                    let function = Function::from_name(name)
                        .ok_or_else(|| UtilityError::UnknownIdentifier(name.clone()))?;
                    iter.next();
                    ops.push(Pending::Call(function));
                    ops.push(Pending::LParen);
                    frames.push(Some((function, 1)));
                } else if Function::from_name(name).is_some() {
                    return Err(UtilityError::Malformed(format!(
                        "function '{name}' must be called with parentheses"
                    )));
                } else {
                    output.push(RpnItem::Constant(name.clone()));
                    expect_operand = false;
                }
            }
            Token::Minus if expect_operand => ops.push(Pending::Neg),
            Token::Plus if expect_operand => {}
            Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Caret => {
                if expect_operand {
                    return Err(UtilityError::Malformed("missing operand".to_string()));
                }
                let op = BinaryOp::from_token(token)
                    .ok_or_else(|| UtilityError::Malformed("unknown operator".to_string()))?;
                while let Some(prec) = ops.last().and_then(Pending::precedence) {
                    let pops = prec > op.precedence()
                        || (prec == op.precedence() && !op.right_associative());
                    if !pops {
                        break;
                    }
                    if let Some(item) = ops.pop().and_then(Pending::into_item) {
                        output.push(item);
                    }
                }
                ops.push(Pending::Binary(op));
                expect_operand = true;
            }
            Token::LParen => {
                if !expect_operand {
                    return Err(UtilityError::Malformed("missing operator".to_string()));
                }
                ops.push(Pending::LParen);
                frames.push(None);
            }
            Token::Comma => {
                if expect_operand {
                    return Err(UtilityError::Malformed("missing argument".to_string()));
                }
                match frames.last_mut() {
                    Some(Some((_, args))) => *args += 1,
                    _ => {
                        return Err(UtilityError::Malformed(
                            "comma outside of a function call".to_string(),
                        ))
                    }
                }
                unwind_to_paren(&mut ops, &mut output)?;
                ops.push(Pending::LParen);
                expect_operand = true;
            }
            Token::RParen => {
                if expect_operand {
                    return Err(UtilityError::Malformed("empty parentheses".to_string()));
                }
                unwind_to_paren(&mut ops, &mut output)?;
                if let Some((function, args)) = frames.pop().flatten() {
                    if args != function.arity() {
                        return Err(UtilityError::Malformed(format!(
                            "{}() takes {} argument(s), got {}",
                            function.name(),
                            function.arity(),
                            args
                        )));
                    }
                    ops.pop();
                    output.push(RpnItem::Call(function));
                }
            }
        }
    }

    if expect_operand {
        return Err(UtilityError::Malformed(
            "unexpected end of expression".to_string(),
        ));
    }

    while let Some(top) = ops.pop() {
        match top.into_item() {
            Some(item) => output.push(item),
            None => return Err(UtilityError::MismatchedParentheses),
        }
    }

    Ok(output)
}

/// Evaluate RPN, resolving constants through `lookup`
pub fn evaluate<F>(rpn: &[RpnItem], lookup: F) -> Result<f64>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut stack: Vec<f64> = Vec::new();
    let underflow = || UtilityError::Malformed("not enough operands".to_string());

    for item in rpn {
        match item {
            RpnItem::Number(value) => stack.push(*value),
            RpnItem::Constant(name) => {
                let value =
                    lookup(name).ok_or_else(|| UtilityError::UnknownIdentifier(name.clone()))?;
                stack.push(value);
            }
            RpnItem::Neg => {
                let value = stack.pop().ok_or_else(underflow)?;
                stack.push(-value);
            }
            RpnItem::Binary(op) => {
                let rhs = stack.pop().ok_or_else(underflow)?;
                let lhs = stack.pop().ok_or_else(underflow)?;
                stack.push(op.apply(lhs, rhs)?);
            }
            RpnItem::Call(function) => {
                let arity = function.arity();
                if stack.len() < arity {
                    return Err(underflow());
                }
                let args = stack.split_off(stack.len() - arity);
                stack.push(function.apply(&args)?);
            }
        }
    }

    match stack.as_slice() {
        [value] if value.is_finite() => Ok(*value),
        [_] => Err(UtilityError::NonFinite),
        _ => Err(UtilityError::Malformed("too many operands".to_string())),
    }
}
