//! Arithmetic calculator tool
//!
//! Accepts only `0123456789+-*/().^ `. Integers stay exact until they
//! overflow; `/` is true division and yields a float, `//` floors.
//! `^` and `**` are exponentiation and bind tighter than a leading minus.

use super::Tool;
use std::fmt;

const ALLOWED: &str = "0123456789+-*/().^ ";

/// `calculator`: evaluates restricted arithmetic expressions
pub fn calculator_tool() -> Tool {
    Tool::new("calculator", "Evaluate mathematical expressions", |expression| {
        if !expression.chars().all(|c| ALLOWED.contains(c)) {
            return Ok("Invalid expression".to_string());
        }
        Ok(match evaluate(expression) {
            Ok(value) => value.to_string(),
            Err(e) => format!("Error: {}", e),
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", format_float(x)),
        }
    }
}

/// Float text the way an interactive interpreter prints it: `4.0`, `3.5`,
/// `1e+20`, `1e-05`
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let rendered = format!("{:e}", x);
        return match rendered.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => rendered,
        };
    }

    if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    FloorDiv,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let number = if literal.contains('.') {
                    literal
                        .parse::<f64>()
                        .map(Number::Float)
                        .map_err(|_| format!("invalid number '{}'", literal))?
                } else {
                    literal
                        .parse::<i128>()
                        .map(Number::Int)
                        .or_else(|_| literal.parse::<f64>().map(Number::Float))
                        .map_err(|_| format!("invalid number '{}'", literal))?
                };
                tokens.push(Token::Num(number));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::FloorDiv);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            match op {
                Token::Plus | Token::Minus => {
                    self.pos += 1;
                    let rhs = self.term()?;
                    value = apply(&op, value, rhs)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '//') unary)*
    fn term(&mut self) -> Result<Number, String> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            match op {
                Token::Star | Token::Slash | Token::FloorDiv => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    value = apply(&op, value, rhs)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<Number, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let value = self.unary()?;
                Ok(match value {
                    Number::Int(i) => i
                        .checked_neg()
                        .map(Number::Int)
                        .unwrap_or(Number::Float(-(i as f64))),
                    Number::Float(f) => Number::Float(-f),
                })
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<Number, String> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return apply(&Token::Pow, base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Number, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("unbalanced parentheses".to_string()),
                }
            }
            Some(token) => Err(format!("unexpected token {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn apply(op: &Token, lhs: Number, rhs: Number) -> Result<Number, String> {
    use Number::{Float, Int};

    let float = |f: fn(f64, f64) -> f64| Float(f(lhs.as_f64(), rhs.as_f64()));

    Ok(match op {
        Token::Plus => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_add(b).map(Int).unwrap_or_else(|| float(|a, b| a + b)),
            _ => float(|a, b| a + b),
        },
        Token::Minus => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_sub(b).map(Int).unwrap_or_else(|| float(|a, b| a - b)),
            _ => float(|a, b| a - b),
        },
        Token::Star => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_mul(b).map(Int).unwrap_or_else(|| float(|a, b| a * b)),
            _ => float(|a, b| a * b),
        },
        Token::Slash => {
            if rhs.is_zero() {
                return Err("division by zero".to_string());
            }
            float(|a, b| a / b)
        }
        Token::FloorDiv => {
            if rhs.is_zero() {
                return Err("integer division or modulo by zero".to_string());
            }
            match (lhs, rhs) {
                (Int(a), Int(b)) => match (a.checked_div(b), a.checked_rem(b)) {
                    (Some(q), Some(r)) if r != 0 && ((a < 0) != (b < 0)) => Int(q - 1),
                    (Some(q), Some(_)) => Int(q),
                    _ => float(|a, b| (a / b).floor()),
                },
                _ => float(|a, b| (a / b).floor()),
            }
        }
        Token::Pow => match (lhs, rhs) {
            (Int(a), Int(b)) if b >= 0 => u32::try_from(b)
                .ok()
                .and_then(|e| a.checked_pow(e))
                .map(Int)
                .unwrap_or_else(|| float(f64::powf)),
            _ => {
                if lhs.is_zero() && rhs.as_f64() < 0.0 {
                    return Err("0.0 cannot be raised to a negative power".to_string());
                }
                float(f64::powf)
            }
        },
        other => return Err(format!("unexpected operator {:?}", other)),
    })
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<Number, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;

    fn calc(expr: &str) -> String {
        ToolRegistry::new([calculator_tool()]).execute("calculator", expr)
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(calc("25 * 4 + 100"), "200");
        assert_eq!(calc("2 + 3 * 4"), "14");
        assert_eq!(calc("(2 + 3) * 4"), "20");
        assert_eq!(calc("-7 // 2"), "-4");
    }

    #[test]
    fn test_division_yields_float() {
        assert_eq!(calc("7 / 2"), "3.5");
        assert_eq!(calc("8 / 2"), "4.0");
    }

    #[test]
    fn test_power() {
        assert_eq!(calc("2 ^ 10"), "1024");
        assert_eq!(calc("2 ** 3"), "8");
        assert_eq!(calc("-2 ^ 2"), "-4");
        assert_eq!(calc("2 ^ -1"), "0.5");
        assert_eq!(calc("2 ^ 3 ^ 2"), "512");
    }

    #[test]
    fn test_extreme_integers_fall_back_to_float() {
        let min = "(-170141183460469231731687303715884105727 - 1)";
        let expected = 170141183460469231731687303715884105728.0_f64;

        for expr in [format!("-{}", min), format!("{} // -1", min)] {
            match evaluate(&expr) {
                Ok(Number::Float(f)) => assert_eq!(f, expected, "{}", expr),
                other => panic!("{} gave {:?}", expr, other),
            }
        }
        assert_eq!(
            evaluate(&format!("{} // 1", min)),
            Ok(Number::Int(i128::MIN))
        );
    }

    #[test]
    fn test_rejects_foreign_characters() {
        assert_eq!(calc("__import__('os')"), "Invalid expression");
        assert_eq!(calc("2 % 3"), "Invalid expression");
    }

    #[test]
    fn test_errors_are_reported() {
        assert_eq!(calc("1 / 0"), "Error: division by zero");
        assert_eq!(calc("(1 + 2"), "Error: unbalanced parentheses");
        assert_eq!(calc(""), "Error: empty expression");
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(0.25), "0.25");
    }
}
