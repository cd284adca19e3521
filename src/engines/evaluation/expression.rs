use crate::error::EvaluationError;
use crate::types::Bindings;

/// Turns a mathematical string plus variable bindings into a number.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<f64, EvaluationError>;
}

/// Recursive-descent evaluator for the infix strings produced by
/// [`DualTree::to_mathematical_string`](crate::engines::generation::DualTree::to_mathematical_string).
///
/// Supports numbers, variables, `+ - * / ^`, unary minus, parentheses and the
/// unary functions listed in [`apply_unary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<f64, EvaluationError> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(EvaluationError::Parse("empty expression".to_string()));
        }

        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
            bindings,
        };
        let value = parser.expression()?;

        if let Some(token) = parser.peek() {
            return Err(EvaluationError::Parse(format!(
                "unexpected trailing token {:?} in '{}'",
                token, expression
            )));
        }

        ensure_finite(value, expression)
    }
}

pub const BINARY_OPERATORS: [&str; 5] = ["+", "-", "*", "/", "^"];

pub const UNARY_OPERATORS: [&str; 9] = ["-", "sin", "cos", "tan", "exp", "ln", "log", "sqrt", "abs"];

/// Whether `op` can be applied with `arity` operands.
pub fn supports(op: &str, arity: u8) -> bool {
    match arity {
        1 => UNARY_OPERATORS.contains(&op),
        2 => BINARY_OPERATORS.contains(&op),
        _ => false,
    }
}

/// Applies a binary operator. Shared with direct tree evaluation.
pub fn apply_binary(op: &str, lhs: f64, rhs: f64) -> Result<f64, EvaluationError> {
    let value = match op {
        "+" => lhs + rhs,
        "-" => lhs - rhs,
        "*" => lhs * rhs,
        "/" => {
            if rhs == 0.0 {
                return Err(EvaluationError::DivideByZero);
            }
            lhs / rhs
        }
        "^" => lhs.powf(rhs),
        other => return Err(EvaluationError::UnknownSymbol(other.to_string())),
    };
    ensure_finite(value, op)
}

/// Applies a unary operator or function. Shared with direct tree evaluation.
pub fn apply_unary(op: &str, operand: f64) -> Result<f64, EvaluationError> {
    let value = match op {
        "-" => -operand,
        "sin" => operand.sin(),
        "cos" => operand.cos(),
        "tan" => operand.tan(),
        "exp" => operand.exp(),
        "ln" => operand.ln(),
        "log" => operand.log10(),
        "sqrt" => operand.sqrt(),
        "abs" => operand.abs(),
        other => return Err(EvaluationError::UnknownSymbol(other.to_string())),
    };
    ensure_finite(value, op)
}

fn ensure_finite(value: f64, context: &str) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFinite(context.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvaluationError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // scientific notation, e.g. 1e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| EvaluationError::Parse(format!("bad number '{}'", literal)))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(EvaluationError::Parse(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    bindings: &'a Bindings,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, EvaluationError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.position += 1;
            let rhs = self.term()?;
            value = apply_binary(&op.to_string(), value, rhs)?;
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, EvaluationError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.position += 1;
            let rhs = self.unary()?;
            value = apply_binary(&op.to_string(), value, rhs)?;
        }
        Ok(value)
    }

    // unary := ('-' | '+') unary | power
    fn unary(&mut self) -> Result<f64, EvaluationError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.position += 1;
                let operand = self.unary()?;
                apply_unary("-", operand)
            }
            Some(Token::Op('+')) => {
                self.position += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // power := primary ('^' unary)?   (right associative)
    fn power(&mut self) -> Result<f64, EvaluationError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.position += 1;
            let exponent = self.unary()?;
            return apply_binary("^", base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, EvaluationError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let value = self.expression()?;
                self.expect_rparen()?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.position += 1;
                    let argument = self.expression()?;
                    self.expect_rparen()?;
                    return apply_unary(name, argument);
                }
                self.bindings
                    .get(name)
                    .copied()
                    .ok_or_else(|| EvaluationError::UnknownSymbol(name.clone()))
            }
            Some(token) => Err(EvaluationError::Parse(format!(
                "unexpected token {:?}",
                token
            ))),
            None => Err(EvaluationError::Parse("unexpected end of input".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), EvaluationError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            Some(token) => Err(EvaluationError::Parse(format!(
                "expected ')', found {:?}",
                token
            ))),
            None => Err(EvaluationError::Parse("missing ')'".to_string())),
        }
    }
}
