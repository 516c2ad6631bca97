/*
 * @file calc.rs
 * @brief Restricted arithmetic evaluator
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Restricted arithmetic evaluator backing the `calculate` command.
//!
//! Accepts numbers, parentheses and the operators `+ - * / // % **` with
//! the usual precedence: `**` binds tightest and is right-associative,
//! unary signs bind looser than `**` (so `-2 ** 2` is `-4`), and `//` / `%`
//! use floored division. Anything else is rejected rather than executed,
//! as is nesting deeper than [`MAX_DEPTH`] levels.

use thiserror::Error;

/// Reasons an expression could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Deepest nesting of signs, exponents and parentheses the parser accepts.
pub const MAX_DEPTH: usize = 64;

/// Capability that turns an expression string into a number.
pub trait Evaluator {
    /// Evaluates `expression`.
    ///
    /// # Errors
    /// Returns [`CalcError`] for malformed input or undefined arithmetic.
    fn evaluate(&self, expression: &str) -> Result<f64, CalcError>;
}

/// Default evaluator: a recursive-descent parser over plain arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArithmeticEvaluator;

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expression: &str) -> Result<f64, CalcError> {
        evaluate(expression)
    }
}

/// Evaluates an arithmetic expression.
///
/// # Arguments
/// * `expression` - Source text such as `"2 + 3 * (4 - 1)"`.
///
/// # Returns
/// * `Ok(f64)` - The finite result.
///
/// # Errors
/// Returns [`CalcError`] when the text is empty, fails to parse, divides by
/// zero, or produces a non-finite value.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if let Some(&(_, pos)) = parser.tokens.get(parser.cursor) {
        return Err(CalcError::UnexpectedToken(pos));
    }
    finite(value)
}

/// Renders a result the way a person would read it aloud.
///
/// Integral values print without a fractional part; everything else uses
/// the shortest round-tripping decimal form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    FloorSlash,
    Percent,
    Power,
    Open,
    Close,
}

/// Splits `source` into tokens tagged with their character offset.
///
/// # Errors
/// Returns [`CalcError::UnexpectedChar`] or [`CalcError::InvalidNumber`].
fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, CalcError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let start = i;
        let token = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.clone()))?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Power
            }
            '*' => Token::Star,
            '/' if chars.get(i + 1) == Some(&'/') => {
                i += 1;
                Token::FloorSlash
            }
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::Open,
            ')' => Token::Close,
            other => return Err(CalcError::UnexpectedChar { ch: other, pos: i }),
        };
        tokens.push((token, start));
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|&(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.cursor).copied();
        if next.is_some() {
            self.cursor += 1;
        }
        next
    }

    /// Parses `term (("+" | "-") term)*`.
    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.cursor += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    /// Parses `unary (("*" | "/" | "//" | "%") unary)*`.
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::FloorSlash | Token::Percent)) =
            self.peek()
        {
            self.cursor += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                Token::Slash => value / rhs,
                Token::FloorSlash => (value / rhs).floor(),
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    /// Enters one nesting level, failing once [`MAX_DEPTH`] is exceeded.
    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    /// Parses `("-" | "+")* power`.
    fn unary(&mut self) -> Result<f64, CalcError> {
        self.descend()?;
        let value = match self.peek() {
            Some(Token::Minus) => {
                self.cursor += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.cursor += 1;
                self.unary()
            }
            _ => self.power(),
        };
        self.depth -= 1;
        value
    }

    /// Parses `atom ("**" unary)?`, which makes `**` right-associative.
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Power) {
            self.cursor += 1;
            let exponent = self.unary()?;
            if base == 0.0 && exponent < 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            return finite(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some((Token::Number(value), _)) => Ok(value),
            Some((Token::Open, _)) => {
                self.descend()?;
                let value = self.expression()?;
                self.depth -= 1;
                match self.advance() {
                    Some((Token::Close, _)) => Ok(value),
                    Some((_, pos)) => Err(CalcError::UnexpectedToken(pos)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some((_, pos)) => Err(CalcError::UnexpectedToken(pos)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Rejects infinities and NaN.
fn finite(value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2 + 2", 4.0)]
    #[case("2 + 3 * 4", 14.0)]
    #[case("(2 + 3) * 4", 20.0)]
    #[case("10 / 4", 2.5)]
    #[case("7 // 2", 3.0)]
    #[case("-7 // 2", -4.0)]
    #[case("-7 % 3", 2.0)]
    #[case("2 ** 3 ** 2", 512.0)]
    #[case("-2 ** 2", -4.0)]
    #[case("2 ** -1", 0.5)]
    #[case("1.5 * 2", 3.0)]
    #[case("--3", 3.0)]
    fn evaluates_arithmetic(#[case] expression: &str, #[case] expected: f64) {
        assert_eq!(evaluate(expression), Ok(expected));
    }

    #[rstest]
    #[case("1/0", CalcError::DivisionByZero)]
    #[case("5 % 0", CalcError::DivisionByZero)]
    #[case("0 ** -1", CalcError::DivisionByZero)]
    #[case("", CalcError::Empty)]
    #[case("   ", CalcError::Empty)]
    #[case("2 +", CalcError::UnexpectedEnd)]
    #[case("(2 + 3", CalcError::UnexpectedEnd)]
    #[case("2 3", CalcError::UnexpectedToken(2))]
    #[case("1.2.3", CalcError::InvalidNumber("1.2.3".to_string()))]
    #[case("__import__('os')", CalcError::UnexpectedChar { ch: '_', pos: 0 })]
    #[case("10 ** 400", CalcError::NotFinite)]
    fn rejects_bad_input(#[case] expression: &str, #[case] expected: CalcError) {
        assert_eq!(evaluate(expression), Err(expected));
    }

    #[rstest]
    #[case::parentheses("(")]
    #[case::signs("-")]
    #[case::exponents("2 ** ")]
    fn rejects_runaway_nesting(#[case] prefix: &str) {
        let expression = prefix.repeat(10_000) + "1";
        assert_eq!(evaluate(&expression), Err(CalcError::TooDeep));
    }

    #[test]
    fn accepts_moderate_nesting() {
        let expression = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&expression), Ok(1.0));
        assert_eq!(evaluate(&format!("{}5", "-".repeat(40))), Ok(5.0));
    }

    #[test]
    fn format_drops_integral_fraction() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn evaluator_capability_delegates() {
        assert_eq!(ArithmeticEvaluator.evaluate("6 * 7"), Ok(42.0));
    }
}
