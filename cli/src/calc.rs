//! Tiny infix arithmetic evaluator backing the demo calculator tool.
//! Supports + - * / %, parentheses and unary minus over f64.

use anyhow::{Result, bail};

pub fn eval(expression: &str) -> Result<f64> {
    let mut parser = Parser {
        input: expression.as_bytes(),
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos != parser.input.len() {
        bail!("unexpected input at position {}", parser.pos);
    }
    Ok(value)
}

/// Formats a result the way a calculator would: no trailing ".0" on whole
/// numbers.
pub fn format_result(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.input.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                b'+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                b'-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                b'*' => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                b'/' => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        bail!("division by zero");
                    }
                    value /= divisor;
                }
                b'%' => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        bail!("division by zero");
                    }
                    value %= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(b')') {
                    bail!("expected closing parenthesis");
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(c) => bail!("unexpected character '{}'", c as char),
            None => bail!("unexpected end of expression"),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        while self.pos < self.input.len()
            && (self.input[self.pos].is_ascii_digit() || self.input[self.pos] == b'.')
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])?;
        text.parse::<f64>()
            .map_err(|_| anyhow::anyhow!("invalid number '{}'", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_with_precedence() {
        assert_eq!(eval("125 * 48").unwrap(), 6000.0);
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(456 + 789) * 12").unwrap(), 14940.0);
        assert_eq!(eval("456*789").unwrap(), 359784.0);
    }

    #[test]
    fn unary_minus_and_decimals() {
        assert_eq!(eval("-3 + 5").unwrap(), 2.0);
        assert_eq!(eval("1.5 * 2").unwrap(), 3.0);
        assert_eq!(eval("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(eval("2 +").is_err());
        assert!(eval("(1 + 2").is_err());
        assert!(eval("1 / 0").is_err());
        assert!(eval("hello").is_err());
    }

    #[test]
    fn whole_numbers_format_without_decimals() {
        assert_eq!(format_result(359784.0), "359784");
        assert_eq!(format_result(1.5), "1.5");
    }
}
