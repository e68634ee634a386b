//! Expression evaluator
//!
//! Recursive descent over tokens pulled straight from the [`Tokenizer`],
//! one rule per precedence level, lowest first:
//!
//! | Rule             | Operators                     | Associativity |
//! |------------------|-------------------------------|---------------|
//! | `relational`     | `<` `<=` `>` `>=` `=` `<>`    | right         |
//! | `additive`       | `+` `-`                       | left          |
//! | `multiplicative` | `*` `/` `%`                   | left          |
//! | `power`          | `^`                           | right         |
//! | `unary`          | leading `+` `-`               |               |
//! | `primary`        | `( ... )`, number, variable   |               |
//!
//! Every rule starts with its first token already fetched and returns with
//! the token after its expression fetched. When the whole expression is done
//! that lookahead token is pushed back, so the caller reads it next.

use crate::error::{Result, SmallBasicError};
use crate::tokenizer::{Delimiter, Token, Tokenizer};
use crate::variables::Variables;

/// Evaluate the expression starting at the tokenizer's cursor
pub fn evaluate(tokenizer: &mut Tokenizer, variables: &Variables) -> Result<f64> {
    Evaluator::new(tokenizer, variables).evaluate()
}

/// Single-expression evaluator
pub struct Evaluator<'a> {
    tokens: &'a mut Tokenizer,
    variables: &'a Variables,
    token: Token,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator reading from `tokens`
    pub fn new(tokens: &'a mut Tokenizer, variables: &'a Variables) -> Self {
        Self {
            tokens,
            variables,
            token: Token::EndOfProgram,
        }
    }

    /// Parse and compute one expression, leaving the cursor just after it
    pub fn evaluate(mut self) -> Result<f64> {
        self.advance()?;
        if self.token == Token::EndOfProgram {
            return Err(SmallBasicError::NoExpression);
        }
        let result = self.relational()?;
        self.tokens.push_back();
        Ok(result)
    }

    fn advance(&mut self) -> Result<()> {
        self.token = self.tokens.next_token()?;
        Ok(())
    }

    fn relational(&mut self) -> Result<f64> {
        let left = self.additive()?;
        let op = match self.token {
            Token::Delimiter(op) if op.is_relational() => op,
            _ => return Ok(left),
        };
        self.advance()?;
        let right = self.relational()?;
        Ok(compare(op, left, right))
    }

    fn additive(&mut self) -> Result<f64> {
        let mut result = self.multiplicative()?;
        loop {
            let op = match self.token {
                Token::Delimiter(op @ (Delimiter::Plus | Delimiter::Minus)) => op,
                _ => return Ok(result),
            };
            self.advance()?;
            let operand = self.multiplicative()?;
            result = match op {
                Delimiter::Plus => result + operand,
                _ => result - operand,
            };
        }
    }

    fn multiplicative(&mut self) -> Result<f64> {
        let mut result = self.power()?;
        loop {
            let op = match self.token {
                Token::Delimiter(
                    op @ (Delimiter::Star | Delimiter::Slash | Delimiter::Percent),
                ) => op,
                _ => return Ok(result),
            };
            self.advance()?;
            let operand = self.power()?;
            result = match op {
                Delimiter::Star => result * operand,
                _ if operand == 0.0 => return Err(SmallBasicError::DivisionByZero),
                Delimiter::Slash => result / operand,
                _ => result % operand,
            };
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.unary()?;
        if !self.token.is_delimiter(Delimiter::Caret) {
            return Ok(base);
        }
        self.advance()?;
        let exponent = self.power()?;
        Ok(integer_power(base, exponent))
    }

    fn unary(&mut self) -> Result<f64> {
        // Any token spelled "-" counts as a minus here, not just the delimiter.
        let sign = if self.token.is_delimiter(Delimiter::Plus) || self.token.lexeme() == "-" {
            let negate = self.token.lexeme() == "-";
            self.advance()?;
            Some(negate)
        } else {
            None
        };
        let result = self.primary()?;
        Ok(if sign == Some(true) { -result } else { result })
    }

    fn primary(&mut self) -> Result<f64> {
        if !self.token.is_delimiter(Delimiter::LeftParen) {
            return self.atom();
        }
        self.advance()?;
        let result = self.relational()?;
        if !self.token.is_delimiter(Delimiter::RightParen) {
            return Err(SmallBasicError::UnbalancedParentheses);
        }
        self.advance()?;
        Ok(result)
    }

    fn atom(&mut self) -> Result<f64> {
        let value = match &self.token {
            Token::Number(text) => text.parse::<f64>().map_err(|_| SmallBasicError::Syntax)?,
            Token::Variable(name) => self
                .variables
                .get(name)
                .map_err(|_| SmallBasicError::Syntax)?,
            _ => return Err(SmallBasicError::Syntax),
        };
        self.advance()?;
        Ok(value)
    }
}

fn compare(op: Delimiter, left: f64, right: f64) -> f64 {
    let holds = match op {
        Delimiter::Less => left < right,
        Delimiter::LessEqual => left <= right,
        Delimiter::Greater => left > right,
        Delimiter::GreaterEqual => left >= right,
        Delimiter::Equal => left == right,
        _ => left != right,
    };
    if holds {
        1.0
    } else {
        0.0
    }
}

/// Exponentiation by repeated multiplication.
///
/// The exponent is truncated to an integer. Zero gives 1 for any base;
/// an exponent that truncates to 1 or less (including negative and
/// fractional ones) leaves the base unchanged.
pub fn integer_power(base: f64, exponent: f64) -> f64 {
    if exponent == 0.0 {
        return 1.0;
    }
    let count = exponent as i32;
    let mut result = base;
    let mut remaining = count;
    while remaining > 1 {
        // Past this point the magnitude no longer changes
        if !result.is_finite() || result == 0.0 || result.abs() == 1.0 {
            break;
        }
        result *= base;
        remaining -= 1;
    }
    if remaining > 1 && base < 0.0 {
        // Only the sign still depends on the skipped multiplications
        let magnitude = result.abs();
        return if count % 2 == 0 { magnitude } else { -magnitude };
    }
    result
}
