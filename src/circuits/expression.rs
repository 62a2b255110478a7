//! Parser and evaluator for compound lumped-impedance expressions.
//!
//! Grammar, after all whitespace is removed:
//!
//! ```text
//! expr  := expr ('+' | '/') term | term
//! term  := '(' expr ')' | value
//! value := number ('p' | 'n' | 'o')
//! ```
//!
//! `+` is a series connection and `/` a parallel one. There is no operator
//! precedence: the expression is split at the *rightmost* top-level operator,
//! which becomes the root of the tree. `10o+20o/30o` therefore parses as
//! `(10o+20o)/30o`.

use std::fmt;

use num_complex::Complex;
use thiserror::Error;

use crate::constants::angular_frequency;
use crate::math::Scalar;

use super::component::{Component, Lumped};

/// Errors raised while parsing network expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A value token or operand could not be read.
    #[error("malformed value `{0}`")]
    Malformed(String),
    /// An opening or closing parenthesis has no partner.
    #[error("unmatched parenthesis in `{0}`")]
    UnmatchedParenthesis(String),
    /// A two-port term is not of the form `S(...)` or `P(...)`.
    #[error("invalid network term `{0}`")]
    InvalidTerm(String),
}

/// Binary connection between two sub-expressions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Series connection `+` (impedances add).
    Series,
    /// Parallel connection `/` (Za·Zb / (Za+Zb)).
    Parallel,
}

impl Operator {
    const fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            b'+' => Some(Self::Series),
            b'/' => Some(Self::Parallel),
            _ => None,
        }
    }

    const fn symbol(self) -> char {
        match self {
            Self::Series => '+',
            Self::Parallel => '/',
        }
    }
}

/// Parsed impedance expression tree.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitExpr {
    /// Single lumped component.
    Leaf(Lumped),
    /// Operator node with its two operands.
    Binary {
        /// Connection type.
        op: Operator,
        /// Operand left of the operator.
        left: Box<CircuitExpr>,
        /// Operand right of the operator.
        right: Box<CircuitExpr>,
    },
}

impl CircuitExpr {
    /// Parses `text`, ignoring whitespace.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_expr(&strip_whitespace(text))
    }

    /// Impedance at linear frequency `hz`.
    #[must_use]
    pub fn impedance_at(&self, hz: Scalar) -> Complex<Scalar> {
        self.impedance(angular_frequency(hz))
    }

    /// Impedance at each frequency of `hz`, in the same order.
    #[must_use]
    pub fn impedance_sweep(&self, hz: &[Scalar]) -> Vec<Complex<Scalar>> {
        hz.iter().map(|&f| self.impedance_at(f)).collect()
    }

    /// Number of leaf components in the tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Binary { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

impl Component for CircuitExpr {
    fn impedance(&self, omega: Scalar) -> Complex<Scalar> {
        match self {
            Self::Leaf(value) => value.impedance(omega),
            Self::Binary { op, left, right } => {
                let z1 = left.impedance(omega);
                let z2 = right.impedance(omega);
                match op {
                    Operator::Series => z1 + z2,
                    Operator::Parallel => (z1 * z2) / (z1 + z2),
                }
            }
        }
    }
}

impl fmt::Display for CircuitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(value) => write!(f, "{value}"),
            Self::Binary { op, left, right } => {
                write!(f, "({left}{}{right})", op.symbol())
            }
        }
    }
}

/// Parses `text` and evaluates it at `hz`.
pub fn parse_impedance(text: &str, hz: Scalar) -> Result<Complex<Scalar>, ParseError> {
    Ok(CircuitExpr::parse(text)?.impedance_at(hz))
}

/// Parses `text` and evaluates it at each frequency of `hz`.
pub fn parse_impedance_sweep(text: &str, hz: &[Scalar]) -> Result<Vec<Complex<Scalar>>, ParseError> {
    Ok(CircuitExpr::parse(text)?.impedance_sweep(hz))
}

pub(crate) fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Byte index of the `)` closing the `(` at `open`.
pub(crate) fn matching_paren(expr: &str, open: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    for (idx, byte) in expr.bytes().enumerate().skip(open) {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnmatchedParenthesis(expr[open..].to_string()))
}

/// Position and byte of the rightmost operator in `ops` outside any parentheses.
pub(crate) fn last_top_level(expr: &str, ops: &[u8]) -> Result<Option<(usize, u8)>, ParseError> {
    let bytes = expr.as_bytes();
    let mut found = None;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'(' => idx = matching_paren(expr, idx)?,
            b')' => return Err(ParseError::UnmatchedParenthesis(expr.to_string())),
            b if ops.contains(&b) => found = Some((idx, b)),
            _ => {}
        }
        idx += 1;
    }
    Ok(found)
}

/// Returns the inside of `expr` when it is wrapped in one matching pair of parentheses.
pub(crate) fn unwrap_parens(expr: &str) -> Result<Option<&str>, ParseError> {
    if expr.starts_with('(') && matching_paren(expr, 0)? == expr.len() - 1 {
        Ok(Some(&expr[1..expr.len() - 1]))
    } else {
        Ok(None)
    }
}

fn parse_expr(expr: &str) -> Result<CircuitExpr, ParseError> {
    if let Some((pos, symbol)) = last_top_level(expr, b"+/")? {
        let (left, right) = (&expr[..pos], &expr[pos + 1..]);
        if left.is_empty() || right.is_empty() {
            return Err(ParseError::Malformed(expr.to_string()));
        }
        let op = Operator::from_symbol(symbol).ok_or_else(|| ParseError::Malformed(expr.to_string()))?;
        return Ok(CircuitExpr::Binary {
            op,
            left: Box::new(parse_expr(left)?),
            right: Box::new(parse_expr(right)?),
        });
    }
    match unwrap_parens(expr)? {
        Some(inner) => parse_expr(inner),
        None => Ok(CircuitExpr::Leaf(expr.parse()?)),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const GHZ: Scalar = 1.0e9;

    fn z(text: &str) -> Complex<Scalar> {
        parse_impedance(text, GHZ).expect("valid expression")
    }

    #[test]
    fn series_capacitor_and_inductor_at_one_gigahertz() {
        let zc = z("10p");
        let zl = z("20n");
        assert_relative_eq!(zc.im, -15.915_494, epsilon = 1e-5);
        assert_relative_eq!(zl.im, 125.663_706, epsilon = 1e-5);
        let total = z("10p+20n");
        assert_relative_eq!(total.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(total.im, 109.748_212, epsilon = 1e-5);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(
            CircuitExpr::parse(" 10p +\t20n ").unwrap(),
            CircuitExpr::parse("10p+20n").unwrap()
        );
    }

    #[test]
    fn series_is_commutative_and_associative() {
        let a = z("10o+(5n+3p)");
        let b = z("(3p+10o)+5n");
        assert_relative_eq!(a.re, b.re, epsilon = 1e-9);
        assert_relative_eq!(a.im, b.im, epsilon = 1e-9);
        let za = z("7o");
        let zb = z("4n");
        let sum = z("7o+4n");
        assert_relative_eq!(sum.re, (za + zb).re, epsilon = 1e-12);
        assert_relative_eq!(sum.im, (za + zb).im, epsilon = 1e-12);
    }

    #[test]
    fn parallel_combination() {
        assert_relative_eq!(z("100o/100o").re, 50.0, epsilon = 1e-12);
        let za = z("30o+2n");
        let zb = z("5p");
        let expected = za * zb / (za + zb);
        let got = z("(30o+2n)/5p");
        assert_relative_eq!(got.re, expected.re, epsilon = 1e-9);
        assert_relative_eq!(got.im, expected.im, epsilon = 1e-9);
    }

    #[test]
    fn rightmost_operator_is_the_root() {
        let expr = CircuitExpr::parse("10o+20o/30o").unwrap();
        match &expr {
            CircuitExpr::Binary { op, left, right } => {
                assert_eq!(*op, Operator::Parallel);
                assert_eq!(left.leaf_count(), 2);
                assert_eq!(**right, CircuitExpr::Leaf(Lumped::Resistance(30.0)));
            }
            CircuitExpr::Leaf(_) => panic!("expected operator node"),
        }
        // (10 + 20) / 30 = 15, not 10 + 12.
        assert_relative_eq!(expr.impedance_at(GHZ).re, 15.0, epsilon = 1e-12);
        // Same rule with the operators swapped: (10 / 20) + 30.
        assert_relative_eq!(z("10o/20o+30o").re, 30.0 + 20.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn parenthesised_terms_and_nesting() {
        assert_relative_eq!(z("((50o))").re, 50.0, epsilon = 1e-12);
        assert_relative_eq!(z("(100o+100o)/(100o+100o)").re, 100.0, epsilon = 1e-12);
    }

    #[test]
    fn sweep_matches_single_frequency_evaluation() {
        let freqs = [1.0e8, 5.0e8, 2.0e9];
        let list = parse_impedance_sweep("(100o+10n)/50o", &freqs).unwrap();
        assert_eq!(list.len(), freqs.len());
        for (f, zl) in freqs.iter().zip(&list) {
            let single = parse_impedance("(100o+10n)/50o", *f).unwrap();
            assert_eq!(single, *zl);
        }
    }

    #[test]
    fn errors_name_the_offending_text() {
        assert_eq!(CircuitExpr::parse("10q"), Err(ParseError::Malformed("10q".into())));
        assert_eq!(
            CircuitExpr::parse("(10p+20n"),
            Err(ParseError::UnmatchedParenthesis("(10p+20n".into()))
        );
        assert!(matches!(
            CircuitExpr::parse("10p)+20n"),
            Err(ParseError::UnmatchedParenthesis(_))
        ));
        assert_eq!(CircuitExpr::parse("+10p"), Err(ParseError::Malformed("+10p".into())));
        assert_eq!(CircuitExpr::parse(""), Err(ParseError::Malformed(String::new())));
    }
}
