//! Two-port networks built from `S(...)` / `P(...)` terms.
//!
//! An element string is a `+`-cascade of series (`S`) and shunt (`P`) terms,
//! each wrapping an impedance expression from [`super::expression`]. The
//! cascade is split at the rightmost top-level `+` like impedance
//! expressions are, and multiplies left to right in source order, so the
//! leftmost term sits nearest the source. `S(2p+3n)+P((3p+1n+50o)/3p)` is a
//! series LC followed by a shunt RLC/C branch.

use num_complex::Complex;
use thiserror::Error;

use crate::math::Scalar;

use super::expression::{last_top_level, strip_whitespace, CircuitExpr, ParseError};
use super::twoport::{NumericError, TwoPort};

/// Failure while turning an element string into a two-port.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// The element string does not follow the grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The network evaluated to a degenerate two-port.
    #[error(transparent)]
    Numeric(#[from] NumericError),
}

/// How a branch impedance is inserted into the line.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// In line with the signal path: [[1, Z], [0, 1]].
    Series,
    /// Across the line: [[1, 0], [1/Z, 1]].
    Shunt,
}

impl ConnectionKind {
    const fn prefix(self) -> char {
        match self {
            Self::Series => 'S',
            Self::Shunt => 'P',
        }
    }
}

/// Parsed two-port network expression.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Network {
    /// Empty expression, evaluating to the identity two-port.
    #[default]
    Through,
    /// Single series or shunt branch.
    Branch {
        /// Insertion type.
        connection: ConnectionKind,
        /// Branch impedance.
        impedance: CircuitExpr,
    },
    /// Left network followed by right network.
    Cascade(Box<Network>, Box<Network>),
}

impl Network {
    /// Parses an element string, ignoring whitespace.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse_network(&strip_whitespace(text))
    }

    /// ABCD matrix at linear frequency `hz`. Entries may be non-finite for
    /// degenerate branches such as `P(0o)`.
    #[must_use]
    pub fn twoport(&self, hz: Scalar) -> TwoPort {
        match self {
            Self::Through => TwoPort::identity(),
            Self::Branch { connection, impedance } => {
                let z = impedance.impedance_at(hz);
                match connection {
                    ConnectionKind::Series => TwoPort::series_impedance(z),
                    ConnectionKind::Shunt => TwoPort::shunt_impedance(z),
                }
            }
            Self::Cascade(left, right) => left.twoport(hz).cascade(&right.twoport(hz)),
        }
    }

    /// ABCD matrices at each frequency of `hz`, in the same order.
    #[must_use]
    pub fn twoport_sweep(&self, hz: &[Scalar]) -> Vec<TwoPort> {
        hz.iter().map(|&f| self.twoport(f)).collect()
    }

    /// ABCD matrix of a passive element, rejecting non-finite results.
    pub fn element_twoport(&self, hz: Scalar) -> Result<TwoPort, NumericError> {
        self.twoport(hz).ensure_finite("element network")
    }

    /// Equivalent shunt load presented to the line by a feed network.
    ///
    /// The network is terminated by `z_load`; its input impedance
    /// `Zin = (A·Zl + B) / (C·Zl + D)` is returned as the shunt two-port of `Zin`.
    pub fn feed_twoport(&self, hz: Scalar, z_load: Complex<Scalar>) -> Result<TwoPort, NumericError> {
        let zin = self.element_twoport(hz)?.input_impedance(z_load)?;
        if zin.norm() == 0.0 {
            return Err(NumericError::DivisionByZero("feed shunt admittance"));
        }
        TwoPort::shunt_impedance(zin).ensure_finite("feed shunt admittance")
    }

    /// Feed shunt two-ports at each frequency of `hz`, in the same order.
    #[must_use]
    pub fn feed_twoport_sweep(
        &self,
        hz: &[Scalar],
        z_load: Complex<Scalar>,
    ) -> Vec<Result<TwoPort, NumericError>> {
        hz.iter().map(|&f| self.feed_twoport(f, z_load)).collect()
    }

    /// Number of `S`/`P` branches in the cascade.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Through => 0,
            Self::Branch { .. } => 1,
            Self::Cascade(left, right) => left.len() + right.len(),
        }
    }

    /// Returns true for the empty (through) network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Through => Ok(()),
            Self::Branch { connection, impedance } => write!(f, "{}({impedance})", connection.prefix()),
            Self::Cascade(left, right) => write!(f, "{left}+{right}"),
        }
    }
}

/// Parses `text` and returns its ABCD matrix at `hz`.
pub fn element_abcd(text: &str, hz: Scalar) -> Result<TwoPort, NetworkError> {
    Ok(Network::parse(text)?.element_twoport(hz)?)
}

/// Parses `text` and returns its feed shunt two-port at `hz` for load `z_load`.
pub fn feed_abcd(text: &str, hz: Scalar, z_load: Complex<Scalar>) -> Result<TwoPort, NetworkError> {
    Ok(Network::parse(text)?.feed_twoport(hz, z_load)?)
}

fn parse_network(expr: &str) -> Result<Network, ParseError> {
    if expr.is_empty() {
        return Ok(Network::Through);
    }
    if let Some((pos, _)) = last_top_level(expr, b"+")? {
        // An empty side is a through connection, like the empty string.
        let (left, right) = (&expr[..pos], &expr[pos + 1..]);
        return Ok(Network::Cascade(
            Box::new(parse_network(left)?),
            Box::new(parse_network(right)?),
        ));
    }

    let connection = if expr.starts_with("S(") {
        ConnectionKind::Series
    } else if expr.starts_with("P(") {
        ConnectionKind::Shunt
    } else {
        return Err(ParseError::InvalidTerm(expr.to_string()));
    };
    if !expr.ends_with(')') || expr.len() < 3 {
        return Err(ParseError::InvalidTerm(expr.to_string()));
    }
    let impedance = CircuitExpr::parse(&expr[2..expr.len() - 1])?;
    Ok(Network::Branch { connection, impedance })
}
