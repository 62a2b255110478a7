//! Lumped leaf components of the network-expression grammar.

use std::fmt;
use std::str::FromStr;

use num_complex::Complex;

use crate::constants::{NANO, PICO};
use crate::math::Scalar;

use super::expression::ParseError;

/// Trait implemented by everything that can provide a frequency-domain impedance.
pub trait Component {
    /// Returns the impedance for an angular frequency `omega` (rad/s).
    fn impedance(&self, omega: Scalar) -> Complex<Scalar>;
}

/// Single lumped value parsed from a token such as `10p`, `2.2n`, or `50o`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lumped {
    /// Capacitor, value in picofarads (`p`).
    Capacitance(Scalar),
    /// Inductor, value in nanohenries (`n`).
    Inductance(Scalar),
    /// Resistor, value in ohms (`o`).
    Resistance(Scalar),
}

impl Lumped {
    /// Numeric value in the token's own unit (pF, nH, or Ω).
    #[must_use]
    pub const fn value(&self) -> Scalar {
        match *self {
            Self::Capacitance(v) | Self::Inductance(v) | Self::Resistance(v) => v,
        }
    }

    /// Unit suffix used in the textual grammar.
    #[must_use]
    pub const fn suffix(&self) -> char {
        match self {
            Self::Capacitance(_) => 'p',
            Self::Inductance(_) => 'n',
            Self::Resistance(_) => 'o',
        }
    }
}

impl Component for Lumped {
    fn impedance(&self, omega: Scalar) -> Complex<Scalar> {
        match *self {
            // Z = -j / (ωC); infinite at DC.
            Self::Capacitance(pf) => Complex::new(0.0, -1.0 / (omega * pf * PICO)),
            Self::Inductance(nh) => Complex::new(0.0, omega * nh * NANO),
            Self::Resistance(ohms) => Complex::new(ohms, 0.0),
        }
    }
}

impl FromStr for Lumped {
    type Err = ParseError;

    /// Parses `number unit` where number is `digits[.digits]` and unit is one of `p`, `n`, `o`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::Malformed(token.to_string());
        let (number, unit) = token
            .char_indices()
            .last()
            .map(|(idx, unit)| (&token[..idx], unit))
            .ok_or_else(malformed)?;

        let mut parts = number.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let frac = parts.next().unwrap_or_default();
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        let value: Scalar = number.parse().map_err(|_| malformed())?;

        match unit {
            'p' => Ok(Self::Capacitance(value)),
            'n' => Ok(Self::Inductance(value)),
            'o' => Ok(Self::Resistance(value)),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for Lumped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value(), self.suffix())
    }
}
