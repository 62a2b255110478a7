//! Transmission line primitives and ABCD parameterization.
//!
//! The line is discretised into equal steps; each step is a [`LineSegment`]
//! holding the lumped R, L, G, C of that step (per-metre values times the
//! grid step). A segment's ABCD matrix is the unit cell shared by every grid
//! point that carries no element.

use num_complex::Complex;

use crate::constants::{angular_frequency, SPEED_OF_LIGHT};
use crate::math::{self, Scalar};

use super::twoport::{NumericError, TwoPort, C};

/// Distributed RLGC parameters per unit length.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RLGC {
    /// Series resistance per meter (Ω/m).
    pub r_per_m: Scalar,
    /// Series inductance per meter (H/m).
    pub l_per_m: Scalar,
    /// Shunt conductance per meter (S/m).
    pub g_per_m: Scalar,
    /// Shunt capacitance per meter (F/m).
    pub c_per_m: Scalar,
}

impl RLGC {
    /// Lossless line parameters (R=G=0).
    #[must_use]
    pub const fn lossless(l_per_m: Scalar, c_per_m: Scalar) -> Self {
        Self {
            r_per_m: 0.0,
            l_per_m,
            g_per_m: 0.0,
            c_per_m,
        }
    }

    /// Inductance and capacitance of a line with characteristic impedance `z0`
    /// and phase velocity `velocity`: L' = Z0/v, C' = 1/(v·Z0).
    ///
    /// Both are zero when `z0` or `velocity` is zero.
    #[must_use]
    pub fn from_characteristic_impedance(z0: Scalar, velocity: Scalar) -> Self {
        if z0 == 0.0 || velocity == 0.0 {
            return Self::default();
        }
        Self::lossless(z0 / velocity, 1.0 / (velocity * z0))
    }

    /// Adds series resistance and shunt conductance per metre.
    #[must_use]
    pub const fn with_losses(mut self, r_per_m: Scalar, g_per_m: Scalar) -> Self {
        self.r_per_m = r_per_m;
        self.g_per_m = g_per_m;
        self
    }

    /// Lumped values of one grid step of length `step_m`.
    #[must_use]
    pub fn segment(&self, step_m: Scalar) -> LineSegment {
        LineSegment {
            r: self.r_per_m * step_m,
            l: self.l_per_m * step_m,
            g: self.g_per_m * step_m,
            c: self.c_per_m * step_m,
        }
    }
}

/// Phase velocity `v = f·λ` from a reference frequency and the quarter
/// wavelength measured there. Falls back to the speed of light when either
/// input is zero.
#[must_use]
pub fn phase_velocity(reference_hz: Scalar, quarter_wavelength_m: Scalar) -> Scalar {
    let velocity = reference_hz * 4.0 * quarter_wavelength_m;
    if velocity == 0.0 {
        SPEED_OF_LIGHT
    } else {
        velocity
    }
}

/// Lumped R, L, G, C of one grid step (Ω, H, S, F).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineSegment {
    /// Series resistance (Ω).
    pub r: Scalar,
    /// Series inductance (H).
    pub l: Scalar,
    /// Shunt conductance (S).
    pub g: Scalar,
    /// Shunt capacitance (F).
    pub c: Scalar,
}

impl LineSegment {
    /// Series impedance `R + jωL` and shunt admittance `G + jωC` at `hz`.
    #[must_use]
    pub fn immittances(&self, hz: Scalar) -> (C, C) {
        let omega = angular_frequency(hz);
        (Complex::new(self.r, omega * self.l), Complex::new(self.g, omega * self.c))
    }

    /// Unit-cell ABCD matrix at linear frequency `hz`.
    ///
    /// `A = D = cosh γ`, `B = Zc·sinh γ`, `C = sinh γ / Zc` with `γ = √(ZY)` and
    /// `Zc = √(Z/Y)` on the principal branch. `C` is zero when `Zc` is zero.
    /// Fails when `Y = 0` (infinite `Zc`) or the result is not finite; callers
    /// substitute the identity.
    pub fn twoport(&self, hz: Scalar) -> Result<TwoPort, NumericError> {
        let (series, shunt) = self.immittances(hz);
        if shunt.norm() == 0.0 {
            return Err(NumericError::ZeroAdmittance);
        }

        let gamma = (series * shunt).sqrt();
        let zc = (series / shunt).sqrt();
        let cosh = gamma.cosh();
        let sinh = gamma.sinh();
        let b = zc * sinh;
        let c = if zc.norm() == 0.0 || !math::is_finite(zc) {
            C::new(0.0, 0.0)
        } else {
            sinh / zc
        };
        TwoPort::from_abcd(cosh, b, c, cosh).ensure_finite("unit cell")
    }

    /// Characteristic impedance `√(Z/Y)` at `hz`, `None` when `Y = 0`.
    #[must_use]
    pub fn characteristic_impedance(&self, hz: Scalar) -> Option<C> {
        let (series, shunt) = self.immittances(hz);
        (shunt.norm() != 0.0).then(|| (series / shunt).sqrt())
    }
}

/// Transmission line descriptor (uniform, per-unit-length parameters).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionLine {
    /// Physical length in meters.
    pub length_m: Scalar,
    /// Distributed parameters.
    pub rlgc: RLGC,
}

impl TransmissionLine {
    /// Line of length `length_m` with the given RLGC per-unit parameters.
    #[must_use]
    pub const fn new(length_m: Scalar, rlgc: RLGC) -> Self {
        Self { length_m, rlgc }
    }

    /// Input impedance with load `z_load` at linear frequency `hz`, from the
    /// closed-form `Zc (Zl + Zc tanh γl) / (Zc + Zl tanh γl)`.
    pub fn input_impedance(&self, hz: Scalar, z_load: C) -> Result<C, NumericError> {
        let whole = self.rlgc.segment(self.length_m);
        let (series, shunt) = whole.immittances(hz);
        if shunt.norm() == 0.0 {
            return Err(NumericError::ZeroAdmittance);
        }
        let gamma = (series * shunt).sqrt();
        let zc = (series / shunt).sqrt();
        let t = gamma.tanh();
        let den = zc + z_load * t;
        if den.norm() == 0.0 {
            return Err(NumericError::DivisionByZero("line input impedance"));
        }
        Ok(zc * (z_load + zc * t) / den)
    }
}
