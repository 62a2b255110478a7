//! Canonical ABCD two-port representation.
//!
//! A [`TwoPort`] is the single chain-matrix type used from the parser output
//! through to the distribution solver. The flattened `[A, B, C, D]` form and
//! the `nalgebra` 2×2 form are views with lossless conversions both ways.

use nalgebra::Matrix2;
use num_complex::Complex;
use thiserror::Error;

use crate::math::{self, Scalar};

/// Convenience alias for complex scalars.
pub type C = Complex<Scalar>;

/// Relative determinant magnitude below which a two-port is treated as singular.
const SINGULAR_TOLERANCE: Scalar = 1.0e-12;

/// Numeric degeneracies raised while building or inverting two-ports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    /// Shunt admittance of a line segment vanished.
    #[error("zero shunt admittance (Y = 0)")]
    ZeroAdmittance,
    /// A denominator evaluated to zero.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
    /// Matrix inversion is ill-conditioned.
    #[error("near-singular two-port (|det| = {0:.3e})")]
    NearSingular(Scalar),
    /// The result contains NaN or infinite entries.
    #[error("non-finite result in {0}")]
    NonFinite(&'static str),
}

/// ABCD-based two-port network.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPort {
    /// A element of the ABCD matrix.
    pub a: C,
    /// B element of the ABCD matrix.
    pub b: C,
    /// C element of the ABCD matrix.
    pub c: C,
    /// D element of the ABCD matrix.
    pub d: C,
}

impl Default for TwoPort {
    fn default() -> Self {
        Self::identity()
    }
}

impl TwoPort {
    /// Identity two-port (through connection): [[1, 0], [0, 1]].
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            a: C::new(1.0, 0.0),
            b: C::new(0.0, 0.0),
            c: C::new(0.0, 0.0),
            d: C::new(1.0, 0.0),
        }
    }

    /// Constructs a two-port from explicit ABCD elements.
    #[must_use]
    pub const fn from_abcd(a: C, b: C, c: C, d: C) -> Self {
        Self { a, b, c, d }
    }

    /// Series impedance `Z` represented as a two-port: [[1, Z], [0, 1]].
    #[must_use]
    pub const fn series_impedance(z: C) -> Self {
        Self::from_abcd(C::new(1.0, 0.0), z, C::new(0.0, 0.0), C::new(1.0, 0.0))
    }

    /// Shunt admittance `Y` represented as a two-port: [[1, 0], [Y, 1]].
    #[must_use]
    pub const fn shunt_admittance(y: C) -> Self {
        Self::from_abcd(C::new(1.0, 0.0), C::new(0.0, 0.0), y, C::new(1.0, 0.0))
    }

    /// Shunt impedance `Z` represented as a two-port: [[1, 0], [1/Z, 1]].
    #[must_use]
    pub fn shunt_impedance(z: C) -> Self {
        Self::shunt_admittance(z.inv())
    }

    /// Flattened `[A, B, C, D]` view.
    #[must_use]
    pub const fn to_array(&self) -> [C; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Builds a two-port from the flattened `[A, B, C, D]` view.
    #[must_use]
    pub const fn from_array(abcd: [C; 4]) -> Self {
        Self::from_abcd(abcd[0], abcd[1], abcd[2], abcd[3])
    }

    /// Row-major 2×2 matrix view.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix2<C> {
        Matrix2::new(self.a, self.b, self.c, self.d)
    }

    /// Builds a two-port from a 2×2 matrix.
    #[must_use]
    pub fn from_matrix(m: &Matrix2<C>) -> Self {
        Self::from_abcd(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)])
    }

    /// ABCD determinant `ad - bc`.
    #[must_use]
    pub fn determinant(&self) -> C {
        self.a * self.d - self.b * self.c
    }

    /// Returns `true` when every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_array().into_iter().all(math::is_finite)
    }

    /// Fails with [`NumericError::NonFinite`] when any entry is NaN or infinite.
    pub fn ensure_finite(self, what: &'static str) -> Result<Self, NumericError> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(NumericError::NonFinite(what))
        }
    }

    /// Cascades this two-port with `rhs` (i.e., self followed by rhs).
    #[must_use]
    pub fn cascade(&self, rhs: &Self) -> Self {
        // Matrix multiplication [[a b],[c d]] * [[a' b'],[c' d']]
        Self {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
        }
    }

    /// Cascades a sequence of two-ports from first to last. Returns identity for empty.
    #[must_use]
    pub fn cascade_all<'a>(list: impl IntoIterator<Item = &'a Self>) -> Self {
        list.into_iter()
            .fold(Self::identity(), |acc, t| acc.cascade(t))
    }

    /// General 2×2 inverse `[[d, -b], [-c, a]] / det`.
    ///
    /// Fails when the determinant is small relative to the largest entry.
    pub fn inverse(&self) -> Result<Self, NumericError> {
        let det = self.determinant();
        let scale = self
            .to_array()
            .iter()
            .map(|z| z.norm_sqr())
            .fold(0.0, Scalar::max);
        if !math::is_finite(det) || det.norm() <= SINGULAR_TOLERANCE * scale.max(Scalar::MIN_POSITIVE) {
            return Err(NumericError::NearSingular(det.norm()));
        }
        let inv_det = det.inv();
        Ok(Self {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
        })
    }

    /// Maps the port-2 state `(v, i)` to port 1: `[v', i'] = M · [v, i]`.
    #[must_use]
    pub fn apply(&self, v: C, i: C) -> (C, C) {
        (self.a * v + self.b * i, self.c * v + self.d * i)
    }

    /// Input impedance at port 1 when port 2 is terminated by `z_load`.
    pub fn input_impedance(&self, z_load: C) -> Result<C, NumericError> {
        let den = self.c * z_load + self.d;
        if den.norm() == 0.0 {
            return Err(NumericError::DivisionByZero("input impedance"));
        }
        let zin = (self.a * z_load + self.b) / den;
        if math::is_finite(zin) {
            Ok(zin)
        } else {
            Err(NumericError::NonFinite("input impedance"))
        }
    }

    /// Reflection coefficient at port 1 against reference `z_ref` with load `z_load` at port 2.
    pub fn reflection_at_port1(&self, z_load: C, z_ref: C) -> Result<C, NumericError> {
        let zin = self.input_impedance(z_load)?;
        reflection_coefficient(zin, z_ref)
    }
}

/// Reflection coefficient `(z - z_ref) / (z + z_ref)`.
pub fn reflection_coefficient(z: C, z_ref: C) -> Result<C, NumericError> {
    let den = z + z_ref;
    if den.norm() == 0.0 {
        return Err(NumericError::DivisionByZero("reflection coefficient"));
    }
    Ok((z - z_ref) / den)
}

impl From<Matrix2<C>> for TwoPort {
    fn from(m: Matrix2<C>) -> Self {
        Self::from_matrix(&m)
    }
}

impl From<TwoPort> for Matrix2<C> {
    fn from(t: TwoPort) -> Self {
        t.to_matrix()
    }
}

impl From<[C; 4]> for TwoPort {
    fn from(abcd: [C; 4]) -> Self {
        Self::from_array(abcd)
    }
}

impl From<TwoPort> for [C; 4] {
    fn from(t: TwoPort) -> Self {
        t.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cascade_identity_is_noop() {
        let t = TwoPort::series_impedance(C::new(50.0, 0.0));
        let id = TwoPort::identity();
        let res = t.cascade(&id);
        assert_relative_eq!(res.a.re, t.a.re, epsilon = 1e-12);
        assert_relative_eq!(res.b.re, t.b.re, epsilon = 1e-12);
        assert_relative_eq!(res.c.re, t.c.re, epsilon = 1e-12);
        assert_relative_eq!(res.d.re, t.d.re, epsilon = 1e-12);
        assert_eq!(id.cascade(&id), TwoPort::identity());
    }

    #[test]
    fn cascade_of_series_impedances_adds_b_terms() {
        let t1 = TwoPort::series_impedance(C::new(10.0, 1.0));
        let t2 = TwoPort::series_impedance(C::new(5.0, -2.0));
        let tc = t1.cascade(&t2);
        assert_relative_eq!(tc.b.re, 15.0, epsilon = 1e-12);
        assert_relative_eq!(tc.b.im, -1.0, epsilon = 1e-12);
        assert_relative_eq!(tc.a.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(tc.d.re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn matrix_and_array_views_agree() {
        let t = TwoPort::from_abcd(
            C::new(1.0, 2.0),
            C::new(3.0, -1.0),
            C::new(0.5, 0.0),
            C::new(-2.0, 4.0),
        );
        assert_eq!(TwoPort::from(t.to_matrix()), t);
        assert_eq!(TwoPort::from(t.to_array()), t);

        let other = TwoPort::shunt_admittance(C::new(0.01, 0.02));
        let product = TwoPort::from(t.to_matrix() * other.to_matrix());
        let cascaded = t.cascade(&other);
        for (p, q) in product.to_array().iter().zip(cascaded.to_array()) {
            assert_relative_eq!(p.re, q.re, epsilon = 1e-12);
            assert_relative_eq!(p.im, q.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn inverse_undoes_cascade() {
        let t = TwoPort::series_impedance(C::new(10.0, 5.0))
            .cascade(&TwoPort::shunt_admittance(C::new(1e-3, -2e-3)));
        let inv = t.inverse().expect("invertible");
        let id = t.cascade(&inv);
        assert_relative_eq!(id.a.re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(id.b.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(id.c.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(id.d.re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_inverse_is_rejected() {
        let t = TwoPort::from_abcd(C::new(1.0, 0.0), C::new(2.0, 0.0), C::new(2.0, 0.0), C::new(4.0, 0.0));
        assert!(matches!(t.inverse(), Err(NumericError::NearSingular(_))));
    }

    #[test]
    fn input_impedance_of_series_resistor() {
        let t = TwoPort::series_impedance(C::new(25.0, 0.0));
        let zin = t.input_impedance(C::new(50.0, 0.0)).unwrap();
        assert_relative_eq!(zin.re, 75.0, epsilon = 1e-12);
        let gamma = t.reflection_at_port1(C::new(50.0, 0.0), C::new(50.0, 0.0)).unwrap();
        assert_relative_eq!(gamma.re, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn shunt_impedance_stores_admittance() {
        let t = TwoPort::shunt_impedance(C::new(50.0, 0.0));
        assert_relative_eq!(t.c.re, 0.02, epsilon = 1e-15);
        assert!(!TwoPort::shunt_impedance(C::new(0.0, 0.0)).is_finite());
    }
}
