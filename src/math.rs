//! Shared numerical primitives.

use num_complex::Complex;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Primary complex scalar type used for phasors and impedances.
pub type CScalar = Complex<Scalar>;

/// Returns `true` when both parts of `z` are finite.
#[inline]
#[must_use]
pub fn is_finite(z: CScalar) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

/// Purely real complex value.
#[inline]
#[must_use]
pub const fn real(x: Scalar) -> CScalar {
    Complex::new(x, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_parts_are_not_finite() {
        assert!(is_finite(real(1.0)));
        assert!(!is_finite(Complex::new(0.0, Scalar::INFINITY)));
        assert!(!is_finite(Complex::new(Scalar::NAN, 0.0)));
    }
}
