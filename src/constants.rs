//! Physical constants and frequency helpers.
//!
//! All quantities at the crate boundary are strict SI: hertz, metres, ohms,
//! henries, siemens, and farads. Conversion from user-facing units (GHz, mm,
//! nH, pF) happens upstream of [`crate::config::AntennaModel`].

use std::f64::consts::PI;

use crate::math::{real, CScalar};

/// Speed of light in vacuum _c_ in meters per second (m/s).
/// Exact value by SI definition (2019): 299,792,458 m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Picofarad in farads, the unit of the `p` suffix.
pub const PICO: f64 = 1.0e-12;
/// Nanohenry in henries, the unit of the `n` suffix.
pub const NANO: f64 = 1.0e-9;

/// Reference load impedance terminating every feed network (Ω).
pub const DEFAULT_LOAD_IMPEDANCE: CScalar = real(50.0);

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * PI * hz
}

/// Returns the free-space wavelength in meters for a given frequency in hertz.
#[inline]
#[must_use]
pub fn wavelength_from_frequency(hz: f64) -> f64 {
    SPEED_OF_LIGHT / hz
}
