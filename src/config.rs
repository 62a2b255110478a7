//! Immutable calculation input and the settings it is derived from.
//!
//! Every value here is SI (Hz, m, Ω, H, S, F). Conversion from the GHz / mm /
//! Ω-per-mm fields a user interface presents is the caller's job.

use crate::antenna::element::AntennaElement;
use crate::circuits::transmission::{phase_velocity, LineSegment, RLGC};
use crate::constants::DEFAULT_LOAD_IMPEDANCE;
use crate::math::{CScalar, Scalar};
use crate::sweep::linspace;

/// Transmission-line description from which per-metre RLGC is derived.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSettings {
    /// Characteristic impedance Z0 (Ω).
    pub characteristic_impedance: Scalar,
    /// Series resistance per metre (Ω/m).
    pub resistance_per_m: Scalar,
    /// Shunt conductance per metre (S/m).
    pub conductance_per_m: Scalar,
    /// Frequency at which the quarter wavelength was measured (Hz).
    pub reference_frequency_hz: Scalar,
    /// Quarter wavelength on the line at the reference frequency (m).
    pub quarter_wavelength_m: Scalar,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            characteristic_impedance: 200.0,
            resistance_per_m: 200.0,
            conductance_per_m: 0.0,
            reference_frequency_hz: 2.6e9,
            quarter_wavelength_m: 0.014,
        }
    }
}

impl LineSettings {
    /// Phase velocity on the line (m/s).
    #[must_use]
    pub fn velocity(&self) -> Scalar {
        phase_velocity(self.reference_frequency_hz, self.quarter_wavelength_m)
    }

    /// Per-metre line parameters.
    #[must_use]
    pub fn rlgc(&self) -> RLGC {
        RLGC::from_characteristic_impedance(self.characteristic_impedance, self.velocity())
            .with_losses(self.resistance_per_m, self.conductance_per_m)
    }
}

/// Uniform grid along the antenna.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// Physical antenna length (m).
    pub antenna_length_m: Scalar,
    /// Number of grid points including both ends.
    pub grid_count: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            antenna_length_m: 0.1,
            grid_count: 2001,
        }
    }
}

impl GridSettings {
    /// Distance between neighbouring points; zero for grids of fewer than two points.
    #[must_use]
    pub fn step(&self) -> Scalar {
        if self.grid_count > 1 {
            self.antenna_length_m / (self.grid_count - 1) as Scalar
        } else {
            0.0
        }
    }

    /// Grid point positions from 0 to the antenna length.
    #[must_use]
    pub fn positions(&self) -> Vec<Scalar> {
        linspace(0.0, self.antenna_length_m, self.grid_count)
    }
}

/// Linear frequency sweep.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySettings {
    /// First frequency (Hz).
    pub start_hz: Scalar,
    /// Last frequency (Hz).
    pub stop_hz: Scalar,
    /// Number of points; 1 yields just `start_hz`.
    pub count: usize,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        Self {
            start_hz: 1.0e9,
            stop_hz: 7.0e9,
            count: 601,
        }
    }
}

impl FrequencySettings {
    /// Single analysis frequency.
    #[must_use]
    pub const fn single(hz: Scalar) -> Self {
        Self {
            start_hz: hz,
            stop_hz: hz,
            count: 1,
        }
    }

    /// Frequencies of the sweep in ascending order.
    #[must_use]
    pub fn frequencies(&self) -> Vec<Scalar> {
        linspace(self.start_hz, self.stop_hz, self.count)
    }
}

/// Snapshot of everything a calculation reads.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct AntennaModel {
    /// Lumped R, L, G, C of one grid step.
    pub segment: LineSegment,
    /// Grid point positions (m); the grid has one point per entry.
    pub grid: Vec<Scalar>,
    /// Elements and feeds in declaration order.
    pub elements: Vec<AntennaElement>,
    /// Impedance terminating every feed network.
    pub load_impedance: CScalar,
    /// Whether sweeps also compute input impedance and reflection coefficient.
    pub compute_port_response: bool,
}

impl AntennaModel {
    /// Model with a precomputed per-step segment and grid positions.
    #[must_use]
    pub fn new(segment: LineSegment, grid: Vec<Scalar>) -> Self {
        Self {
            segment,
            grid,
            elements: Vec::new(),
            load_impedance: DEFAULT_LOAD_IMPEDANCE,
            compute_port_response: false,
        }
    }

    /// Model derived from line and grid settings.
    #[must_use]
    pub fn from_settings(line: &LineSettings, grid: &GridSettings) -> Self {
        let segment = line.rlgc().segment(grid.step());
        tracing::debug!(
            r = segment.r,
            l_nh = segment.l * 1e9,
            g = segment.g,
            c_pf = segment.c * 1e12,
            "per-step line parameters"
        );
        Self::new(segment, grid.positions())
    }

    /// Replaces the element list.
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<AntennaElement>) -> Self {
        self.elements = elements;
        self
    }

    /// Appends one element.
    #[must_use]
    pub fn with_element(mut self, element: AntennaElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Overrides the feed termination impedance.
    #[must_use]
    pub const fn with_load_impedance(mut self, load: CScalar) -> Self {
        self.load_impedance = load;
        self
    }

    /// Enables input impedance / reflection coefficient output in sweeps.
    #[must_use]
    pub const fn with_port_response(mut self, enabled: bool) -> Self {
        self.compute_port_response = enabled;
        self
    }

    /// Number of grid points.
    #[must_use]
    pub fn grid_len(&self) -> usize {
        self.grid.len()
    }

    /// Grid indices of every declared feed, in declaration order.
    #[must_use]
    pub fn feed_indices(&self) -> Vec<usize> {
        self.elements
            .iter()
            .filter(|e| e.is_feed())
            .map(|e| e.index)
            .collect()
    }
}
