//! Convenience re-exports for building and running antenna line calculations.

pub use crate::antenna::{
    AntennaElement, Distribution, ElementKind, FeedError, FeedProfile, LineChain,
};
pub use crate::circuits::{
    expression::{parse_impedance, parse_impedance_sweep},
    network::{element_abcd, feed_abcd},
    transmission::phase_velocity,
    twoport::reflection_coefficient,
    CircuitExpr, Component, ConnectionKind, LineSegment, Lumped, Network, NumericError,
    ParseError, TransmissionLine, TwoPort, RLGC,
};
pub use crate::config::{AntennaModel, FrequencySettings, GridSettings, LineSettings};
pub use crate::constants::*;
pub use crate::errors::{
    AntlineError, CalculationObserver, Diagnostic, DiagnosticSink, Severity, Step, StepContext,
};
pub use crate::io::{write_distribution_csv, write_port_response_csv};
pub use crate::math::{CScalar, Scalar};
pub use crate::simulation::{
    CalculationError, CancelToken, FrequencySolution, LineCalculator, SweepResult,
};
pub use crate::sweep::{linspace, logspace_hz, mag, mag_db, phase_deg, phase_rad};
pub use crate::worker::{CalculationEvent, SweepWorker};
