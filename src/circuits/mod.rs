//! Lumped networks, two-ports, and transmission-line unit cells.

/// Lumped leaf components (pF / nH / Ω tokens).
pub mod component;
/// Impedance expression parser (`+` series, `/` parallel).
pub mod expression;
/// `S(...)`/`P(...)` two-port networks and the feed adapter.
pub mod network;
/// Two-port network representation.
pub mod twoport;
/// Transmission line primitives and ABCD parameterization.
pub mod transmission;

pub use component::{Component, Lumped};
pub use expression::{CircuitExpr, Operator, ParseError};
pub use network::{ConnectionKind, Network, NetworkError};
pub use transmission::{LineSegment, TransmissionLine, RLGC};
pub use twoport::{NumericError, TwoPort};
