//! Antenna line model: element placement, chain assembly, and the solver.

/// Element and feed placement on the grid.
pub mod element;
/// Per-frequency ABCD chain assembly.
pub mod chain;
/// Voltage/current distribution solver.
pub mod solver;

pub use chain::LineChain;
pub use element::{AntennaElement, ElementKind, Placement, Role};
pub use solver::{Distribution, FeedError, FeedProfile};
