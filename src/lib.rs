#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Physical constants and frequency helpers.
pub mod constants;
/// Shared numerical aliases.
pub mod math;
/// Lumped networks, two-ports, and transmission-line unit cells.
pub mod circuits;
/// Antenna elements, chain assembly, and the distribution solver.
pub mod antenna;
/// Input snapshot and settings derivation.
pub mod config;
/// Single-frequency and swept calculation entry points.
pub mod simulation;
/// Background sweep worker with cooperative cancellation.
pub mod worker;
/// Frequency grids and post-processing helpers.
pub mod sweep;
/// Result export helpers.
pub mod io;
/// Error types and diagnostics shared between modules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
