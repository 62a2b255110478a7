//! I/O helpers for exporting calculation results.

pub mod csv;

pub use csv::{write_distribution_csv, write_port_response_csv};
