//! Two-sided boundary propagation of voltage and current for each feed.
//!
//! For a grid of `N` points the solver works on `N + 2` nodes: node 0 is the
//! left guard, node `N + 1` the right guard, and node `g + 1` holds grid
//! point `g`. Every node starts at `V = 0`, `I = 1`; this unit-current
//! normalisation is not physically scaled.
//!
//! For a feed at grid index `k`:
//!
//! 1. Forward, nodes `2..=k+1`: node `n` is chain entry `n - 2` applied to node `n - 1`.
//! 2. Backward, nodes `N..=k+2` descending: node `n` is the inverse of chain
//!    entry `n - 1` applied to node `n + 1`.
//! 3. The right-hand nodes `k+2..=N+1` are scaled by `V[k+1] / V[k+2]` when
//!    `V[k+2] != 0`, matching the two sweeps.
//! 4. `I[k+1] = I[k] + I[k+2]` enforces current continuity at the feed.
//! 5. The guards are dropped, leaving the feed's column.

use nalgebra::DMatrix;
use num_complex::Complex;
use thiserror::Error;

use crate::circuits::twoport::{NumericError, C};
use crate::errors::{Diagnostic, DiagnosticSink, Step, StepContext};
use crate::math::Scalar;

use super::chain::LineChain;

/// Failure solving the distribution for one feed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// Feed index does not name a grid point.
    #[error("feed index {index} outside grid of {grid_len} points")]
    OutOfRange {
        /// Offending index.
        index: usize,
        /// Grid length.
        grid_len: usize,
    },
    /// A chain entry on the backward sweep could not be inverted.
    #[error("backward sweep at grid {grid_index}: {source}")]
    Inversion {
        /// Grid index of the singular entry.
        grid_index: usize,
        /// Underlying numeric failure.
        #[source]
        source: NumericError,
    },
}

/// Voltage/current state on the guard-extended node array.
#[derive(Debug, Clone)]
struct GuardedNodes {
    voltage: Vec<C>,
    current: Vec<C>,
}

impl GuardedNodes {
    fn new(grid_len: usize) -> Self {
        Self {
            voltage: vec![Complex::new(0.0, 0.0); grid_len + 2],
            current: vec![Complex::new(1.0, 0.0); grid_len + 2],
        }
    }

    /// Node holding grid point `grid_index`.
    const fn node(grid_index: usize) -> usize {
        grid_index + 1
    }

    fn get(&self, node: usize) -> (C, C) {
        (self.voltage[node], self.current[node])
    }

    fn set(&mut self, node: usize, (v, i): (C, C)) {
        self.voltage[node] = v;
        self.current[node] = i;
    }

    fn scale_from(&mut self, node: usize, factor: C) {
        for v in &mut self.voltage[node..] {
            *v *= factor;
        }
        for i in &mut self.current[node..] {
            *i *= factor;
        }
    }

    /// Grid-point values with both guards removed.
    fn into_interior(mut self) -> (Vec<C>, Vec<C>) {
        let n = self.voltage.len() - 2;
        self.voltage.truncate(n + 1);
        self.voltage.remove(0);
        self.current.truncate(n + 1);
        self.current.remove(0);
        (self.voltage, self.current)
    }
}

/// Voltage and current profiles for one feed excitation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedProfile {
    /// Voltage at each grid point.
    pub voltage: Vec<C>,
    /// Current at each grid point.
    pub current: Vec<C>,
}

/// Solves the distribution over the whole grid for a feed at `feed_index`.
pub fn solve_feed(chain: &LineChain, feed_index: usize) -> Result<FeedProfile, FeedError> {
    let n = chain.len();
    if feed_index >= n {
        return Err(FeedError::OutOfRange {
            index: feed_index,
            grid_len: n,
        });
    }
    let k = feed_index;
    let mut nodes = GuardedNodes::new(n);

    // Left boundary towards the feed.
    for node in 2..=GuardedNodes::node(k) {
        let (v, i) = nodes.get(node - 1);
        nodes.set(node, chain[node - 2].apply(v, i));
    }

    // Right boundary towards the feed.
    for node in (GuardedNodes::node(k) + 1..=n).rev() {
        let inverse = chain[node - 1]
            .inverse()
            .map_err(|source| FeedError::Inversion {
                grid_index: node - 1,
                source,
            })?;
        let (v, i) = nodes.get(node + 1);
        nodes.set(node, inverse.apply(v, i));
    }

    let left = GuardedNodes::node(k);
    let right = left + 1;
    let v_right = nodes.voltage[right];
    if v_right.norm() != 0.0 {
        let factor = nodes.voltage[left] / v_right;
        nodes.scale_from(right, factor);
    }
    nodes.current[left] = nodes.current[left - 1] + nodes.current[right];

    let (voltage, current) = nodes.into_interior();
    Ok(FeedProfile { voltage, current })
}

/// Voltage and current matrices at one frequency: one row per grid point,
/// one column per declared feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// Analysis frequency (Hz).
    pub frequency_hz: Scalar,
    /// `N × F` voltage matrix.
    pub voltage: DMatrix<C>,
    /// `N × F` current matrix.
    pub current: DMatrix<C>,
}

impl Distribution {
    /// All-zero distribution of `grid_len` rows and `feeds` columns.
    #[must_use]
    pub fn zeros(frequency_hz: Scalar, grid_len: usize, feeds: usize) -> Self {
        Self {
            frequency_hz,
            voltage: DMatrix::zeros(grid_len, feeds),
            current: DMatrix::zeros(grid_len, feeds),
        }
    }

    /// Number of grid points (rows).
    #[must_use]
    pub fn grid_len(&self) -> usize {
        self.voltage.nrows()
    }

    /// Number of feed columns.
    #[must_use]
    pub fn feed_count(&self) -> usize {
        self.voltage.ncols()
    }

    /// Voltage profile of feed column `feed`, `None` past the last feed.
    #[must_use]
    pub fn voltage_column(&self, feed: usize) -> Option<Vec<C>> {
        (feed < self.feed_count()).then(|| self.voltage.column(feed).iter().copied().collect())
    }

    /// Current profile of feed column `feed`, `None` past the last feed.
    #[must_use]
    pub fn current_column(&self, feed: usize) -> Option<Vec<C>> {
        (feed < self.feed_count()).then(|| self.current.column(feed).iter().copied().collect())
    }

    fn write_column(&mut self, feed: usize, profile: &FeedProfile) {
        for (row, (v, i)) in profile.voltage.iter().zip(&profile.current).enumerate() {
            self.voltage[(row, feed)] = *v;
            self.current[(row, feed)] = *i;
        }
    }
}

/// Solves every feed in `feeds` against `chain`.
///
/// Column `j` belongs to `feeds[j]`. Feeds that cannot be solved are
/// reported and leave their column at zero.
#[must_use]
pub fn solve_distribution(
    chain: &LineChain,
    feeds: &[usize],
    sink: &mut DiagnosticSink<'_>,
) -> Distribution {
    let hz = chain.frequency_hz();
    let mut distribution = Distribution::zeros(hz, chain.len(), feeds.len());
    for (column, &feed_index) in feeds.iter().enumerate() {
        match solve_feed(chain, feed_index) {
            Ok(profile) => distribution.write_column(column, &profile),
            Err(err) => sink.report(Diagnostic::error(
                StepContext::new(Step::FeedSolve)
                    .at_frequency(hz)
                    .at_index(feed_index),
                format!("feed {column}: {err}; column left at zero"),
            )),
        }
    }
    distribution
}
