//! Per-frequency ABCD chain for the whole line.

use crate::circuits::transmission::LineSegment;
use crate::circuits::twoport::{reflection_coefficient, NumericError, TwoPort, C};
use crate::errors::{Diagnostic, DiagnosticSink, Step, StepContext};
use crate::math::Scalar;

use super::element::{Placement, Role};

/// Ordered ABCD matrices, one per grid point.
///
/// Entry `g` links grid point `g` to grid point `g + 1`. Grid points without
/// an element hold the unit cell of the line at the chain's frequency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineChain {
    frequency_hz: Scalar,
    unit_cell: TwoPort,
    cells: Vec<TwoPort>,
}

impl LineChain {
    /// Empty chain; call [`LineChain::rebuild`] before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain of `grid_len` unit cells with no element overrides.
    #[must_use]
    pub fn uniform(unit_cell: TwoPort, grid_len: usize) -> Self {
        Self {
            frequency_hz: 0.0,
            unit_cell,
            cells: vec![unit_cell; grid_len],
        }
    }

    /// Assembles a fresh chain at `hz`.
    #[must_use]
    pub fn assemble(
        segment: &LineSegment,
        grid_len: usize,
        placements: &[Placement],
        hz: Scalar,
        load: C,
        sink: &mut DiagnosticSink<'_>,
    ) -> Self {
        let mut chain = Self::new();
        chain.rebuild(segment, grid_len, placements, hz, load, sink);
        chain
    }

    /// Overwrites this chain in place for frequency `hz`.
    ///
    /// Every entry is reset to the unit cell, then each placement's two-port
    /// (element cascade, or feed shunt terminated by `load`) replaces the
    /// entry at its index. A degenerate unit cell becomes the identity; a
    /// degenerate element leaves the unit cell in place. Both are reported.
    pub fn rebuild(
        &mut self,
        segment: &LineSegment,
        grid_len: usize,
        placements: &[Placement],
        hz: Scalar,
        load: C,
        sink: &mut DiagnosticSink<'_>,
    ) {
        self.frequency_hz = hz;
        self.unit_cell = match segment.twoport(hz) {
            Ok(cell) => cell,
            Err(err) => {
                sink.report(Diagnostic::warning(
                    StepContext::new(Step::UnitCell).at_frequency(hz),
                    format!("unit cell: {err}; using identity"),
                ));
                TwoPort::identity()
            }
        };
        tracing::debug!(hz, unit_cell = ?self.unit_cell, "unit cell");

        self.cells.clear();
        self.cells.resize(grid_len, self.unit_cell);

        for placement in placements {
            let ctx = StepContext::new(Step::ElementAssembly)
                .at_frequency(hz)
                .at_index(placement.index);
            let Some(slot) = self.cells.get_mut(placement.index) else {
                sink.report(Diagnostic::error(
                    ctx,
                    format!("index {} outside chain of {grid_len}, skipped", placement.index),
                ));
                continue;
            };
            let result = match placement.role {
                Role::Element => placement.network.element_twoport(hz),
                Role::Feed => placement.network.feed_twoport(hz, load),
            };
            match result {
                Ok(twoport) => *slot = twoport,
                Err(err) => sink.report(Diagnostic::warning(
                    ctx,
                    format!("{:?} `{}`: {err}; keeping unit cell", placement.role, placement.network),
                )),
            }
        }
    }

    /// Frequency the chain was assembled for (Hz).
    #[must_use]
    pub const fn frequency_hz(&self) -> Scalar {
        self.frequency_hz
    }

    /// Unit cell shared by every grid point without an element.
    #[must_use]
    pub const fn unit_cell(&self) -> &TwoPort {
        &self.unit_cell
    }

    /// Number of entries (equals the grid length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Entry at grid index `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TwoPort> {
        self.cells.get(index)
    }

    /// Overrides entry `index`; returns false when it is out of range.
    pub fn set(&mut self, index: usize, twoport: TwoPort) -> bool {
        match self.cells.get_mut(index) {
            Some(slot) => {
                *slot = twoport;
                true
            }
            None => false,
        }
    }

    /// All entries in grid order.
    #[must_use]
    pub fn as_slice(&self) -> &[TwoPort] {
        &self.cells
    }

    /// Product of every entry from the left end to the right end.
    #[must_use]
    pub fn total(&self) -> TwoPort {
        TwoPort::cascade_all(&self.cells)
    }

    /// Input impedance at the left end with the right end terminated by `load`.
    pub fn input_impedance(&self, load: C) -> Result<C, NumericError> {
        self.total().input_impedance(load)
    }

    /// Input impedance and reflection coefficient against `load`.
    pub fn port_response(&self, load: C) -> Result<(C, C), NumericError> {
        let zin = self.input_impedance(load)?;
        Ok((zin, reflection_coefficient(zin, load)?))
    }
}

impl std::ops::Index<usize> for LineChain {
    type Output = TwoPort;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}
