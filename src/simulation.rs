//! Single-frequency and swept distribution calculations.
//!
//! [`LineCalculator`] owns the chain buffer it rebuilds at every frequency,
//! so every entry point takes `&mut self`: one calculation at a time per
//! calculator. Each call re-derives everything from the model snapshot;
//! only the returned result survives the call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use num_complex::Complex;

use crate::antenna::chain::LineChain;
use crate::antenna::element::{resolve_placements, Placement};
use crate::antenna::solver::{solve_distribution, Distribution};
use crate::circuits::twoport::C;
use crate::config::AntennaModel;
use crate::errors::{CalculationObserver, Diagnostic, DiagnosticSink, Step, StepContext};
use crate::math::Scalar;

/// Structural failures that abort a whole calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    /// The sweep was given no frequencies.
    #[error("frequency array is empty")]
    EmptyFrequencies,
    /// The model has no grid points.
    #[error("grid has no points")]
    EmptyGrid,
    /// Cancellation was requested mid-sweep.
    #[error("sweep cancelled after {completed} of {total} frequency points")]
    Cancelled {
        /// Frequency points fully computed before the cancel was observed.
        completed: usize,
        /// Frequency points requested.
        total: usize,
    },
}

/// Cooperative cancellation flag, checked once per frequency point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a single-frequency calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySolution {
    /// `N × F` voltage and current matrices.
    pub distribution: Distribution,
    /// Everything reported while computing it.
    pub diagnostics: Vec<Diagnostic>,
}

/// Distributions stacked over frequency: `[freq][grid][feed]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepResult {
    /// Analysis frequencies (Hz) in sweep order.
    pub frequencies: Vec<Scalar>,
    /// One distribution per frequency.
    pub distributions: Vec<Distribution>,
    /// Input impedance per frequency; empty unless port response is enabled.
    pub input_impedance: Vec<C>,
    /// Reflection coefficient per frequency; empty unless port response is enabled.
    pub reflection_coefficient: Vec<C>,
    /// Everything reported during the sweep.
    pub diagnostics: Vec<Diagnostic>,
}

impl SweepResult {
    /// `(frequencies, grid points, feeds)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.distributions
            .first()
            .map_or((0, 0, 0), |d| (self.distributions.len(), d.grid_len(), d.feed_count()))
    }

    /// Voltage at frequency index `freq`, grid index `grid`, feed column `feed`.
    #[must_use]
    pub fn voltage(&self, freq: usize, grid: usize, feed: usize) -> Option<C> {
        self.distributions.get(freq)?.voltage.get((grid, feed)).copied()
    }

    /// Current at frequency index `freq`, grid index `grid`, feed column `feed`.
    #[must_use]
    pub fn current(&self, freq: usize, grid: usize, feed: usize) -> Option<C> {
        self.distributions.get(freq)?.current.get((grid, feed)).copied()
    }
}

/// Calculation entry points over one [`AntennaModel`] snapshot.
#[derive(Debug, Clone)]
pub struct LineCalculator {
    model: AntennaModel,
    chain: LineChain,
}

impl LineCalculator {
    /// Calculator over `model`.
    #[must_use]
    pub fn new(model: AntennaModel) -> Self {
        Self {
            model,
            chain: LineChain::new(),
        }
    }

    /// Current model snapshot.
    #[must_use]
    pub const fn model(&self) -> &AntennaModel {
        &self.model
    }

    /// Replaces the model snapshot used by later calls.
    pub fn set_model(&mut self, model: AntennaModel) {
        self.model = model;
    }

    /// Chain assembled by the most recent calculation.
    #[must_use]
    pub const fn chain(&self) -> &LineChain {
        &self.chain
    }

    /// Voltage/current distribution at `hz`.
    pub fn calculate_single_frequency(&mut self, hz: Scalar) -> Result<FrequencySolution, CalculationError> {
        self.calculate_single_frequency_with(hz, &mut ())
    }

    /// As [`Self::calculate_single_frequency`], notifying `observer`.
    pub fn calculate_single_frequency_with(
        &mut self,
        hz: Scalar,
        observer: &mut dyn CalculationObserver,
    ) -> Result<FrequencySolution, CalculationError> {
        let mut sink = DiagnosticSink::new(observer);
        let grid_len = self.model.grid_len();
        if grid_len == 0 {
            return Err(abort(&mut sink, CalculationError::EmptyGrid));
        }
        tracing::info!(hz, grid_len, "single-frequency calculation");

        let placements = resolve_placements(&self.model.elements, grid_len, &mut sink);
        let feeds = self.model.feed_indices();
        let distribution = self.solve_point(&placements, &feeds, hz, &mut sink);
        Ok(FrequencySolution {
            distribution,
            diagnostics: sink.into_diagnostics(),
        })
    }

    /// Distributions for every frequency of `hz`, in order.
    pub fn run_frequency_sweep(&mut self, hz: &[Scalar]) -> Result<SweepResult, CalculationError> {
        self.run_frequency_sweep_with(hz, &mut (), &CancelToken::new())
    }

    /// As [`Self::run_frequency_sweep`], reporting progress to `observer` and
    /// honouring `cancel` between frequency points.
    pub fn run_frequency_sweep_with(
        &mut self,
        hz: &[Scalar],
        observer: &mut dyn CalculationObserver,
        cancel: &CancelToken,
    ) -> Result<SweepResult, CalculationError> {
        let mut sink = DiagnosticSink::new(observer);
        let grid_len = self.model.grid_len();
        if hz.is_empty() {
            return Err(abort(&mut sink, CalculationError::EmptyFrequencies));
        }
        if grid_len == 0 {
            return Err(abort(&mut sink, CalculationError::EmptyGrid));
        }
        if hz.windows(2).any(|w| w[1] < w[0]) {
            sink.report(Diagnostic::warning(
                StepContext::new(Step::Setup),
                "frequency array is not ascending",
            ));
        }
        tracing::info!(points = hz.len(), grid_len, "frequency sweep started");

        let placements = resolve_placements(&self.model.elements, grid_len, &mut sink);
        let feeds = self.model.feed_indices();
        let total = hz.len();
        let mut result = SweepResult {
            frequencies: Vec::with_capacity(total),
            distributions: Vec::with_capacity(total),
            ..SweepResult::default()
        };
        sink.progress(0);

        for (idx, &f) in hz.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(cancelled(idx, total));
            }
            let distribution = self.solve_point(&placements, &feeds, f, &mut sink);
            let port = self
                .model
                .compute_port_response
                .then(|| self.port_response(f, &mut sink));
            if cancel.is_cancelled() {
                // The point in flight is discarded.
                return Err(cancelled(idx, total));
            }

            result.frequencies.push(f);
            result.distributions.push(distribution);
            if let Some((zin, gamma)) = port {
                result.input_impedance.push(zin);
                result.reflection_coefficient.push(gamma);
            }
            sink.progress(percent(idx + 1, total));
        }

        tracing::info!(points = total, "frequency sweep finished");
        result.diagnostics = sink.into_diagnostics();
        Ok(result)
    }

    fn solve_point(
        &mut self,
        placements: &[Placement],
        feeds: &[usize],
        hz: Scalar,
        sink: &mut DiagnosticSink<'_>,
    ) -> Distribution {
        self.chain.rebuild(
            &self.model.segment,
            self.model.grid_len(),
            placements,
            hz,
            self.model.load_impedance,
            sink,
        );
        solve_distribution(&self.chain, feeds, sink)
    }

    /// Input impedance and reflection of the chain just assembled; NaN on failure.
    fn port_response(&self, hz: Scalar, sink: &mut DiagnosticSink<'_>) -> (C, C) {
        self.chain
            .port_response(self.model.load_impedance)
            .unwrap_or_else(|err| {
                sink.report(Diagnostic::warning(
                    StepContext::new(Step::PortResponse).at_frequency(hz),
                    err.to_string(),
                ));
                let nan = Complex::new(Scalar::NAN, Scalar::NAN);
                (nan, nan)
            })
    }
}

fn abort(sink: &mut DiagnosticSink<'_>, err: CalculationError) -> CalculationError {
    sink.report(Diagnostic::error(StepContext::new(Step::Setup), err.to_string()));
    err
}

fn cancelled(completed: usize, total: usize) -> CalculationError {
    tracing::info!(completed, total, "frequency sweep cancelled");
    CalculationError::Cancelled { completed, total }
}

fn percent(done: usize, total: usize) -> u8 {
    // Integer maths keeps the final report at exactly 100.
    u8::try_from(done * 100 / total).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::antenna::element::AntennaElement;
    use crate::circuits::transmission::RLGC;
    use crate::errors::Severity;

    fn model(grid_len: usize) -> AntennaModel {
        let grid = (0..grid_len).map(|i| i as Scalar * 1e-3).collect();
        AntennaModel::new(RLGC::lossless(250e-9, 100e-12).segment(1e-3), grid)
    }

    #[derive(Default)]
    struct Progress(Vec<u8>);

    impl CalculationObserver for Progress {
        fn on_progress(&mut self, percent: u8) {
            self.0.push(percent);
        }
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let mut calc = LineCalculator::new(model(6).with_element(AntennaElement::feed(2, "S(50o)")));
        let mut progress = Progress::default();
        let freqs = [1.0e9, 2.0e9, 3.0e9];
        calc.run_frequency_sweep_with(&freqs, &mut progress, &CancelToken::new())
            .unwrap();
        assert_eq!(progress.0, vec![0, 33, 66, 100]);
    }

    #[test]
    fn empty_inputs_abort_before_any_work() {
        let mut calc = LineCalculator::new(model(4));
        assert_eq!(calc.run_frequency_sweep(&[]), Err(CalculationError::EmptyFrequencies));
        let mut empty = LineCalculator::new(model(0));
        assert_eq!(empty.run_frequency_sweep(&[1.0e9]), Err(CalculationError::EmptyGrid));
        assert_eq!(
            empty.calculate_single_frequency(1.0e9),
            Err(CalculationError::EmptyGrid)
        );
        assert!(empty.chain().is_empty());
    }

    #[test]
    fn cancelled_sweep_returns_no_result() {
        let mut calc = LineCalculator::new(model(4).with_element(AntennaElement::feed(1, "")));
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = calc
            .run_frequency_sweep_with(&[1.0e9, 2.0e9], &mut (), &cancel)
            .unwrap_err();
        assert_eq!(err, CalculationError::Cancelled { completed: 0, total: 2 });
    }

    /// Cancels the shared token on the `progress_limit`-th progress report
    /// above zero or the `diagnostic_limit`-th diagnostic.
    struct CancelAfter {
        cancel: CancelToken,
        progress_limit: Option<usize>,
        diagnostic_limit: Option<usize>,
        progress: Vec<u8>,
        diagnostics: usize,
    }

    impl CancelAfter {
        fn new(cancel: &CancelToken) -> Self {
            Self {
                cancel: cancel.clone(),
                progress_limit: None,
                diagnostic_limit: None,
                progress: Vec::new(),
                diagnostics: 0,
            }
        }
    }

    impl CalculationObserver for CancelAfter {
        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
            let advanced = self.progress.iter().filter(|&&p| p > 0).count();
            if self.progress_limit == Some(advanced) {
                self.cancel.cancel();
            }
        }

        fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {
            self.diagnostics += 1;
            if self.diagnostic_limit == Some(self.diagnostics) {
                self.cancel.cancel();
            }
        }
    }

    #[test]
    fn cancel_between_points_keeps_completed_count() {
        let mut calc = LineCalculator::new(model(6).with_element(AntennaElement::feed(2, "S(50o)")));
        let cancel = CancelToken::new();
        let mut observer = CancelAfter::new(&cancel);
        observer.progress_limit = Some(1);
        let err = calc
            .run_frequency_sweep_with(&[1.0e9, 2.0e9, 3.0e9], &mut observer, &cancel)
            .unwrap_err();
        assert_eq!(err, CalculationError::Cancelled { completed: 1, total: 3 });
        assert_eq!(observer.progress, vec![0, 33]);
    }

    #[test]
    fn cancel_during_point_discards_it() {
        // A shorted shunt element warns once per frequency point.
        let model = model(6)
            .with_element(AntennaElement::element(1, "P(0o)"))
            .with_element(AntennaElement::feed(3, "S(50o)"));
        let mut calc = LineCalculator::new(model);
        let cancel = CancelToken::new();
        let mut observer = CancelAfter::new(&cancel);
        observer.diagnostic_limit = Some(2);
        let err = calc
            .run_frequency_sweep_with(&[1.0e9, 2.0e9, 3.0e9], &mut observer, &cancel)
            .unwrap_err();
        // The second point raised the cancel while in flight, so only the first counts.
        assert_eq!(err, CalculationError::Cancelled { completed: 1, total: 3 });
        assert_eq!(observer.progress, vec![0, 33]);
        assert_eq!(observer.diagnostics, 2);
    }

    #[test]
    fn port_response_is_opt_in() {
        let freqs = [1.0e9, 2.0e9];
        let mut calc = LineCalculator::new(model(8));
        let plain = calc.run_frequency_sweep(&freqs).unwrap();
        assert!(plain.input_impedance.is_empty());
        assert!(plain.reflection_coefficient.is_empty());

        calc.set_model(model(8).with_port_response(true));
        let with_port = calc.run_frequency_sweep(&freqs).unwrap();
        assert_eq!(with_port.input_impedance.len(), 2);
        // A uniform 50 Ω line terminated in 50 Ω is matched.
        for gamma in &with_port.reflection_coefficient {
            assert!(gamma.norm() < 1e-9);
        }
        assert_relative_eq!(with_port.input_impedance[0].re, 50.0, max_relative = 1e-9);
    }

    #[test]
    fn non_ascending_frequencies_warn() {
        let mut calc = LineCalculator::new(model(3));
        let result = calc.run_frequency_sweep(&[2.0e9, 1.0e9]).unwrap();
        assert_eq!(result.shape(), (2, 3, 0));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
    }
}
