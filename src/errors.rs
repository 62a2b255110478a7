//! Shared error types and calculation diagnostics.

use std::fmt;

use thiserror::Error;

use crate::circuits::expression::ParseError;
use crate::circuits::twoport::NumericError;
use crate::simulation::CalculationError;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum AntlineError {
    /// Wraps network-expression parse errors.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Wraps numeric degeneracies that escaped local recovery.
    #[error(transparent)]
    Numeric(#[from] NumericError),
    /// Wraps structural calculation failures.
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    /// Raised when the background worker cannot be started or joined.
    #[error("worker error: {0}")]
    Worker(String),
}

/// How serious a reported condition is.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Computation degraded locally and continued.
    Warning,
    /// A step failed; its contribution was skipped or the call aborted.
    Error,
}

/// Calculation stage a diagnostic originated from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Input validation before any per-frequency work.
    Setup,
    /// Transmission-line unit cell evaluation.
    UnitCell,
    /// Element or feed matrix substitution into the chain.
    ElementAssembly,
    /// Two-sided propagation for one feed.
    FeedSolve,
    /// Port response (input impedance / reflection) evaluation.
    PortResponse,
}

/// Where in the calculation a diagnostic was raised.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Stage of the calculation.
    pub step: Step,
    /// Analysis frequency in hertz, when one applies.
    pub frequency_hz: Option<f64>,
    /// Grid index of the element or feed involved, when one applies.
    pub grid_index: Option<usize>,
}

impl StepContext {
    /// Context with no frequency or grid index attached.
    #[must_use]
    pub const fn new(step: Step) -> Self {
        Self {
            step,
            frequency_hz: None,
            grid_index: None,
        }
    }

    /// Attaches an analysis frequency.
    #[must_use]
    pub const fn at_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = Some(frequency_hz);
        self
    }

    /// Attaches a grid index.
    #[must_use]
    pub const fn at_index(mut self, grid_index: usize) -> Self {
        self.grid_index = Some(grid_index);
        self
    }
}

impl fmt::Display for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.step)?;
        if let Some(hz) = self.frequency_hz {
            write!(f, " @ {hz:.6e} Hz")?;
        }
        if let Some(idx) = self.grid_index {
            write!(f, " [grid {idx}]")?;
        }
        Ok(())
    }
}

/// Structured (message, severity, context) notification.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity of the condition.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Calculation step that raised it.
    pub context: StepContext,
}

impl Diagnostic {
    /// Warning-level diagnostic.
    #[must_use]
    pub fn warning(context: StepContext, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            context,
        }
    }

    /// Error-level diagnostic.
    #[must_use]
    pub fn error(context: StepContext, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            context,
        }
    }

    fn log(&self) {
        match self.severity {
            Severity::Warning => tracing::warn!(context = %self.context, "{}", self.message),
            Severity::Error => tracing::error!(context = %self.context, "{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({}): {}", self.severity, self.context, self.message)
    }
}

/// Receives progress and diagnostic notifications while a calculation runs.
///
/// Both methods default to no-ops so callers only implement what they need.
pub trait CalculationObserver {
    /// Sweep progress in percent, monotonically non-decreasing from 0 to 100.
    fn on_progress(&mut self, _percent: u8) {}

    /// A condition was reported during the calculation.
    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

impl CalculationObserver for () {}

/// Fans diagnostics out to `tracing`, an optional observer, and a local list.
pub struct DiagnosticSink<'a> {
    observer: Option<&'a mut dyn CalculationObserver>,
    collected: Vec<Diagnostic>,
    last_progress: Option<u8>,
}

impl<'a> DiagnosticSink<'a> {
    /// Sink forwarding to `observer`.
    #[must_use]
    pub fn new(observer: &'a mut dyn CalculationObserver) -> Self {
        Self {
            observer: Some(observer),
            collected: Vec::new(),
            last_progress: None,
        }
    }

    /// Sink that only logs and collects.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            observer: None,
            collected: Vec::new(),
            last_progress: None,
        }
    }

    /// Logs, forwards, and records `diagnostic`.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_diagnostic(&diagnostic);
        }
        self.collected.push(diagnostic);
    }

    /// Forwards a progress update, dropping values that would run backwards.
    pub fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last_progress.is_some_and(|last| percent < last) {
            return;
        }
        self.last_progress = Some(percent);
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_progress(percent);
        }
    }

    /// Diagnostics reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.collected
    }

    /// Consumes the sink, returning everything it recorded.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.collected
    }
}

impl fmt::Debug for DiagnosticSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("observer", &self.observer.is_some())
            .field("collected", &self.collected.len())
            .finish()
    }
}
