//! Background frequency sweeps.
//!
//! A [`SweepWorker`] moves a [`LineCalculator`] onto its own thread, runs one
//! sweep, and streams [`CalculationEvent`]s back over a channel so a caller's
//! event loop can poll without blocking.
//!
//! ```ignore
//! let worker = SweepWorker::spawn(calculator, frequencies)?;
//! while let Some(event) = worker.recv() {
//!     if let CalculationEvent::Finished(result) = event {
//!         // ...
//!     }
//! }
//! let calculator = worker.join()?;
//! ```

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::errors::{AntlineError, CalculationObserver, Diagnostic};
use crate::math::Scalar;
use crate::simulation::{CalculationError, CancelToken, LineCalculator, SweepResult};

/// Messages from the sweep thread.
#[derive(Debug, Clone, PartialEq)]
pub enum CalculationEvent {
    /// The sweep thread picked up the job.
    Started {
        /// Number of frequency points requested.
        points: usize,
    },
    /// Sweep progress in percent.
    Progress(u8),
    /// A condition reported during the sweep.
    Diagnostic(Diagnostic),
    /// Final outcome; always the last event.
    Finished(Result<SweepResult, CalculationError>),
}

/// Forwards observer callbacks into the event channel.
struct ChannelObserver {
    tx: Sender<CalculationEvent>,
}

impl CalculationObserver for ChannelObserver {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(CalculationEvent::Progress(percent));
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        let _ = self.tx.send(CalculationEvent::Diagnostic(diagnostic.clone()));
    }
}

/// Handle to a sweep running on a background thread.
pub struct SweepWorker {
    rx: Receiver<CalculationEvent>,
    handle: Option<JoinHandle<LineCalculator>>,
    cancel: CancelToken,
}

impl SweepWorker {
    /// Starts sweeping `frequencies` with `calculator` on a new thread.
    pub fn spawn(calculator: LineCalculator, frequencies: Vec<Scalar>) -> Result<Self, AntlineError> {
        Self::spawn_with_cancel(calculator, frequencies, CancelToken::new())
    }

    /// As [`Self::spawn`], sharing an existing cancellation token.
    pub fn spawn_with_cancel(
        mut calculator: LineCalculator,
        frequencies: Vec<Scalar>,
        cancel: CancelToken,
    ) -> Result<Self, AntlineError> {
        let (tx, rx) = mpsc::channel();
        let thread_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("antline-sweep".to_owned())
            .spawn(move || {
                let _ = tx.send(CalculationEvent::Started {
                    points: frequencies.len(),
                });
                let mut observer = ChannelObserver { tx: tx.clone() };
                let result =
                    calculator.run_frequency_sweep_with(&frequencies, &mut observer, &thread_cancel);
                if let Err(err) = &result {
                    tracing::warn!("background sweep ended early: {err}");
                }
                let _ = tx.send(CalculationEvent::Finished(result));
                calculator
            })
            .map_err(|e| AntlineError::Worker(format!("failed to spawn sweep thread: {e}")))?;

        Ok(Self {
            rx,
            handle: Some(handle),
            cancel,
        })
    }

    /// Next pending event without blocking.
    ///
    /// `None` means either that no event is pending yet or that the thread has
    /// exited and every event was drained. [`CalculationEvent::Finished`] is
    /// always the last event, and [`Self::is_running`] tells the two apart.
    pub fn poll(&self) -> Option<CalculationEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks for the next event; `None` once the thread has exited and every
    /// event was drained.
    pub fn recv(&self) -> Option<CalculationEvent> {
        self.rx.recv().ok()
    }

    /// Asks the sweep to stop before its next frequency point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the sweep thread.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Whether the sweep thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the thread and hands the calculator back for reuse.
    pub fn join(mut self) -> Result<LineCalculator, AntlineError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| AntlineError::Worker("sweep thread already joined".to_owned()))?;
        handle
            .join()
            .map_err(|_| AntlineError::Worker("sweep thread panicked".to_owned()))
    }
}

impl Drop for SweepWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for SweepWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepWorker")
            .field("running", &self.is_running())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antenna::element::AntennaElement;
    use crate::circuits::transmission::RLGC;
    use crate::config::AntennaModel;

    fn calculator() -> LineCalculator {
        let grid = (0..9).map(|i| i as Scalar * 1e-3).collect();
        let model = AntennaModel::new(RLGC::lossless(250e-9, 100e-12).segment(1e-3), grid)
            .with_element(AntennaElement::feed(4, "S(10n)"));
        LineCalculator::new(model)
    }

    fn drain(worker: &SweepWorker) -> Vec<CalculationEvent> {
        std::iter::from_fn(|| worker.recv()).collect()
    }

    #[test]
    fn background_sweep_matches_foreground() {
        let freqs = vec![1.0e9, 2.0e9, 3.0e9, 4.0e9];
        let expected = calculator().run_frequency_sweep(&freqs).unwrap();

        let worker = SweepWorker::spawn(calculator(), freqs).unwrap();
        let events = drain(&worker);
        assert_eq!(events.first(), Some(&CalculationEvent::Started { points: 4 }));
        assert!(events.contains(&CalculationEvent::Progress(100)));
        match events.last() {
            Some(CalculationEvent::Finished(Ok(result))) => assert_eq!(result, &expected),
            other => panic!("unexpected final event: {other:?}"),
        }
        let calc = worker.join().unwrap();
        assert_eq!(calc.chain().len(), 9);
    }

    #[test]
    fn poll_is_empty_once_thread_has_exited() {
        let worker = SweepWorker::spawn(calculator(), vec![1.0e9]).unwrap();
        loop {
            match worker.poll() {
                Some(CalculationEvent::Finished(result)) => {
                    assert!(result.is_ok());
                    break;
                }
                Some(_) => {}
                None => std::thread::yield_now(),
            }
        }
        while worker.is_running() {
            std::thread::yield_now();
        }
        assert_eq!(worker.poll(), None);
        assert!(!worker.is_running());
        worker.join().unwrap();
    }

    #[test]
    fn cancelled_token_finishes_with_error() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let worker = SweepWorker::spawn_with_cancel(calculator(), vec![1.0e9, 2.0e9], cancel).unwrap();
        let events = drain(&worker);
        assert_eq!(
            events.last(),
            Some(&CalculationEvent::Finished(Err(CalculationError::Cancelled {
                completed: 0,
                total: 2
            })))
        );
        assert!(!events.iter().any(|e| matches!(e, CalculationEvent::Progress(p) if *p > 0)));
        worker.join().unwrap();
    }

    #[test]
    fn empty_frequencies_report_diagnostic_then_error() {
        let worker = SweepWorker::spawn(calculator(), Vec::new()).unwrap();
        let events = drain(&worker);
        assert!(matches!(events[1], CalculationEvent::Diagnostic(_)));
        assert_eq!(
            events.last(),
            Some(&CalculationEvent::Finished(Err(CalculationError::EmptyFrequencies)))
        );
    }
}
