//! Background runs with a single-run guard.

use super::config::AnalysisConfig;
use super::executor::{Capabilities, Pipeline};
use super::run::{RunRecorder, RunSnapshot, SharedRunState};
use crate::core::source::ImageRef;
use crate::core::stage::CancellationToken;
use crate::error::{AnalysisError, StageError};
use crate::events::EventSender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, warn};
use uuid::Uuid;

/// Starts analysis runs, at most one at a time
pub struct Analyzer {
    capabilities: Capabilities,
    active: Arc<AtomicBool>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl Analyzer {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is currently in flight
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a run on a background control thread.
    ///
    /// Fails with [`AnalysisError::ConcurrentRunRejected`] while another
    /// run is active; the active run is not affected.
    ///
    /// The run takes ownership of `events`, so the observer's stream ends
    /// with the run. The analyzer accepts a new run as soon as the terminal
    /// event is sent, before the control thread exits.
    pub fn start_run(
        &self,
        refs: Vec<ImageRef>,
        config: AnalysisConfig,
        events: EventSender,
    ) -> Result<RunHandle, AnalysisError> {
        let pipeline = Pipeline::new(config, self.capabilities.clone())?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected a new run while another is active");
            return Err(AnalysisError::ConcurrentRunRejected);
        }
        let guard = ActiveRunGuard(Arc::clone(&self.active));

        let run_id = Uuid::new_v4();
        let state = SharedRunState::new(run_id);
        let cancel = CancellationToken::new();
        // Observers reacting to the terminal state can start the next run
        let mut recorder =
            RunRecorder::new(state.clone(), events, pipeline.config().progress_slices)
                .on_terminal(move || drop(guard));
        let run_cancel = cancel.clone();

        let control = thread::Builder::new()
            .name("photo-triage-run".to_string())
            .spawn(move || {
                if let Err(e) = pipeline.run(&refs, &run_cancel, &mut recorder) {
                    error!(%run_id, error = %e, "Analysis failed");
                }
            })
            .map_err(|e| StageError::WorkerPool(e.to_string()))?;

        Ok(RunHandle {
            run_id,
            state,
            cancel,
            control: Some(control),
        })
    }

    /// Request cancellation of `run`
    pub fn cancel(&self, run: &RunHandle) {
        run.cancel();
    }
}

/// Releases the single-run guard when dropped
struct ActiveRunGuard(Arc<AtomicBool>);

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to one background run
pub struct RunHandle {
    run_id: Uuid,
    state: SharedRunState,
    cancel: CancellationToken,
    control: Option<JoinHandle<()>>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Current phase, progress, message and (once completed) groups
    pub fn snapshot(&self) -> RunSnapshot {
        self.state.snapshot()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the control thread has finished
    pub fn is_finished(&self) -> bool {
        self.control.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Block until the run is terminal; the analyzer is idle afterwards
    pub fn wait(mut self) -> RunSnapshot {
        if let Some(handle) = self.control.take() {
            if handle.join().is_err() {
                error!(run_id = %self.run_id, "Analysis thread panicked");
            }
        }
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{MemoryReader, TableExtractor, TableScorer};
    use crate::events::{self, null_sender, Event, RunEvent, RunPhase};

    fn capabilities() -> Capabilities {
        Capabilities {
            reader: Arc::new(
                MemoryReader::new()
                    .with("/a.jpg", b"same")
                    .with("/b.jpg", b"same"),
            ),
            extractor: Arc::new(TableExtractor::new().with(b"same", 1.0)),
            scorer: Arc::new(TableScorer::new().with(b"same", 0.5)),
            ..Capabilities::default()
        }
    }

    #[test]
    fn run_completes_and_releases_guard() {
        let analyzer = Analyzer::new(capabilities());
        let handle = analyzer
            .start_run(
                vec![ImageRef::from("/a.jpg"), ImageRef::from("/b.jpg")],
                AnalysisConfig::new().stage_concurrency(2),
                null_sender(),
            )
            .unwrap();

        let snapshot = handle.wait();
        assert_eq!(snapshot.phase, RunPhase::Completed);
        assert_eq!(snapshot.progress, 1.0);
        assert_eq!(snapshot.groups.map(|g| g.len()), Some(1));
        assert!(!analyzer.is_active());
    }

    #[test]
    fn invalid_config_does_not_take_the_guard() {
        let analyzer = Analyzer::new(capabilities());
        let result = analyzer.start_run(
            Vec::new(),
            AnalysisConfig::new().cancellation_check_interval(0),
            null_sender(),
        );

        assert!(matches!(result, Err(AnalysisError::Config(_))));
        assert!(!analyzer.is_active());
    }

    #[test]
    fn runs_can_follow_each_other() {
        let analyzer = Analyzer::new(capabilities());
        for _ in 0..3 {
            let handle = analyzer
                .start_run(Vec::new(), AnalysisConfig::new(), null_sender())
                .unwrap();
            assert_eq!(handle.wait().phase, RunPhase::Completed);
        }
    }

    #[test]
    fn observer_can_start_next_run_on_terminal_event() {
        let analyzer = Analyzer::new(capabilities());
        let (sender, receiver) = events::channel();
        let first = analyzer
            .start_run(
                vec![ImageRef::from("/a.jpg"), ImageRef::from("/b.jpg")],
                AnalysisConfig::new().stage_concurrency(2),
                sender,
            )
            .unwrap();

        let terminal = receiver.until_terminal().last();
        assert!(matches!(terminal, Some(Event::Run(RunEvent::Completed { .. }))));

        let second = analyzer.start_run(Vec::new(), AnalysisConfig::new(), null_sender());
        assert!(second.is_ok());

        assert_eq!(first.wait().phase, RunPhase::Completed);
        assert_eq!(second.unwrap().wait().phase, RunPhase::Completed);
        assert!(!analyzer.is_active());
    }

    #[test]
    fn dropped_recorder_releases_guard() {
        let active = Arc::new(AtomicBool::new(true));
        let guard = ActiveRunGuard(Arc::clone(&active));
        let recorder = RunRecorder::new(
            SharedRunState::new(Uuid::new_v4()),
            null_sender(),
            Default::default(),
        )
        .on_terminal(move || drop(guard));

        drop(recorder);
        assert!(!active.load(Ordering::SeqCst));
    }
}
