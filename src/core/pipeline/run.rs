//! Run-level state and its single writer.

use super::config::ProgressSlices;
use super::progress::ProgressTracker;
use crate::core::group::DuplicateGroup;
use crate::error::ItemError;
use crate::events::{Event, EventSender, RunEvent, RunPhase, RunProgress, RunSummary, StageEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Observable state of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub phase: RunPhase,
    /// Monotonic fraction in [0, 1]; exactly 1.0 only once completed
    pub progress: f64,
    pub message: String,
    /// Published groups; `Some` only when the phase is `Completed`
    pub groups: Option<Vec<DuplicateGroup>>,
    pub summary: Option<RunSummary>,
}

impl RunSnapshot {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            phase: RunPhase::NotStarted,
            progress: 0.0,
            message: "Waiting to start".to_string(),
            groups: None,
            summary: None,
        }
    }
}

/// Shared, read-mostly view of a run's snapshot
#[derive(Debug, Clone)]
pub struct SharedRunState {
    inner: Arc<RwLock<RunSnapshot>>,
}

impl SharedRunState {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RunSnapshot::new(run_id))),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RunSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut RunSnapshot)) {
        let mut state = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut state);
    }
}

/// The only writer of run-level state.
///
/// Owned by the orchestrator's control thread; stage workers report
/// through their stage, never through this type.
pub struct RunRecorder {
    state: SharedRunState,
    events: EventSender,
    progress: ProgressTracker,
    run_id: Uuid,
    on_terminal: Option<Box<dyn FnOnce() + Send>>,
}

impl RunRecorder {
    pub fn new(state: SharedRunState, events: EventSender, slices: ProgressSlices) -> Self {
        let run_id = state.snapshot().run_id;
        Self {
            state,
            events,
            progress: ProgressTracker::new(slices),
            run_id,
            on_terminal: None,
        }
    }

    /// Run `release` once, just before the terminal state becomes visible.
    ///
    /// If the recorder is dropped without reaching a terminal state,
    /// `release` is dropped unrun.
    pub(crate) fn on_terminal(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.on_terminal = Some(Box::new(release));
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started(&mut self, total_items: usize) {
        info!(run_id = %self.run_id, total_items, "Analysis started");
        self.events.send(Event::Run(RunEvent::Started {
            run_id: self.run_id,
            total_items,
        }));
    }

    pub fn enter_phase(&mut self, phase: RunPhase, message: String) {
        let fraction = self.progress.enter(phase);
        debug!(run_id = %self.run_id, %phase, "Phase changed");

        self.state.update(|s| {
            s.phase = phase;
            s.progress = fraction;
            s.message = message.clone();
        });
        self.events.send(Event::Run(RunEvent::PhaseChanged { phase }));
        self.publish_progress(phase, fraction, message);
    }

    /// Record that `done` of `total` items of `phase` have been processed
    pub fn item_done(&mut self, phase: RunPhase, done: usize, total: usize) {
        let fraction = self.progress.stage(phase, done, total);
        let message = format!("{} photo {} of {}", verb(phase), done, total);

        self.state.update(|s| {
            s.progress = fraction;
            s.message = message.clone();
        });
        self.publish_progress(phase, fraction, message);
    }

    /// Log and announce items a stage had to skip
    pub fn skipped(&mut self, phase: RunPhase, errors: &[ItemError]) {
        for error in errors {
            debug!(%phase, item = %error.item(), reason = %error, "Skipped item");
            self.events.send(Event::Stage(StageEvent::ItemSkipped {
                phase,
                item: error.item().clone(),
                reason: error.to_string(),
            }));
        }
    }

    pub fn group_found(&mut self, group: &DuplicateGroup) {
        self.events.send(Event::Stage(StageEvent::GroupFound {
            group_id: group.id(),
            kind: group.kind(),
            size: group.members().len(),
        }));
    }

    /// Publish the final groups; progress becomes exactly 1.0
    pub fn complete(&mut self, groups: Vec<DuplicateGroup>, summary: RunSummary, message: String) {
        let fraction = self.progress.complete();
        info!(
            run_id = %self.run_id,
            groups = groups.len(),
            skipped = summary.skipped_items,
            duration_ms = summary.duration_ms,
            "Analysis completed"
        );

        self.release();
        self.state.update(|s| {
            s.phase = RunPhase::Completed;
            s.progress = fraction;
            s.message = message.clone();
            s.groups = Some(groups);
            s.summary = Some(summary.clone());
        });
        self.publish_progress(RunPhase::Completed, fraction, message);
        self.events.send(Event::Run(RunEvent::Completed { summary }));
    }

    /// Terminate without publishing anything
    pub fn cancelled(&mut self) {
        info!(run_id = %self.run_id, "Analysis cancelled");
        self.terminate("Analysis cancelled".to_string());
    }

    /// Terminate after a run-level failure; nothing is published
    pub fn failed(&mut self, reason: &str) {
        warn!(run_id = %self.run_id, reason, "Analysis stopped");
        self.terminate(format!("Analysis stopped: {}", reason));
    }

    fn terminate(&mut self, message: String) {
        let fraction = self.progress.current();
        self.release();
        self.state.update(|s| {
            s.phase = RunPhase::Cancelled;
            s.message = message.clone();
            s.groups = None;
            s.summary = None;
        });
        self.publish_progress(RunPhase::Cancelled, fraction, message);
        self.events.send(Event::Run(RunEvent::Cancelled));
    }

    fn release(&mut self) {
        if let Some(release) = self.on_terminal.take() {
            release();
        }
    }

    fn publish_progress(&self, phase: RunPhase, fraction: f64, message: String) {
        self.events.send(Event::Run(RunEvent::Progress(RunProgress {
            phase,
            fraction,
            message,
        })));
    }
}

fn verb(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Hashing => "Hashing",
        RunPhase::Clustering => "Comparing",
        RunPhase::Scoring => "Scoring",
        _ => "Processing",
    }
}
