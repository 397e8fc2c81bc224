//! Event type definitions for progress reporting.

use crate::core::group::{GroupId, GroupKind};
use crate::core::source::ImageRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted by an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Run-level events (phase, progress, outcome)
    Run(RunEvent),
    /// Item and group level events from inside a stage
    Stage(StageEvent),
}

impl Event {
    /// Whether this is the last run-level event of a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Run(RunEvent::Completed { .. }) | Event::Run(RunEvent::Cancelled)
        )
    }
}

/// Run-level events, sent only by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// A run has started
    Started { run_id: Uuid, total_items: usize },
    /// Moving to a new phase
    PhaseChanged { phase: RunPhase },
    /// Overall progress changed
    Progress(RunProgress),
    /// Run completed and published its groups
    Completed { summary: RunSummary },
    /// Run was cancelled; nothing was published
    Cancelled,
}

/// Overall progress of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgress {
    /// Phase that produced this update
    pub phase: RunPhase,
    /// Monotonic fraction of the whole run, in [0, 1]
    pub fraction: f64,
    /// Human-readable status line
    pub message: String,
}

/// Events from inside a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageEvent {
    /// An item could not be read or computed and was skipped
    ItemSkipped {
        phase: RunPhase,
        item: ImageRef,
        reason: String,
    },
    /// A duplicate group was discovered
    GroupFound {
        group_id: GroupId,
        kind: GroupKind,
        size: usize,
    },
}

/// Phases of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    NotStarted,
    Hashing,
    Clustering,
    Scoring,
    Completed,
    Cancelled,
}

impl RunPhase {
    /// Whether the run has reached a phase it will never leave
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Cancelled)
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Photos submitted to the run
    pub total_items: usize,
    /// Number of exact-duplicate groups
    pub exact_groups: usize,
    /// Number of near-duplicate groups
    pub near_groups: usize,
    /// Photos that could be removed (group members minus representatives)
    pub duplicate_count: usize,
    /// Items skipped by any stage
    pub skipped_items: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::NotStarted => write!(f, "Not started"),
            RunPhase::Hashing => write!(f, "Hashing"),
            RunPhase::Clustering => write!(f, "Clustering"),
            RunPhase::Scoring => write!(f, "Scoring"),
            RunPhase::Completed => write!(f, "Completed"),
            RunPhase::Cancelled => write!(f, "Cancelled"),
        }
    }
}
