//! # Stage Module
//!
//! Shared machinery for the three analysis stages.
//!
//! - [`ItemOutcome`] - the per-item result every stage aggregates
//! - [`CancellationToken`] - cooperative cancellation passed to every stage
//! - [`StageRunner`] - bounded worker pool that preserves input order

mod runner;

pub use runner::StageRunner;

use crate::error::ItemError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of processing one item inside a stage.
///
/// A skipped item still counts towards progress; it simply contributes
/// nothing to the stage's result.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Done(T),
    Skipped(ItemError),
}

impl<T> ItemOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, ItemOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            ItemOutcome::Done(value) => Some(value),
            ItemOutcome::Skipped(_) => None,
        }
    }
}

impl<T> From<Result<T, ItemError>> for ItemOutcome<T> {
    fn from(result: Result<T, ItemError>) -> Self {
        match result {
            Ok(value) => ItemOutcome::Done(value),
            Err(error) => ItemOutcome::Skipped(error),
        }
    }
}

/// Cooperative cancellation flag shared between a run and its stages.
///
/// Setting it never interrupts an item that is already being computed;
/// stages observe it between items.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
