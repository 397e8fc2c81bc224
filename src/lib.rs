//! # Photo Triage
//!
//! Finds exact and near-duplicate photos and recommends which one to keep.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - the engine only recommends a keeper per group
//! - **Deterministic** - the same photos always produce the same groups
//! - **Failures stay local** - an unreadable photo is skipped, never fatal
//!
//! ## Architecture
//! The library is split into a core engine (presentation-agnostic) and
//! presentation layers:
//! - `core` - The three-stage analysis engine
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{AnalysisError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// takes precedence over `default_directive` when set.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
