//! # photo-triage CLI
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! photo-triage analyze ~/Photos --threshold 0.25
//! photo-triage analyze ~/Photos --verbose --output json
//! photo-triage config
//! ```

mod cli;

use photo_triage::Result;

fn main() -> Result<()> {
    cli::run()
}
