//! # Events Module
//!
//! Event-driven progress reporting for any presentation layer.
//!
//! ## Design
//! The orchestrator emits events through a channel, allowing any UI
//! (CLI, GUI, web) to subscribe and display progress. Workers never
//! send run-level events; only the orchestrator does.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = events::channel();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.until_terminal() {
//!         if let Event::Run(RunEvent::Progress(p)) = event {
//!             println!("{:.0}% {}", p.fraction * 100.0, p.message);
//!         }
//!     }
//! });
//!
//! let handle = analyzer.start_run(refs, config, sender)?;
//! ```

mod channel;
mod types;

pub use channel::{bounded_channel, channel, null_sender, EventReceiver, EventSender};
pub use types::*;
