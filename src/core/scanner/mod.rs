//! # Scanner Module
//!
//! Discovers photo files in directories and turns them into [`ImageRef`]s.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - WebP (.webp)
//! - HEIC (.heic, .heif) - iPhone photos
//! - GIF (.gif)
//! - BMP (.bmp)
//! - TIFF (.tiff, .tif)
//!
//! ## Ordering
//! Roots are visited in the order given; within a root, photos are
//! sorted by path. The same tree always yields the same sequence.
//!
//! ## Example
//! ```rust,ignore
//! use photo_triage::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Users/photos".into()]);
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::source::ImageRef;
use crate::error::ScanError;
use std::path::PathBuf;

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Discovered photos in deterministic order
    pub images: Vec<ImageRef>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for photo scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait ImageScanner: Send + Sync {
    /// Scan roots and return discovered photos; failures are recorded, not raised
    fn scan(&self, roots: &[PathBuf]) -> ScanResult;
}
