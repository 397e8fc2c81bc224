//! # Source Module
//!
//! Identifies candidate photos and reads their bytes.
//!
//! Every stage reads bytes through a [`ContentReader`], so tests can swap
//! the filesystem for an in-memory table.

mod reader;

pub use reader::{FileContentReader, ImageBytes, MMAP_THRESHOLD};

use crate::error::ItemError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identifier of one candidate photo.
///
/// Unique within a run and never mutated. The engine only compares,
/// orders and displays it; reading is delegated to a [`ContentReader`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Capability that turns an [`ImageRef`] into its raw bytes
pub trait ContentReader: Send + Sync {
    /// Read the full payload of `item`.
    ///
    /// A failure only skips this item; it never stops the run.
    fn read(&self, item: &ImageRef) -> Result<ImageBytes, ItemError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_displays_its_path() {
        let item = ImageRef::new("/photos/beach.jpg");
        assert_eq!(item.to_string(), "/photos/beach.jpg");
        assert_eq!(item.path(), Path::new("/photos/beach.jpg"));
    }

    #[test]
    fn image_refs_order_by_path() {
        let mut items = vec![ImageRef::from("/b.jpg"), ImageRef::from("/a.jpg")];
        items.sort();
        assert_eq!(items[0], ImageRef::from("/a.jpg"));
    }

    #[test]
    fn image_ref_serializes_as_plain_path() {
        let json = serde_json::to_string(&ImageRef::from("/a.jpg")).unwrap();
        assert_eq!(json, "\"/a.jpg\"");
    }
}
