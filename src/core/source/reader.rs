//! Filesystem-backed content reader.
//!
//! Large files are memory-mapped to avoid copying them from the kernel;
//! small files are read into a `Vec`, which is cheaper below the threshold.

use super::{ContentReader, ImageRef};
use crate::error::ItemError;
use memmap2::Mmap;
use std::fs::File;
use std::ops::Deref;

/// Files at or above this size are memory-mapped (1MB)
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Bytes of one photo, either owned or memory-mapped.
#[derive(Debug)]
pub enum ImageBytes {
    /// Heap-allocated bytes
    Owned(Vec<u8>),
    /// Memory-mapped bytes (zero-copy from disk)
    Mapped(Mmap),
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            ImageBytes::Owned(v) => v,
            ImageBytes::Mapped(m) => m,
        }
    }
}

impl Deref for ImageBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        ImageBytes::Owned(bytes)
    }
}

/// Reads photos from the local filesystem
#[derive(Debug, Clone)]
pub struct FileContentReader {
    mmap_threshold: u64,
}

impl FileContentReader {
    pub fn new() -> Self {
        Self {
            mmap_threshold: MMAP_THRESHOLD,
        }
    }

    /// Override the size at which files are memory-mapped
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    fn read_mapped(item: &ImageRef) -> Result<ImageBytes, ItemError> {
        let file = File::open(item.path()).map_err(|e| read_error(item, e))?;

        // SAFETY: the mapping is read-only and the file handle outlives
        // every use of the bytes within a stage item.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| read_error(item, e))?;

        Ok(ImageBytes::Mapped(mmap))
    }
}

impl Default for FileContentReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for FileContentReader {
    fn read(&self, item: &ImageRef) -> Result<ImageBytes, ItemError> {
        let metadata = std::fs::metadata(item.path()).map_err(|e| read_error(item, e))?;

        if !metadata.is_file() {
            return Err(ItemError::Read {
                item: item.clone(),
                reason: "not a regular file".to_string(),
            });
        }

        if metadata.len() >= self.mmap_threshold && metadata.len() > 0 {
            Self::read_mapped(item)
        } else {
            std::fs::read(item.path())
                .map(ImageBytes::Owned)
                .map_err(|e| read_error(item, e))
        }
    }
}

fn read_error(item: &ImageRef, error: std::io::Error) -> ItemError {
    ItemError::Read {
        item: item.clone(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> ImageRef {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        ImageRef::from(path)
    }

    #[test]
    fn reads_small_file_into_memory() {
        let dir = TempDir::new().unwrap();
        let item = write_file(&dir, "small.jpg", b"tiny photo");

        let bytes = FileContentReader::new().read(&item).unwrap();

        assert!(matches!(bytes, ImageBytes::Owned(_)));
        assert_eq!(&*bytes, b"tiny photo");
    }

    #[test]
    fn maps_files_above_threshold() {
        let dir = TempDir::new().unwrap();
        let item = write_file(&dir, "large.jpg", &[7u8; 64]);

        let reader = FileContentReader::new().with_mmap_threshold(16);
        let bytes = reader.read(&item).unwrap();

        assert!(matches!(bytes, ImageBytes::Mapped(_)));
        assert_eq!(bytes.len(), 64);
        assert!(bytes.iter().all(|&b| b == 7));
    }

    #[test]
    fn missing_file_is_a_read_failure() {
        let item = ImageRef::from("/nonexistent/photo/12345.jpg");
        let error = FileContentReader::new().read(&item).unwrap_err();

        assert!(matches!(error, ItemError::Read { .. }));
        assert_eq!(error.item(), &item);
    }

    #[test]
    fn directory_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let item = ImageRef::from(dir.path().to_path_buf());

        assert!(FileContentReader::new().read(&item).is_err());
    }
}
