//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageScanner, ScanResult};
use crate::core::source::ImageRef;
use crate::error::ScanError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Scan a single root, which may be a directory or a single photo
    fn scan_root(&self, root: &Path, images: &mut Vec<ImageRef>, errors: &mut Vec<ScanError>) {
        if root.is_file() {
            if self.filter.should_include(root) {
                images.push(ImageRef::new(root));
            }
            return;
        }

        if !root.is_dir() {
            errors.push(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
            return;
        }

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let mut found = Vec::new();

        for entry_result in walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry))
        {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    if self.filter.should_include(entry.path()) {
                        found.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
                        }
                    };

                    debug!(error = %error, "Skipping unreadable entry");
                    errors.push(error);
                }
            }
        }

        found.sort();
        debug!(root = %root.display(), photos = found.len(), "Scanned root");
        images.extend(found.into_iter().map(ImageRef::from));
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, roots: &[PathBuf]) -> ScanResult {
        let mut result = ScanResult::default();

        for root in roots {
            self.scan_root(root, &mut result.images, &mut result.errors);
        }

        result
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
