// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Source directory enumeration

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{ProcessingConfig, SourceConfig};
use crate::models::FileInfo;
use crate::Result;

/// Check if a file should be picked up (not hidden, temporary or OS junk)
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    if filename.starts_with('.') {
        return false;
    }

    // Partial downloads and editor scratch files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download", "~"];
    if temp_extensions.iter().any(|ext| filename.ends_with(ext)) {
        return false;
    }

    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    if skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n)) {
        return false;
    }

    true
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

/// `FileInfo` for a walked path; files that vanish or cannot be read are skipped
fn stat_entry(path: &Path) -> Option<FileInfo> {
    match FileInfo::from_path(path) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("Cannot read {:?}, skipping: {}", path, e);
            None
        }
    }
}

pub struct Scanner {
    sources: Vec<SourceConfig>,
    supported_formats: Vec<String>,
    max_file_size: u64,
}

impl Scanner {
    pub fn new(sources: &[SourceConfig], processing: &ProcessingConfig) -> Self {
        Self {
            sources: sources.to_vec(),
            supported_formats: processing
                .supported_formats
                .iter()
                .map(|f| f.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size: processing.max_file_size,
        }
    }

    /// Every eligible file across enabled sources, per source sorted by name
    pub fn scan(&self) -> Result<Vec<FileInfo>> {
        let mut files = Vec::new();

        for source in self.sources.iter().filter(|s| s.enabled) {
            let root = PathBuf::from(&source.path);
            if !root.is_dir() {
                warn!("Source directory {:?} does not exist, skipping", root);
                continue;
            }

            let before = files.len();
            let mut walker = WalkDir::new(&root).sort_by_file_name();
            if !source.recursive {
                walker = walker.max_depth(1);
            }

            for entry in walker.into_iter().filter_entry(|e| !is_hidden_dir(e)) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("Cannot read entry under {:?}: {}", root, e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !should_process(entry.path()) {
                    continue;
                }

                let Some(file) = stat_entry(entry.path()) else {
                    continue;
                };
                if !self.accepts(&file) {
                    continue;
                }
                files.push(file);
            }

            info!("Found {} files in {:?}", files.len() - before, root);
        }

        Ok(files)
    }

    fn accepts(&self, file: &FileInfo) -> bool {
        if !self.supported_formats.is_empty() && !self.supported_formats.contains(&file.extension) {
            debug!("Skipping unsupported format: {:?}", file.path);
            return false;
        }
        if file.size > self.max_file_size {
            debug!("Skipping oversize file: {:?} ({} bytes)", file.path, file.size);
            return false;
        }
        true
    }
}
