// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Archive expansion into a scratch directory

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::ExtractionCapabilities;
use crate::config::ProcessingConfig;
use crate::models::FileInfo;
use crate::Result;

/// Bounds applied while expanding a single archive
#[derive(Debug, Clone, Copy)]
pub struct ArchiveLimits {
    pub max_entries: usize,
    pub max_total_bytes: u64,
}

impl ArchiveLimits {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            max_entries: config.max_archive_entries,
            max_total_bytes: config.max_archive_bytes,
        }
    }
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self::from_config(&ProcessingConfig::default())
    }
}

/// Turn an entry name into a relative path that stays inside the target
/// directory. Returns `None` when nothing usable is left.
pub fn sanitize_entry_path(name: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." | ".." => continue,
            s if s.ends_with(':') || s.contains('\0') => continue,
            s => clean.push(s),
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// Expand `archive` under `dest` and return the written files.
///
/// Only ZIP is supported. Unsupported formats and a missing ZIP backend yield
/// an empty list, so the caller falls back to treating the archive as opaque.
pub fn expand(
    archive: &FileInfo,
    dest: &Path,
    capabilities: &ExtractionCapabilities,
    limits: &ArchiveLimits,
) -> Result<Vec<PathBuf>> {
    if archive.extension != "zip" {
        info!("Expansion of .{} archives is not supported: {:?}", archive.extension, archive.path);
        return Ok(Vec::new());
    }
    if !capabilities.zip {
        warn!("ZIP support unavailable, treating {:?} as an opaque file", archive.path);
        return Ok(Vec::new());
    }
    expand_zip(&archive.path, dest, limits)
}

#[cfg(feature = "archives")]
fn expand_zip(path: &Path, dest: &Path, limits: &ArchiveLimits) -> Result<Vec<PathBuf>> {
    use std::fs::{self, File};
    use std::io::Read;

    use crate::TagvaultError;

    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| TagvaultError::Archive(format!("Failed to open ZIP: {}", e)))?;

    let mut extracted = Vec::new();
    let mut total_bytes: u64 = 0;

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry #{} in {:?}: {}", i, path, e);
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let Some(relative) = sanitize_entry_path(entry.name()) else {
            warn!("Skipping entry with unusable path {:?} in {:?}", entry.name(), path);
            continue;
        };
        let target = dest.join(&relative);
        if target.exists() {
            warn!("Skipping {:?} in {:?}: an earlier entry already maps to {:?}", entry.name(), path, relative);
            continue;
        }

        if extracted.len() >= limits.max_entries {
            warn!("{:?} has more than {} files, stopping expansion", path, limits.max_entries);
            break;
        }
        let remaining = limits.max_total_bytes.saturating_sub(total_bytes);
        if entry.size() > remaining {
            warn!("{:?} exceeds {} expanded bytes, stopping expansion", path, limits.max_total_bytes);
            break;
        }

        let written = (|| -> Result<u64> {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            // declared sizes can lie, so the copy itself is bounded too
            Ok(std::io::copy(&mut (&mut entry).take(remaining), &mut out)?)
        })();

        match written {
            Ok(bytes) => {
                total_bytes += bytes;
                extracted.push(target);
            }
            Err(e) => {
                warn!("Failed to extract {:?} from {:?}: {}", relative, path, e);
                let _ = fs::remove_file(&target);
            }
        }
    }

    info!("Expanded {} files from {:?}", extracted.len(), path);
    Ok(extracted)
}

#[cfg(not(feature = "archives"))]
fn expand_zip(path: &Path, _dest: &Path, _limits: &ArchiveLimits) -> Result<Vec<PathBuf>> {
    warn!("Built without ZIP support, treating {:?} as an opaque file", path);
    Ok(Vec::new())
}
