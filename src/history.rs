// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Placement journal for undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::engine::move_file;
use crate::{Result, TagvaultError};

/// How the original reached the originals tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Moved,
    Copied,
}

/// One organized top-level file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_path: PathBuf,
    pub original_dest: PathBuf,
    pub placement: Placement,
    /// Notes written for the file and, for archives, for every member
    pub markdown_paths: Vec<PathBuf>,
    /// Archive members placed in the originals tree
    #[serde(default)]
    pub member_paths: Vec<PathBuf>,
    pub file_hash: String,
    #[serde(default)]
    pub undone: bool,
}

impl HistoryEntry {
    pub fn new(
        source_path: PathBuf,
        original_dest: PathBuf,
        placement: Placement,
        markdown_paths: Vec<PathBuf>,
        member_paths: Vec<PathBuf>,
        file_hash: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source_path,
            original_dest,
            placement,
            markdown_paths,
            member_paths,
            file_hash,
            undone: false,
        }
    }
}

/// What undoing an entry did (or would do)
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    pub removed: Vec<PathBuf>,
    pub restored: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// JSONL history file
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Failed to parse history entry: {}", e);
                }
            }
        }

        Ok(entries)
    }

    /// Most recent entries first
    pub fn get_recent(&self, count: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    /// Entries not yet undone, most recent first
    pub fn get_undoable(&self) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self.read_all()?.into_iter().filter(|e| !e.undone).collect();
        entries.reverse();
        Ok(entries)
    }

    pub fn mark_undone(&self, id: &str) -> Result<()> {
        let entries = self.read_all()?;

        // Rewrite the whole file with the flag set
        let file = File::create(&self.path)?;
        let mut writer = io::BufWriter::new(file);

        for mut entry in entries {
            if entry.id == id {
                entry.undone = true;
            }
            let json = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;

        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// blake3 digest of a file, hex encoded
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Reverse one placement: drop generated notes and members, then put the
/// original back (moves) or delete the copy (copies).
pub fn undo_entry(entry: &HistoryEntry, dry_run: bool) -> Result<UndoReport> {
    let mut report = UndoReport::default();

    if !entry.original_dest.exists() {
        return Err(TagvaultError::SourceMissing(entry.original_dest.clone()));
    }
    if entry.placement == Placement::Moved && entry.source_path.exists() {
        return Err(TagvaultError::FileSystem(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists, refusing to overwrite", entry.source_path.display()),
        )));
    }

    if !entry.file_hash.is_empty() {
        match hash_file(&entry.original_dest) {
            Ok(hash) if hash != entry.file_hash => {
                let msg = format!("{} changed since it was organized", entry.original_dest.display());
                warn!("{}", msg);
                report.warnings.push(msg);
            }
            Ok(_) => {}
            Err(e) => warn!("Could not hash {:?}: {}", entry.original_dest, e),
        }
    }

    for path in entry.markdown_paths.iter().chain(entry.member_paths.iter()) {
        if dry_run {
            if path.exists() {
                report.removed.push(path.clone());
            }
        } else if remove_if_present(path)? {
            report.removed.push(path.clone());
        }
    }

    match entry.placement {
        Placement::Moved => {
            if !dry_run {
                if let Some(parent) = entry.source_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                move_file(&entry.original_dest, &entry.source_path)?;
                info!("Restored {:?} -> {:?}", entry.original_dest, entry.source_path);
            }
            report.restored = Some(entry.source_path.clone());
        }
        Placement::Copied => {
            if !dry_run {
                fs::remove_file(&entry.original_dest)?;
                info!("Removed copy {:?}", entry.original_dest);
            }
            report.removed.push(entry.original_dest.clone());
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(dir: &Path, placement: Placement) -> HistoryEntry {
        HistoryEntry::new(
            dir.join("inbox/a.txt"),
            dir.join("originals/a.txt"),
            placement,
            vec![dir.join("vault/a.md")],
            Vec::new(),
            String::new(),
        )
    }

    fn stage(dir: &Path) {
        fs::create_dir_all(dir.join("originals")).unwrap();
        fs::create_dir_all(dir.join("vault")).unwrap();
        fs::write(dir.join("originals/a.txt"), "original").unwrap();
        fs::write(dir.join("vault/a.md"), "# a").unwrap();
    }

    #[test]
    fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("logs/history.jsonl"));

        let first = entry(dir.path(), Placement::Moved);
        let second = entry(dir.path(), Placement::Copied);
        history.append(&first).unwrap();
        history.append(&second).unwrap();

        let all = history.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(history.get_recent(1).unwrap()[0].id, second.id);

        history.mark_undone(&second.id).unwrap();
        let undoable = history.get_undoable().unwrap();
        assert_eq!(undoable.len(), 1);
        assert_eq!(undoable[0].id, first.id);

        history.clear().unwrap();
        assert!(history.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&entry(dir.path(), Placement::Moved)).unwrap();
        fs::write(&path, format!("not json\n\n{}\n", good)).unwrap();
        assert_eq!(History::new(path).read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_undo_moved_file() {
        let dir = TempDir::new().unwrap();
        stage(dir.path());
        let mut e = entry(dir.path(), Placement::Moved);
        e.file_hash = hash_file(&dir.path().join("originals/a.txt")).unwrap();

        let report = undo_entry(&e, false).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("inbox/a.txt")).unwrap(), "original");
        assert!(!dir.path().join("originals/a.txt").exists());
        assert!(!dir.path().join("vault/a.md").exists());
    }

    #[test]
    fn test_undo_dry_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        stage(dir.path());
        let report = undo_entry(&entry(dir.path(), Placement::Moved), true).unwrap();
        assert_eq!(report.removed, vec![dir.path().join("vault/a.md")]);
        assert!(dir.path().join("originals/a.txt").exists());
        assert!(dir.path().join("vault/a.md").exists());
    }

    #[test]
    fn test_undo_copied_file_deletes_copy() {
        let dir = TempDir::new().unwrap();
        stage(dir.path());
        fs::create_dir_all(dir.path().join("inbox")).unwrap();
        fs::write(dir.path().join("inbox/a.txt"), "original").unwrap();

        undo_entry(&entry(dir.path(), Placement::Copied), false).unwrap();
        assert!(dir.path().join("inbox/a.txt").exists());
        assert!(!dir.path().join("originals/a.txt").exists());
    }

    #[test]
    fn test_undo_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        stage(dir.path());
        fs::create_dir_all(dir.path().join("inbox")).unwrap();
        fs::write(dir.path().join("inbox/a.txt"), "newer").unwrap();

        assert!(undo_entry(&entry(dir.path(), Placement::Moved), false).is_err());
        assert!(dir.path().join("originals/a.txt").exists());
    }

    #[test]
    fn test_undo_warns_on_changed_hash() {
        let dir = TempDir::new().unwrap();
        stage(dir.path());
        let mut e = entry(dir.path(), Placement::Moved);
        e.file_hash = "0".repeat(64);
        let report = undo_entry(&e, true).unwrap();
        assert_eq!(report.warnings.len(), 1);
    }
}
