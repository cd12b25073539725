// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Records flowing through the organization pipeline

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::classify;
use crate::Result;

/// Coarse file type derived from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Document,
    Image,
    Code,
    Data,
    Archive,
    Media,
    Unknown,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Document => "document",
            FileType::Image => "image",
            FileType::Code => "code",
            FileType::Data => "data",
            FileType::Archive => "archive",
            FileType::Media => "media",
            FileType::Unknown => "unknown",
        }
    }

    /// "Document", "Image", ...
    pub fn display_name(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    /// Lowercase, without the dot
    pub extension: String,
    pub size: u64,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
    pub file_type: FileType,
}

impl FileInfo {
    /// Stat a file and classify it
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified: DateTime<Local> = meta
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Local::now());
        let created: DateTime<Local> = meta.created().map(DateTime::from).unwrap_or(modified);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let file_type = classify(&extension);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            extension,
            size: meta.len(),
            created,
            modified,
            file_type,
        })
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        if self.extension.is_empty() {
            return &self.name;
        }
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }
}

/// Where a tag suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    Type,
    Context,
    Filename,
    Content,
}

/// A namespaced tag with a confidence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCandidate {
    pub tag: String,
    pub confidence: f64,
    pub source: TagSource,
}

impl TagCandidate {
    pub fn new(tag: impl Into<String>, confidence: f64, source: TagSource) -> Self {
        Self {
            tag: tag.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDecision {
    pub category: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// Extra frontmatter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Text(String),
    Number(u64),
    List(Vec<String>),
}

/// Metadata header of a generated note, rendered in field order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    /// Organized location of the original
    pub original_file: PathBuf,
    /// Where the file was picked up from
    pub source_path: PathBuf,
    pub file_type: String,
    pub created: DateTime<Local>,
    pub processed: DateTime<Local>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, FrontmatterValue)>,
}

impl Frontmatter {
    /// Append an extra field, replacing an earlier one with the same key
    pub fn insert(&mut self, key: impl Into<String>, value: FrontmatterValue) {
        let key = key.into();
        if let Some(slot) = self.extra.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.extra.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.extra.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Outcome of one successfully processed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub file: FileInfo,
    pub markdown_path: PathBuf,
    pub original_path: PathBuf,
    pub content: String,
    pub frontmatter: Frontmatter,
    pub tags: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub file: FileInfo,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Everything a batch run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationResult {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
    pub summary: Summary,
}
