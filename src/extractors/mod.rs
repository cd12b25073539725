// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Content extraction for the different file types
//!
//! Extraction never fails from the caller's point of view: every error is
//! logged and turned into `None`, which simply means "no text representation".

pub mod archive;
pub mod document;
pub mod image;
pub mod spreadsheet;

use std::path::Path;
use tracing::{debug, warn};

use crate::config::ProcessingConfig;
use crate::models::{FileInfo, FileType};
use crate::render::format_bytes;
use crate::Result;

/// Ceiling for anything read as text
pub const TEXT_SIZE_CEILING: u64 = 10 * 1024 * 1024;

/// Ceiling for files that are only probed for metadata
pub const MEDIA_SIZE_CEILING: u64 = 50 * 1024 * 1024;

/// Optional extraction backends available to this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionCapabilities {
    pub pdf: bool,
    pub docx: bool,
    pub zip: bool,
    pub exif: bool,
}

impl ExtractionCapabilities {
    /// What the binary was compiled with
    pub fn detect() -> Self {
        Self {
            pdf: cfg!(feature = "pdf"),
            docx: cfg!(feature = "archives"),
            zip: cfg!(feature = "archives"),
            exif: cfg!(feature = "exif"),
        }
    }

    /// No optional backend at all
    pub fn none() -> Self {
        Self {
            pdf: false,
            docx: false,
            zip: false,
            exif: false,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.pdf { names.push("pdf"); }
        if self.docx { names.push("docx"); }
        if self.zip { names.push("zip"); }
        if self.exif { names.push("exif"); }
        names
    }
}

impl Default for ExtractionCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    pub extract_text: bool,
    pub text_ceiling: u64,
    pub media_ceiling: u64,
}

impl ExtractionLimits {
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self {
            extract_text: config.extract_text,
            ..Self::default()
        }
    }
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            extract_text: true,
            text_ceiling: TEXT_SIZE_CEILING,
            media_ceiling: MEDIA_SIZE_CEILING,
        }
    }
}

/// Produces a text representation of a file, if it has one
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    limits: ExtractionLimits,
    capabilities: ExtractionCapabilities,
}

impl ContentExtractor {
    pub fn new(limits: ExtractionLimits, capabilities: ExtractionCapabilities) -> Self {
        Self { limits, capabilities }
    }

    pub fn capabilities(&self) -> &ExtractionCapabilities {
        &self.capabilities
    }

    fn ceiling_for(&self, file_type: FileType) -> u64 {
        match file_type {
            FileType::Image | FileType::Media | FileType::Archive => self.limits.media_ceiling,
            _ => self.limits.text_ceiling,
        }
    }

    /// Extract content, degrading every failure to `None`
    pub fn extract(&self, file: &FileInfo) -> Option<String> {
        if !self.limits.extract_text {
            return None;
        }

        let ceiling = self.ceiling_for(file.file_type);
        if file.size > ceiling {
            debug!(
                "Skipping extraction of {:?}: {} exceeds {}",
                file.path,
                format_bytes(file.size),
                format_bytes(ceiling)
            );
            return None;
        }

        let result = match file.file_type {
            FileType::Document => document::extract(file, &self.capabilities),
            FileType::Code => read_text(&file.path).map(Some),
            FileType::Data if spreadsheet::handles(&file.extension) => {
                spreadsheet::extract(&file.path).map(Some)
            }
            FileType::Data => read_text(&file.path).map(Some),
            FileType::Image => Ok(Some(image::describe(file, &self.capabilities))),
            FileType::Media => Ok(Some(describe_media(file))),
            FileType::Archive => Ok(Some(describe_archive(file))),
            FileType::Unknown => sniff_text(&file.path),
        };

        match result {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to extract content from {:?}: {}", file.path, e);
                None
            }
        }
    }
}

/// Read a file as UTF-8, replacing invalid sequences
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Fewer than 10% control characters (tab, CR and LF excluded)
pub fn looks_like_text(content: &str) -> bool {
    let mut total = 0usize;
    let mut control = 0usize;
    for c in content.chars() {
        total += 1;
        if c.is_control() && !matches!(c, '\t' | '\n' | '\r') {
            control += 1;
        }
    }
    control * 10 < total || total == 0
}

fn sniff_text(path: &Path) -> Result<Option<String>> {
    let content = read_text(path)?;
    if looks_like_text(&content) {
        Ok(Some(content))
    } else {
        debug!("Treating {:?} as binary", path);
        Ok(None)
    }
}

fn describe_media(file: &FileInfo) -> String {
    format!(
        "Media file: {}\nExtension: {}\nSize: {}\nCreated: {}",
        file.name,
        file.extension,
        format_bytes(file.size),
        file.created.format("%Y-%m-%d")
    )
}

fn describe_archive(file: &FileInfo) -> String {
    format!(
        "Archive file: {}\nSize: {}\nContents are not inspected for security reasons.",
        file.extension.to_uppercase(),
        format_bytes(file.size)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use chrono::{Local, TimeZone};
    use std::fs;
    use tempfile::TempDir;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(ExtractionLimits::default(), ExtractionCapabilities::none())
    }

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> FileInfo {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        FileInfo::from_path(&path).unwrap()
    }

    #[test]
    fn test_plain_text_round_trip() {
        let dir = TempDir::new().unwrap();
        let text = "Meeting notes\n\tagenda: ship it\r\nüñíçødé\n";
        let file = write(&dir, "notes.txt", text.as_bytes());
        assert_eq!(extractor().extract(&file).as_deref(), Some(text));
    }

    #[test]
    fn test_code_and_data_read_raw() {
        let dir = TempDir::new().unwrap();
        let code = write(&dir, "main.py", b"print('hi')\n");
        let data = write(&dir, "rows.csv", b"a,b\n1,2\n");
        assert_eq!(extractor().extract(&code).as_deref(), Some("print('hi')\n"));
        assert_eq!(extractor().extract(&data).as_deref(), Some("a,b\n1,2\n"));
    }

    #[test]
    fn test_oversize_file_is_not_read() {
        // The path does not exist, so any read attempt would fail loudly in the log
        // and still return None; the size check must short-circuit first.
        let when = Local.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let file = FileInfo {
            path: "/nonexistent/huge.txt".into(),
            name: "huge.txt".to_string(),
            extension: "txt".to_string(),
            size: TEXT_SIZE_CEILING + 1,
            created: when,
            modified: when,
            file_type: classify("txt"),
        };
        assert_eq!(extractor().extract(&file), None);

        let video = FileInfo {
            path: "/nonexistent/movie.mp4".into(),
            name: "movie.mp4".to_string(),
            extension: "mp4".to_string(),
            size: MEDIA_SIZE_CEILING + 1,
            file_type: classify("mp4"),
            ..file.clone()
        };
        assert_eq!(extractor().extract(&video), None);

        let small_video = FileInfo {
            size: TEXT_SIZE_CEILING + 1,
            ..video
        };
        assert!(extractor().extract(&small_video).is_some());
    }

    #[test]
    fn test_binary_threshold() {
        // 100 characters, 9 of them control characters: text
        let mut below = "a".repeat(91);
        below.push_str(&"\u{1}".repeat(9));
        assert!(looks_like_text(&below));

        // exactly 10%: binary
        let mut at = "a".repeat(90);
        at.push_str(&"\u{1}".repeat(10));
        assert!(!looks_like_text(&at));

        // whitespace controls do not count
        assert!(looks_like_text("\t\t\n\n\r\r"));
    }

    #[test]
    fn test_unknown_type_sniffing() {
        let dir = TempDir::new().unwrap();
        let mut text = "x".repeat(95);
        text.push_str(&"\u{0}".repeat(5));
        let textual = write(&dir, "readme.nfo", text.as_bytes());
        assert_eq!(extractor().extract(&textual).as_deref(), Some(text.as_str()));

        let binary = write(&dir, "blob.bin", &[0u8, 1, 2, 3, 4, 5, 65, 66]);
        assert_eq!(extractor().extract(&binary), None);
    }

    #[test]
    fn test_disabled_extraction() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "notes.txt", b"hello");
        let limits = ExtractionLimits {
            extract_text: false,
            ..ExtractionLimits::default()
        };
        let extractor = ContentExtractor::new(limits, ExtractionCapabilities::none());
        assert_eq!(extractor.extract(&file), None);
    }

    #[test]
    fn test_pdf_without_capability_is_none() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "paper.pdf", b"%PDF-1.4 not really");
        assert_eq!(extractor().extract(&file), None);
    }

    #[test]
    fn test_odt_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "letter.odt", b"PK");
        assert_eq!(extractor().extract(&file), None);
    }

    #[test]
    fn test_archive_and_media_summaries() {
        let dir = TempDir::new().unwrap();
        let archive = write(&dir, "bundle.zip", &[0u8; 2048]);
        let summary = extractor().extract(&archive).unwrap();
        assert!(summary.contains("ZIP"));
        assert!(summary.contains("2 KB"));
        assert!(summary.contains("security"));

        let song = write(&dir, "song.mp3", &[0u8; 10]);
        let summary = extractor().extract(&song).unwrap();
        assert!(summary.contains("song.mp3"));
        assert!(summary.contains("10 Bytes"));
    }

    #[test]
    fn test_missing_file_degrades_to_none() {
        let dir = TempDir::new().unwrap();
        let mut file = write(&dir, "gone.txt", b"soon gone");
        fs::remove_file(&file.path).unwrap();
        file.size = 9;
        assert_eq!(extractor().extract(&file), None);
    }
}
