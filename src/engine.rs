// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-file organization pipeline
//!
//! Each input file is extracted, tagged, categorized, rendered to a note in
//! the vault and then moved (or copied) into the originals tree. Archives are
//! expanded into a scratch directory first; every member goes through the
//! same pipeline and the archive itself gets a summary note.

use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, OrganizationStyle, OriginalsConfig, TaggingConfig, VaultConfig};
use crate::extractors::archive::{self, ArchiveLimits};
use crate::extractors::{ContentExtractor, ExtractionCapabilities, ExtractionLimits};
use crate::history::{hash_file, History, HistoryEntry, Placement};
use crate::models::{
    FailedFile, FileInfo, FileType, Frontmatter, FrontmatterValue, OrganizationResult, ProcessedFile,
    Summary,
};
use crate::render::{ArchiveMember, ArchiveSummary, MarkdownRenderer};
use crate::suggest::{provider_for, rank_tags, SuggestionProvider};
use crate::{Result, TagvaultError};

/// Number of `contains/` tags on an archive summary
const CONTAINS_TAGS: usize = 5;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub dry_run: bool,
    /// Copy originals instead of moving them
    pub copy: bool,
    /// Logged only; processing is sequential
    pub batch_size: usize,
    /// Fixed "processed" timestamp; captured once per run when unset
    pub processed_at: Option<DateTime<Local>>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            copy: false,
            batch_size: 10,
            processed_at: None,
        }
    }
}

/// State shared by every file of one run
struct Run {
    processed_at: DateTime<Local>,
    dry_run: bool,
    copy: bool,
    claimed: HashSet<PathBuf>,
}

/// Body of a note
enum Body<'a> {
    File(Option<&'a str>),
    Archive(&'a ArchiveSummary),
}

pub struct OrganizationEngine {
    vault: VaultConfig,
    originals: OriginalsConfig,
    tagging: TaggingConfig,
    extractor: ContentExtractor,
    provider: Arc<dyn SuggestionProvider>,
    renderer: MarkdownRenderer,
    archive_limits: ArchiveLimits,
    history: Option<History>,
    temp_root: Option<PathBuf>,
}

impl OrganizationEngine {
    pub fn new(
        vault: VaultConfig,
        originals: OriginalsConfig,
        tagging: TaggingConfig,
        extractor: ContentExtractor,
        provider: Arc<dyn SuggestionProvider>,
    ) -> Self {
        Self {
            vault,
            originals,
            tagging,
            extractor,
            provider,
            renderer: MarkdownRenderer::new(),
            archive_limits: ArchiveLimits::default(),
            history: None,
            temp_root: None,
        }
    }

    /// Engine wired up from a profile, with history enabled
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let extractor = ContentExtractor::new(
            ExtractionLimits::from_config(&config.processing),
            ExtractionCapabilities::detect(),
        );
        let provider = provider_for(&config.ai, &config.tagging)?;

        Ok(Self::new(
            config.vault.clone(),
            config.originals.clone(),
            config.tagging.clone(),
            extractor,
            provider,
        )
        .with_archive_limits(ArchiveLimits::from_config(&config.processing))
        .with_history(History::new(PathBuf::from(&config.history_path))))
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_archive_limits(mut self, limits: ArchiveLimits) -> Self {
        self.archive_limits = limits;
        self
    }

    /// Create archive scratch directories under `root` instead of the system temp dir
    pub fn with_temp_root(mut self, root: PathBuf) -> Self {
        self.temp_root = Some(root);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Process `files` in order; every file ends up in `processed` or `failed`
    pub async fn process_files<F>(
        &self,
        files: &[FileInfo],
        options: &ProcessOptions,
        mut on_progress: F,
    ) -> OrganizationResult
    where
        F: FnMut(usize, usize, &FileInfo),
    {
        let start = Instant::now();
        let total = files.len();
        let mut run = Run {
            processed_at: options.processed_at.unwrap_or_else(Local::now),
            dry_run: options.dry_run,
            copy: options.copy,
            claimed: HashSet::new(),
        };
        debug!(
            "Processing {} files sequentially (batch size {} ignored)",
            total, options.batch_size
        );

        let mut result = OrganizationResult::default();
        let mut successful = 0;

        for (index, file) in files.iter().enumerate() {
            on_progress(index + 1, total, file);

            match self.process_one(file, &mut run).await {
                Ok(mut processed) => {
                    successful += 1;
                    result.processed.append(&mut processed);
                }
                Err(e) => {
                    warn!("Failed to process {:?}: {}", file.path, e);
                    result.failed.push(FailedFile {
                        file: file.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        result.summary = Summary {
            total,
            successful,
            failed: result.failed.len(),
            duration: start.elapsed(),
        };
        info!(
            "Organized {}/{} files ({} failed) in {:?}",
            successful, total, result.summary.failed, result.summary.duration
        );
        result
    }

    async fn process_one(&self, file: &FileInfo, run: &mut Run) -> Result<Vec<ProcessedFile>> {
        if fs::metadata(&file.path).is_err() {
            return Err(TagvaultError::SourceMissing(file.path.clone()));
        }
        info!("Processing {}", file.name);

        if file.file_type == FileType::Archive {
            if let Some(results) = self.process_archive(file, run).await? {
                return Ok(results);
            }
        }

        let processed = self.process_file(file, None, Vec::new(), run).await?;
        self.record(file, &processed, &[], run);
        Ok(vec![processed])
    }

    /// Non-archive pipeline for a top-level file or an archive member
    async fn process_file(
        &self,
        file: &FileInfo,
        project: Option<&str>,
        extra: Vec<(String, FrontmatterValue)>,
        run: &mut Run,
    ) -> Result<ProcessedFile> {
        let content = self.extractor.extract(file);
        let folders = self.existing_folders();

        let suggestion = self.provider.suggest(file, content.as_deref(), &folders).await?;
        let tags: Vec<String> = rank_tags(suggestion.tags, self.tagging.max_tags)
            .into_iter()
            .map(|t| t.tag)
            .collect();
        debug!("{} -> category {} ({})", file.name, suggestion.category.category, suggestion.category.reasoning);

        self.finish(
            file,
            Body::File(content.as_deref()),
            tags,
            suggestion.category.category,
            project,
            extra,
            run,
        )
    }

    /// Expand and organize an archive. `None` means it should be treated as an
    /// ordinary opaque file instead.
    async fn process_archive(&self, file: &FileInfo, run: &mut Run) -> Result<Option<Vec<ProcessedFile>>> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("tagvault-");
            b
        };
        let temp = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let temp = match temp {
            Ok(t) => t,
            Err(e) => {
                warn!("Cannot create scratch directory for {:?}: {}", file.path, e);
                return Ok(None);
            }
        };

        let outcome = self.process_expanded(file, temp.path(), run).await;

        if let Err(e) = temp.close() {
            warn!("Failed to remove scratch directory for {:?}: {}", file.path, e);
        }
        outcome
    }

    async fn process_expanded(
        &self,
        file: &FileInfo,
        scratch: &Path,
        run: &mut Run,
    ) -> Result<Option<Vec<ProcessedFile>>> {
        let expanded = match archive::expand(file, scratch, self.extractor.capabilities(), &self.archive_limits) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Could not expand {:?}, treating it as an opaque file: {}", file.path, e);
                return Ok(None);
            }
        };
        if expanded.is_empty() {
            return Ok(None);
        }

        let project = file.stem().to_string();
        let source_archive = file.path.display().to_string();
        let mut children = Vec::new();

        for path in &expanded {
            let member = match FileInfo::from_path(path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Skipping unreadable archive member {:?}: {}", path, e);
                    continue;
                }
            };
            let extra = vec![(
                "source_archive".to_string(),
                FrontmatterValue::Text(source_archive.clone()),
            )];
            match self.process_file(&member, Some(&project), extra, run).await {
                Ok(processed) => children.push(processed),
                Err(e) => warn!("Skipping archive member {}: {}", member.name, e),
            }
        }

        let summary = ArchiveSummary {
            members: children
                .iter()
                .map(|child| ArchiveMember {
                    name: child.file.name.clone(),
                    category: child.category.clone(),
                    link: self.vault_link(&child.markdown_path),
                })
                .collect(),
        };

        let folders = self.existing_folders();
        let category = match self.provider.suggest_category(file, None, &folders).await {
            Ok(decision) => decision.category,
            Err(e) => {
                warn!("No category for {:?}, using its file type: {}", file.path, e);
                file.file_type.display_name()
            }
        };
        let extra = vec![
            ("archive_type".to_string(), FrontmatterValue::Text(file.extension.clone())),
            ("extracted_files".to_string(), FrontmatterValue::Number(children.len() as u64)),
        ];

        let summary_file = match self.finish(
            file,
            Body::Archive(&summary),
            archive_tags(file, &children),
            category,
            None,
            extra,
            run,
        ) {
            Ok(summary_file) => summary_file,
            Err(e) => {
                // a failed archive leaves no member notes or originals behind
                self.discard(&children, run);
                return Err(e);
            }
        };
        self.record(file, &summary_file, &children, run);

        info!("{} expanded into {} organized files", file.name, children.len());
        children.push(summary_file);
        Ok(Some(children))
    }

    /// Paths, frontmatter, rendering and placement
    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        file: &FileInfo,
        body: Body<'_>,
        tags: Vec<String>,
        category: String,
        project: Option<&str>,
        extra: Vec<(String, FrontmatterValue)>,
        run: &mut Run,
    ) -> Result<ProcessedFile> {
        let markdown_path = claim_unique(self.markdown_path(file, &category), &mut run.claimed);
        let original_path = claim_unique(self.original_path(file, &category, project), &mut run.claimed);

        let frontmatter = Frontmatter {
            title: file.stem().to_string(),
            original_file: original_path.clone(),
            source_path: file.path.clone(),
            file_type: file.extension.clone(),
            created: file.created,
            processed: run.processed_at,
            tags: tags.clone(),
            extra,
        };

        let content = match body {
            Body::File(text) => self.renderer.render(file, text, &frontmatter),
            Body::Archive(summary) => self.renderer.render_archive_summary(file, summary, &frontmatter),
        };

        if run.dry_run {
            debug!("[dry run] {:?} -> {:?}, note {:?}", file.path, original_path, markdown_path);
        } else {
            create_parent(&markdown_path)?;
            create_parent(&original_path)?;
            fs::write(&markdown_path, &content)?;

            let placed = if run.copy {
                fs::copy(&file.path, &original_path).map(|_| ())
            } else {
                move_file(&file.path, &original_path)
            };
            if let Err(e) = placed {
                if let Err(cleanup) = fs::remove_file(&markdown_path) {
                    warn!("Could not remove note {:?} after failed placement: {}", markdown_path, cleanup);
                }
                return Err(e.into());
            }
            debug!("Placed {:?} -> {:?}", file.path, original_path);
        }

        Ok(ProcessedFile {
            file: file.clone(),
            markdown_path,
            original_path,
            content,
            frontmatter,
            tags,
            category,
        })
    }

    /// Remove the notes and placed originals of already organized archive members
    fn discard(&self, members: &[ProcessedFile], run: &Run) {
        if run.dry_run {
            return;
        }
        for member in members {
            for path in [&member.markdown_path, &member.original_path] {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not roll back {:?}: {}", path, e);
                }
            }
        }
    }

    /// Journal a top-level placement; failures only warn
    fn record(&self, file: &FileInfo, processed: &ProcessedFile, members: &[ProcessedFile], run: &Run) {
        let Some(history) = &self.history else {
            return;
        };
        if run.dry_run {
            return;
        }

        let file_hash = hash_file(&processed.original_path).unwrap_or_else(|e| {
            warn!("Could not hash {:?}: {}", processed.original_path, e);
            String::new()
        });
        let mut markdown_paths = vec![processed.markdown_path.clone()];
        markdown_paths.extend(members.iter().map(|m| m.markdown_path.clone()));

        let entry = HistoryEntry::new(
            file.path.clone(),
            processed.original_path.clone(),
            if run.copy { Placement::Copied } else { Placement::Moved },
            markdown_paths,
            members.iter().map(|m| m.original_path.clone()).collect(),
            file_hash,
        );
        if let Err(e) = history.append(&entry) {
            warn!("Failed to record history for {:?}: {}", file.path, e);
        }
    }

    /// Subdirectory names of the vault root, sorted; empty when unreadable
    fn existing_folders(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.vault.path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list vault folders in {}: {}", self.vault.path, e);
                return Vec::new();
            }
        };
        let mut folders: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        folders.sort();
        folders
    }

    fn folder_for(&self, category: &str) -> &str {
        let folders = &self.vault.folders;
        match category.to_lowercase().as_str() {
            "document" => folders.documents.as_str(),
            "image" | "media" => folders.media.as_str(),
            "code" => folders.code.as_str(),
            _ => folders.references.as_str(),
        }
    }

    fn markdown_path(&self, file: &FileInfo, category: &str) -> PathBuf {
        Path::new(&self.vault.path)
            .join(self.folder_for(category))
            .join(format!("{}.md", sanitize_name(file.stem())))
    }

    fn original_path(&self, file: &FileInfo, category: &str, project: Option<&str>) -> PathBuf {
        let mut dir = PathBuf::from(&self.originals.path);
        if self.originals.year_folders {
            dir.push(file.modified.format("%Y").to_string());
        }

        match self.originals.style {
            OrganizationStyle::TypeBased => dir.push(sanitize_name(category)),
            OrganizationStyle::DateBased => {
                dir.push(file.modified.format("%Y").to_string());
                dir.push(file.modified.format("%m").to_string());
            }
            OrganizationStyle::ProjectBased => {
                let project = project.map(str::to_string).or_else(|| {
                    file.path
                        .parent()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                });
                if let Some(project) = project {
                    dir.push(sanitize_name(&project));
                }
            }
        }

        dir.join(&file.name)
    }

    /// Wiki-link target for a note: vault-relative, `/` separated, no `.md`
    fn vault_link(&self, markdown_path: &Path) -> String {
        let relative = markdown_path
            .strip_prefix(&self.vault.path)
            .unwrap_or(markdown_path)
            .with_extension("");
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Tags of an archive summary note
fn archive_tags(file: &FileInfo, children: &[ProcessedFile]) -> Vec<String> {
    let mut tags = vec!["type/archive".to_string()];
    if !file.extension.is_empty() {
        tags.push(format!("format/{}", file.extension));
    }
    tags.push("source/expanded".to_string());
    tags.push(format!("date/{}", file.modified.format("%Y/%m")));

    // (tag, number of children carrying it) in order of first appearance
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for child in children {
        let mut seen = HashSet::new();
        for tag in &child.tags {
            if tag.starts_with("type/") || tag.starts_with("format/") || !seen.insert(tag.as_str()) {
                continue;
            }
            match counts.iter_mut().find(|(t, _)| *t == tag.as_str()) {
                Some((_, n)) => *n += 1,
                None => counts.push((tag.as_str(), 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    tags.extend(
        counts
            .into_iter()
            .take(CONTAINS_TAGS)
            .map(|(tag, _)| format!("contains/{}", tag)),
    );
    tags
}

/// Replace characters that are unsafe in file names
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First of `path`, `name_1.ext`, `name_2.ext`, ... that neither exists nor
/// was handed out earlier in the run
fn claim_unique(path: PathBuf, claimed: &mut HashSet<PathBuf>) -> PathBuf {
    let taken = |p: &Path, claimed: &HashSet<PathBuf>| p.exists() || claimed.contains(p);

    let unique = if !taken(&path, claimed) {
        path
    } else {
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path.extension().map(|e| e.to_string_lossy().to_string());

        let mut counter = 1;
        loop {
            let name = match &extension {
                Some(ext) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", stem, counter),
            };
            let candidate = parent.join(name);
            if !taken(&candidate, claimed) {
                break candidate;
            }
            counter += 1;
        }
    };

    claimed.insert(unique.clone());
    unique
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Rename, falling back to copy and remove when the rename fails (e.g. across filesystems)
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("Rename {:?} -> {:?} failed ({}), copying instead", from, to, e);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
