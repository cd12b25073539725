// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Markdown note rendering
//!
//! A note is a frontmatter block, a `# title` heading, a body chosen by file
//! type and a footer linking the organized original.

pub mod code;

use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{FileInfo, FileType, Frontmatter, FrontmatterValue};

/// Characters of document text kept in a note
pub const DOCUMENT_LIMIT: usize = 5000;
/// Characters of preview kept for data and unknown files
pub const PREVIEW_LIMIT: usize = 1000;
/// Lines of source kept for code files
pub const CODE_LINES: usize = 50;

/// One member listed in an archive summary note
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMember {
    pub name: String,
    pub category: String,
    /// Vault-relative markdown path without the `.md` suffix
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveSummary {
    pub members: Vec<ArchiveMember>,
}

/// Human readable byte count: `0 Bytes`, `1 KB`, `1.5 KB`, ...
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Full note for a regular file
    pub fn render(&self, file: &FileInfo, content: Option<&str>, frontmatter: &Frontmatter) -> String {
        let body = match file.file_type {
            FileType::Image => image_body(file, content),
            FileType::Code => code_body(file, content),
            FileType::Document => document_body(content),
            _ => default_body(file, content),
        };
        assemble(frontmatter, &body)
    }

    /// Note for an expanded archive, linking every processed member
    pub fn render_archive_summary(
        &self,
        file: &FileInfo,
        summary: &ArchiveSummary,
        frontmatter: &Frontmatter,
    ) -> String {
        let mut body = file_information(file);
        body.push_str(&format!("- **Extracted files**: {}\n", summary.members.len()));
        body.push_str("\n## Contents\n");

        if summary.members.is_empty() {
            body.push_str("\n*No files could be processed from this archive.*\n");
        } else {
            let mut groups: BTreeMap<&str, Vec<&ArchiveMember>> = BTreeMap::new();
            for member in &summary.members {
                groups.entry(member.category.as_str()).or_default().push(member);
            }
            for (category, members) in groups {
                body.push_str(&format!("\n### {}\n\n", category));
                for member in members {
                    body.push_str(&format!("- [[{}|{}]]\n", member.link, member.name));
                }
            }
        }

        assemble(frontmatter, &body)
    }
}

fn assemble(frontmatter: &Frontmatter, body: &str) -> String {
    let mut out = render_frontmatter(frontmatter);
    out.push('\n');
    out.push_str(&format!("# {}\n\n", frontmatter.title));
    out.push_str(body.trim_end());
    out.push_str("\n\n---\n");
    let name = frontmatter
        .original_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    out.push_str(&format!(
        "*Original file: [{}]({})*\n",
        name,
        file_uri(&frontmatter.original_file)
    ));
    out
}

/// `---` delimited YAML block in field order
pub fn render_frontmatter(fm: &Frontmatter) -> String {
    let mut out = String::from("---\n");
    push_scalar(&mut out, "title", &fm.title);
    push_scalar(
        &mut out,
        "original_file",
        &format!("[[{}]]", fm.original_file.display()),
    );
    push_scalar(&mut out, "source_path", &fm.source_path.display().to_string());
    push_scalar(&mut out, "file_type", &fm.file_type);
    push_scalar(&mut out, "created", &fm.created.to_rfc3339());
    push_scalar(&mut out, "processed", &fm.processed.to_rfc3339());
    push_list(&mut out, "tags", &fm.tags);

    for (key, value) in &fm.extra {
        match value {
            FrontmatterValue::Text(text) => push_scalar(&mut out, key, text),
            FrontmatterValue::Number(n) => out.push_str(&format!("{}: {}\n", key, n)),
            FrontmatterValue::List(items) => push_list(&mut out, key, items),
        }
    }

    out.push_str("---\n");
    out
}

// JSON string escapes are all valid in YAML double-quoted scalars
fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "\\\"")))
}

fn push_scalar(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("{}: {}\n", key, quote(value)));
}

fn push_list(out: &mut String, key: &str, items: &[String]) {
    if items.is_empty() {
        out.push_str(&format!("{}: []\n", key));
        return;
    }
    out.push_str(&format!("{}:\n", key));
    for item in items {
        if is_plain_safe(item) {
            out.push_str(&format!("  - {}\n", item));
        } else {
            out.push_str(&format!("  - {}\n", quote(item)));
        }
    }
}

/// Plain YAML scalar that cannot be mistaken for anything but a string
fn is_plain_safe(value: &str) -> bool {
    let mut chars = value.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
        && !matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "on" | "off" | "null"
        )
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display().to_string().replace(' ', "%20"))
}

/// Prefix of at most `limit` characters, or `None` when nothing was cut
fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    text.char_indices().nth(limit).map(|(idx, _)| &text[..idx])
}

fn image_body(file: &FileInfo, content: Option<&str>) -> String {
    let mut body = format!("![[{}]]\n\n", file.name);
    body.push_str("## Description\n\n");
    body.push_str(&format!("*Image file: {}*\n\n", file.name));
    body.push_str("## Properties\n\n");
    body.push_str(&format!("- **Format**: {}\n", file.extension.to_uppercase()));
    body.push_str(&format!("- **Size**: {}\n", format_bytes(file.size)));
    body.push_str(&format!("- **Modified**: {}\n", file.modified.format("%Y-%m-%d")));

    if let Some(metadata) = content {
        body.push_str("\n## Metadata\n\n");
        for line in metadata.lines().filter(|l| !l.trim().is_empty()) {
            body.push_str(&format!("- {}\n", line));
        }
    }
    body
}

fn code_body(file: &FileInfo, content: Option<&str>) -> String {
    let language = code::language_for(&file.extension);
    let mut body = format!("## Overview\n\nThis is a **{}** file.\n", language);

    let Some(source) = content else {
        return body;
    };

    body.push_str("\n## Statistics\n\n");
    body.push_str(&format!("- **Lines of code**: {}\n", source.split('\n').count()));
    body.push_str(&format!("- **File size**: {}\n", format_bytes(file.size)));

    let functions = code::find_functions(source, &language);
    if !functions.is_empty() {
        body.push_str("\n## Key Functions\n\n");
        for name in &functions {
            body.push_str(&format!("- `{}`\n", name));
        }
    }

    let lines: Vec<&str> = source.split('\n').collect();
    let shown = lines.iter().take(CODE_LINES).copied().collect::<Vec<_>>().join("\n");
    body.push_str(&format!("\n## Code\n\n```{}\n{}", language, shown));
    if lines.len() > CODE_LINES {
        body.push_str("\n// ... (truncated)");
    }
    body.push_str("\n```\n");
    body
}

fn document_body(content: Option<&str>) -> String {
    let Some(text) = content else {
        return "*Unable to extract text content from this document.*\n".to_string();
    };

    let mut body = String::from("## Content\n\n");
    match truncate_chars(text, DOCUMENT_LIMIT) {
        Some(prefix) => {
            body.push_str(prefix);
            body.push_str("\n\n*[Content truncated...]*");
        }
        None => body.push_str(text),
    }
    body.push('\n');
    body
}

fn file_information(file: &FileInfo) -> String {
    let mut body = String::from("## File Information\n\n");
    body.push_str(&format!("- **Type**: {}\n", file.file_type));
    body.push_str(&format!("- **Format**: {}\n", file.extension.to_uppercase()));
    body.push_str(&format!("- **Size**: {}\n", format_bytes(file.size)));
    body.push_str(&format!("- **Modified**: {}\n", file.modified.format("%Y-%m-%d")));
    body
}

fn default_body(file: &FileInfo, content: Option<&str>) -> String {
    let mut body = file_information(file);
    if let Some(text) = content {
        body.push_str("\n## Preview\n\n```\n");
        match truncate_chars(text, PREVIEW_LIMIT) {
            Some(prefix) => {
                body.push_str(prefix);
                body.push_str("\n```\n\n*[Preview truncated...]*\n");
            }
            None => {
                body.push_str(text.trim_end_matches('\n'));
                body.push_str("\n```\n");
            }
        }
    }
    body
}
