// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Extension based file classification

use crate::models::FileType;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "md", "markdown", "rtf", "odt", "tex",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "tiff", "tif", "ico", "heic", "heif", "avif",
];

const CODE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "ts", "tsx", "py", "java", "c", "h", "cpp", "cc", "hpp", "cs", "go", "rs",
    "rb", "php", "swift", "kt", "scala", "sh", "bash", "zsh", "lua", "r", "pl", "html", "css",
    "scss", "vue",
];

const DATA_EXTENSIONS: &[&str] = &[
    "json", "xml", "yaml", "yml", "csv", "tsv", "toml", "ini", "sql", "xlsx", "xls", "ods",
];

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar"];

const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "m4a", "mp4", "avi", "mkv", "mov", "wmv", "webm",
];

/// Map an extension (with or without the leading dot) to its file type
pub fn classify(extension: &str) -> FileType {
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = ext.as_str();

    if DOCUMENT_EXTENSIONS.contains(&ext) {
        FileType::Document
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        FileType::Image
    } else if CODE_EXTENSIONS.contains(&ext) {
        FileType::Code
    } else if DATA_EXTENSIONS.contains(&ext) {
        FileType::Data
    } else if ARCHIVE_EXTENSIONS.contains(&ext) {
        FileType::Archive
    } else if MEDIA_EXTENSIONS.contains(&ext) {
        FileType::Media
    } else {
        FileType::Unknown
    }
}
