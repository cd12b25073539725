// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Workbook preview via calamine

use calamine::{open_workbook_auto, Reader};
use std::path::Path;

use crate::{Result, TagvaultError};

const PREVIEW_ROWS: usize = 20;

/// Binary workbook formats that cannot be read as plain text
pub fn handles(extension: &str) -> bool {
    matches!(extension, "xlsx" | "xls" | "ods")
}

/// Sheet names plus the first rows of the first sheet, tab separated
pub(super) fn extract(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| TagvaultError::Extraction(format!("Failed to open spreadsheet: {}", e)))?;

    let mut text = String::new();

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    text.push_str(&format!("Sheets: {}\n", sheet_names.join(", ")));

    if let Some(sheet_name) = sheet_names.first() {
        if let Ok(range) = workbook.worksheet_range(sheet_name) {
            for (i, row) in range.rows().enumerate() {
                if i >= PREVIEW_ROWS {
                    text.push_str("...\n");
                    break;
                }
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                text.push_str(&cells.join("\t"));
                text.push('\n');
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_only_binary_workbooks() {
        assert!(handles("xlsx"));
        assert!(handles("ods"));
        assert!(!handles("csv"));
        assert!(!handles("json"));
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();
        assert!(extract(&path).is_err());
    }
}
