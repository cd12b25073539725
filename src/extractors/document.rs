// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Text extraction for documents (plain text, PDF, DOCX)

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::debug;

use super::{read_text, ExtractionCapabilities};
use crate::models::FileInfo;
use crate::{Result, TagvaultError};

/// Dispatch on the document extension
pub(super) fn extract(file: &FileInfo, capabilities: &ExtractionCapabilities) -> Result<Option<String>> {
    match file.extension.as_str() {
        "txt" | "md" | "markdown" | "rtf" => read_text(&file.path).map(Some),
        "pdf" => {
            if !capabilities.pdf {
                debug!("PDF extraction unavailable, skipping {:?}", file.path);
                return Ok(None);
            }
            extract_pdf(&file.path).map(non_empty)
        }
        "docx" | "doc" => {
            if !capabilities.docx {
                debug!("DOCX extraction unavailable, skipping {:?}", file.path);
                return Ok(None);
            }
            extract_docx(&file.path).map(non_empty)
        }
        // odt and friends have no extractor
        _ => Ok(None),
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| TagvaultError::Extraction(format!("PDF text extraction failed: {}", e)))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_path: &Path) -> Result<String> {
    Err(TagvaultError::Extraction("built without PDF support".to_string()))
}

#[cfg(feature = "archives")]
fn extract_docx(path: &Path) -> Result<String> {
    use std::io::Read;

    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| TagvaultError::Extraction(format!("Failed to open DOCX: {}", e)))?;

    // DOCX stores content in word/document.xml
    let mut document_xml = archive
        .by_name("word/document.xml")
        .map_err(|_| TagvaultError::Extraction("No document.xml found".to_string()))?;

    let mut xml = String::new();
    document_xml.read_to_string(&mut xml)?;
    docx_text(&xml)
}

#[cfg(not(feature = "archives"))]
fn extract_docx(_path: &Path) -> Result<String> {
    Err(TagvaultError::Extraction("built without DOCX support".to_string()))
}

/// Collect the `w:t` runs of a WordprocessingML body, one line per paragraph
pub fn docx_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| TagvaultError::Extraction(format!("Malformed document.xml: {}", e)))?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TagvaultError::Extraction(format!("Malformed document.xml: {}", e)));
            }
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}
