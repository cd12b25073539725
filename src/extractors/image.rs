// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Structural image metadata; the pixel data is never decoded

use image::{ImageDecoder, ImageReader};
use std::path::Path;
use tracing::debug;

use super::ExtractionCapabilities;
use crate::models::FileInfo;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProperties {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub color_type: String,
    pub channels: u8,
}

/// Header-only probe of an image file
pub fn probe(path: &Path) -> Result<ImageProperties> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .map(|f| format!("{:?}", f).to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();

    Ok(ImageProperties {
        format,
        width,
        height,
        color_type: format!("{:?}", color),
        channels: color.channel_count(),
    })
}

/// Text description of an image; falls back to name and format when probing fails
pub(super) fn describe(file: &FileInfo, capabilities: &ExtractionCapabilities) -> String {
    let props = match probe(&file.path) {
        Ok(p) => p,
        Err(e) => {
            debug!("Image probe failed for {:?}: {}", file.path, e);
            return format!("Image: {}\nFormat: {}", file.name, file.extension.to_uppercase());
        }
    };

    let exif = if capabilities.exif {
        if has_exif(&file.path) { "present" } else { "none" }
    } else {
        "not checked"
    };

    format!(
        "Format: {}\nDimensions: {}x{}\nColor space: {}\nChannels: {}\nEXIF: {}",
        props.format, props.width, props.height, props.color_type, props.channels, exif
    )
}

#[cfg(feature = "exif")]
fn has_exif(path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(path) else {
        return false;
    };
    let mut reader = std::io::BufReader::new(file);
    exif::Reader::new().read_from_container(&mut reader).is_ok()
}

#[cfg(not(feature = "exif"))]
fn has_exif(_path: &Path) -> bool {
    false
}
