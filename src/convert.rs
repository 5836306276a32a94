// Copyright 2025 Dustin McAfee
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Whole-file conversion from uncompressed 8 bpp BMP to `BI_RLE8`.

use std::fs;
use std::path::Path;

use bytes::BytesMut;

use crate::bmp::Bitmap;
use crate::error::Result;

/// Summary of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Image width in pixels.
    pub width: i32,
    /// Image height in pixels.
    pub height: i32,
    /// Size of the uncompressed pixel array.
    pub source_image_size: u32,
    /// Size of the encoded pixel array.
    pub encoded_image_size: u32,
    /// Size of the written file.
    pub file_size: u32,
}

impl Conversion {
    /// Encoded size divided by source size; below 1.0 means the data shrank.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.source_image_size == 0 {
            return 1.0;
        }
        f64::from(self.encoded_image_size) / f64::from(self.source_image_size)
    }
}

/// Converts an in-memory BMP file and returns the new file with a summary.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed, is not an uncompressed
/// 8 bpp bitmap, or has pixel data inconsistent with its width.
pub fn compress_bmp(data: &[u8]) -> Result<(BytesMut, Conversion)> {
    let source = Bitmap::parse(data)?;
    let compressed = source.compress_rle8()?;

    let summary = Conversion {
        width: source.info_header.width,
        height: source.info_header.height,
        source_image_size: source.info_header.image_size,
        encoded_image_size: compressed.info_header.image_size,
        file_size: compressed.file_header.file_size,
    };
    Ok((compressed.to_bytes(), summary))
}

/// Reads `input`, converts it and writes the result to `output`.
///
/// Nothing is written when conversion fails.
///
/// # Errors
///
/// Returns an error if reading, converting or writing fails.
pub fn compress_bmp_file(input: &Path, output: &Path) -> Result<Conversion> {
    let data = fs::read(input)?;
    let (encoded, summary) = compress_bmp(&data)?;
    fs::write(output, &encoded)?;

    #[cfg(feature = "debug-logging")]
    log::info!(
        "Converted {} -> {} ({} bytes)",
        input.display(),
        output.display(),
        encoded.len()
    );

    Ok(summary)
}
