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

//! `BI_RLE8` run-length compression for 8-bit palette-indexed BMP images.
//!
//! The crate is split into the encoder and the container around it:
//!
//! - [`rle8`]: turns an uncompressed pixel array into a `BI_RLE8` token stream.
//!   It only needs the pixels, the width and the pixel array size.
//! - [`bmp`]: parses, validates and writes BMP files, carrying the color table
//!   and any extended header bytes through unchanged.
//! - [`convert`]: ties both together for whole files.
//!
//! ```
//! use bmp_rle8::encode_rle8_to_vec;
//!
//! // Two rows of width 4: a solid row, then four distinct indices
//! let pixels = [9, 9, 9, 9, 1, 2, 3, 4];
//! let encoded = encode_rle8_to_vec(&pixels, 4, 8).unwrap();
//! assert_eq!(encoded, [4, 9, 0, 0, 0, 4, 1, 2, 3, 4, 0, 1]);
//! ```

#![warn(missing_docs)]

pub mod bmp;
pub mod convert;
pub mod error;
pub mod rle8;

pub use bmp::{Bitmap, FileHeader, InfoHeader, PaletteEntry};
pub use convert::{compress_bmp, compress_bmp_file, Conversion};
pub use error::{Error, ErrorKind, Result, Unsupported};
pub use rle8::{encode_rle8, encode_rle8_to_vec, max_encoded_len, row_stride};

// BMP compression types (BITMAPINFOHEADER.biCompression)
/// Uncompressed pixels.
pub const BI_RGB: u32 = 0;
/// 8-bit run-length encoding.
pub const BI_RLE8: u32 = 1;
/// 4-bit run-length encoding.
pub const BI_RLE4: u32 = 2;
