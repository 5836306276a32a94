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

//! Error types for BMP parsing and BI_RLE8 encoding.

use std::fmt;
use std::io;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller broke an encoder precondition (width, sizes, stride).
    InvalidPrecondition,
    /// The BMP is well formed but cannot be converted to BI_RLE8.
    UnsupportedFormat,
    /// The BMP container itself is damaged.
    MalformedContainer,
    /// Reading or writing a file failed.
    Io,
}

/// Reason a bitmap was rejected by [`Bitmap::validate_rle8_source`](crate::Bitmap::validate_rle8_source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// Color plane count other than 1.
    Planes(u16),
    /// Bit depth other than 8.
    BitDepth(u16),
    /// Source is already compressed.
    Compression(u32),
    /// Negative height. BI_RLE8 bitmaps are always stored bottom-up.
    TopDown,
    /// Info header shorter than a `BITMAPINFOHEADER` (e.g. OS/2 core headers).
    HeaderSize(u32),
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::Planes(planes) => {
                write!(f, "number of color planes is {planes}, expected 1")
            }
            Unsupported::BitDepth(bpp) => {
                write!(f, "bit depth is {bpp} bits per pixel, expected 8")
            }
            Unsupported::Compression(kind) => {
                write!(f, "compression type is {kind}, expected 0 (BI_RGB)")
            }
            Unsupported::TopDown => write!(f, "top-down bitmaps cannot be run-length encoded"),
            Unsupported::HeaderSize(size) => {
                write!(f, "info header is {size} bytes, at least 40 required")
            }
        }
    }
}

/// Errors that can occur while reading, encoding or writing a bitmap.
#[derive(Debug)]
pub enum Error {
    /// Width of zero pixels.
    ZeroWidth,
    /// Image size of zero bytes; there is no row to terminate.
    EmptyImage,
    /// Pixel buffer is shorter than the declared image size.
    PixelDataTooShort {
        /// Declared image size.
        expected: usize,
        /// Bytes actually provided.
        actual: usize,
    },
    /// Destination buffer cannot hold the worst-case encoding.
    OutputTooSmall {
        /// Minimum capacity, twice the image size.
        required: usize,
        /// Capacity provided.
        actual: usize,
    },
    /// Image size is not a whole number of padded rows.
    StrideMismatch {
        /// Declared image size.
        image_size: usize,
        /// Row stride derived from the width.
        stride: usize,
    },
    /// The bitmap cannot be converted.
    Unsupported(Unsupported),
    /// File does not start with `BM`.
    InvalidSignature(u16),
    /// Input ended before a structure was complete.
    Truncated {
        /// Structure being read.
        what: &'static str,
        /// Bytes needed.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },
    /// Header fields contradict each other.
    InvalidHeader(String),
    /// Underlying I/O failure.
    Io(io::Error),
}

impl Error {
    /// Returns the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ZeroWidth
            | Error::EmptyImage
            | Error::PixelDataTooShort { .. }
            | Error::OutputTooSmall { .. }
            | Error::StrideMismatch { .. } => ErrorKind::InvalidPrecondition,
            Error::Unsupported(_) => ErrorKind::UnsupportedFormat,
            Error::InvalidSignature(_) | Error::Truncated { .. } | Error::InvalidHeader(_) => {
                ErrorKind::MalformedContainer
            }
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroWidth => write!(f, "image width must be greater than 0"),
            Error::EmptyImage => write!(f, "image contains no pixel data"),
            Error::PixelDataTooShort { expected, actual } => write!(
                f,
                "pixel buffer too short: expected {expected} bytes, got {actual}"
            ),
            Error::OutputTooSmall { required, actual } => write!(
                f,
                "output buffer too small: need {required} bytes, got {actual}"
            ),
            Error::StrideMismatch { image_size, stride } => write!(
                f,
                "image size {image_size} is not a multiple of the row stride {stride}"
            ),
            Error::Unsupported(reason) => write!(f, "unsupported bitmap: {reason}"),
            Error::InvalidSignature(sig) => {
                write!(f, "file signature is {sig:#06x}, expected 0x4d42 (BM)")
            }
            Error::Truncated {
                what,
                expected,
                actual,
            } => write!(
                f,
                "truncated {what}: expected {expected} bytes, got {actual}"
            ),
            Error::InvalidHeader(msg) => write!(f, "invalid header: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<Unsupported> for Error {
    fn from(reason: Unsupported) -> Self {
        Error::Unsupported(reason)
    }
}
