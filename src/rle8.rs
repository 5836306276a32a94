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

//! BI_RLE8 (8-bit run-length encoding) for BMP pixel arrays.
//!
//! The encoder turns an uncompressed 8 bits-per-pixel indexed pixel array into
//! the token stream stored in a `BI_RLE8` bitmap.
//!
//! # Encoding Process
//!
//! 1. The pixel array is split into rows of `stride` bytes, where the stride is
//!    the width rounded up to a multiple of 4.
//! 2. Each row is scanned left to right. Runs of 3 or more identical bytes are
//!    written in *encoded mode*, everything between them in *absolute mode*.
//! 3. Every row ends with an end-of-line marker, except the last, which ends
//!    with the end-of-bitmap marker instead.
//!
//! # Token Layout
//!
//! ```text
//! [count][value]            count 1..=255, repeat value count times
//! [0][0]                    end of line
//! [0][1]                    end of bitmap
//! [0][n][n bytes][pad?]     n 3..=255 literal bytes, one zero pad if n is odd
//! ```
//!
//! Literal stretches of only 1 or 2 bytes cannot use absolute mode (`[0][1]`
//! and `[0][2]` are escapes), so they are written as `[1][value]` pairs.
//! No token ever crosses a row boundary and the delta escape is never emitted.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// Largest count a single token can carry.
pub const MAX_TOKEN_COUNT: usize = 255;

/// Shortest run written in encoded mode. Also the shortest literal absolute
/// mode can frame.
const MIN_RUN: usize = 3;

const ESCAPE: u8 = 0;
const END_OF_LINE: u8 = 0;
const END_OF_BITMAP: u8 = 1;
const LITERAL_PAD: u8 = 0;

/// One element of a BI_RLE8 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// `count` copies of `value`; count is in `1..=255`.
    Repeat {
        /// Number of copies.
        count: u8,
        /// Palette index to repeat.
        value: u8,
    },
    /// Absolute-mode literal of 3 to 255 bytes.
    Literal(&'a [u8]),
    /// End of the current row.
    EndOfLine,
    /// End of the whole bitmap.
    EndOfBitmap,
}

impl Token<'_> {
    #[allow(clippy::cast_possible_truncation)] // literal length bounded by MAX_TOKEN_COUNT
    fn write<B: BufMut>(&self, buf: &mut B) {
        match *self {
            Token::Repeat { count, value } => {
                debug_assert!(count > 0);
                buf.put_u8(count);
                buf.put_u8(value);
            }
            Token::Literal(bytes) => {
                debug_assert!((MIN_RUN..=MAX_TOKEN_COUNT).contains(&bytes.len()));
                buf.put_u8(ESCAPE);
                buf.put_u8(bytes.len() as u8);
                buf.put_slice(bytes);
                // Absolute runs must end on a 16-bit boundary
                if bytes.len() % 2 != 0 {
                    buf.put_u8(LITERAL_PAD);
                }
            }
            Token::EndOfLine => {
                buf.put_u8(ESCAPE);
                buf.put_u8(END_OF_LINE);
            }
            Token::EndOfBitmap => {
                buf.put_u8(ESCAPE);
                buf.put_u8(END_OF_BITMAP);
            }
        }
    }
}

/// Returns the padded row length in bytes for an 8 bpp image of `width` pixels.
#[inline]
#[must_use]
pub fn row_stride(width: u32) -> usize {
    let width = width as usize;
    width + (4 - width % 4) % 4
}

/// Worst-case encoded size for `image_size` bytes of pixel data.
///
/// Input without any run of 3 expands; two bytes of output per input byte is
/// always enough, terminators included.
#[inline]
#[must_use]
pub fn max_encoded_len(image_size: usize) -> usize {
    image_size.saturating_mul(2)
}

/// Encodes `pixels[..image_size]` into `output` and returns the number of bytes
/// written.
///
/// `output` must hold at least [`max_encoded_len`]`(image_size)` bytes.
///
/// # Errors
///
/// Returns an [`ErrorKind::InvalidPrecondition`](crate::ErrorKind::InvalidPrecondition)
/// error if `width` is 0, `image_size` is 0, `pixels` is shorter than `image_size`,
/// `image_size` is not a multiple of the row stride or `output` is too small.
pub fn encode_rle8(
    pixels: &[u8],
    width: u32,
    image_size: u32,
    output: &mut [u8],
) -> Result<usize> {
    let stride = check_preconditions(pixels, width, image_size)?;
    let image_size = image_size as usize;
    let required = max_encoded_len(image_size);
    if output.len() < required {
        return Err(Error::OutputTooSmall {
            required,
            actual: output.len(),
        });
    }

    let mut cursor = &mut output[..required];
    Ok(encode_rows(&mut cursor, &pixels[..image_size], stride))
}

/// Encodes `pixels[..image_size]` into a newly allocated buffer.
///
/// # Errors
///
/// Same preconditions as [`encode_rle8`], minus the output size.
pub fn encode_rle8_to_vec(pixels: &[u8], width: u32, image_size: u32) -> Result<Vec<u8>> {
    let stride = check_preconditions(pixels, width, image_size)?;
    let image_size = image_size as usize;
    let mut buf = BytesMut::with_capacity(max_encoded_len(image_size));
    encode_rows(&mut buf, &pixels[..image_size], stride);
    Ok(buf.to_vec())
}

/// Validates encoder inputs and returns the row stride.
fn check_preconditions(pixels: &[u8], width: u32, image_size: u32) -> Result<usize> {
    if width == 0 {
        return Err(Error::ZeroWidth);
    }
    let image_size = image_size as usize;
    if image_size == 0 {
        return Err(Error::EmptyImage);
    }
    if pixels.len() < image_size {
        return Err(Error::PixelDataTooShort {
            expected: image_size,
            actual: pixels.len(),
        });
    }
    let stride = row_stride(width);
    if image_size % stride != 0 {
        return Err(Error::StrideMismatch { image_size, stride });
    }
    Ok(stride)
}

/// Row segmenter: encodes every `stride`-byte row and terminates the stream.
/// Returns the number of bytes written to `buf`.
///
/// `pixels.len()` must be a non-zero multiple of `stride`, and `buf` must have
/// room for [`max_encoded_len`]`(pixels.len())` bytes.
fn encode_rows<B: BufMut>(buf: &mut B, pixels: &[u8], stride: usize) -> usize {
    let start = buf.remaining_mut();
    let rows = pixels.len() / stride;

    for (index, row) in pixels.chunks_exact(stride).enumerate() {
        encode_row(buf, row);
        if index + 1 == rows {
            Token::EndOfBitmap.write(buf);
        } else {
            Token::EndOfLine.write(buf);
        }
    }
    let written = start - buf.remaining_mut();

    #[cfg(feature = "debug-logging")]
    log::info!(
        "RLE8: encoded {} rows of {} bytes, {} -> {} bytes",
        rows,
        stride,
        pixels.len(),
        written
    );

    written
}

/// Per-row scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking at `pos`; the next step packs a run or opens a literal.
    Scanning,
    /// A literal stretch begins at `start`.
    EmittingLiteral { start: usize },
}

/// Encodes a single row, without its end-of-line marker.
fn encode_row<B: BufMut>(buf: &mut B, row: &[u8]) {
    let mut pos = 0;
    let mut state = State::Scanning;

    loop {
        state = match state {
            State::Scanning => {
                if pos == row.len() {
                    break;
                }
                let run = run_length(row, pos);
                if run >= MIN_RUN {
                    pack_run(buf, row[pos], run);
                    pos += run;
                    State::Scanning
                } else {
                    State::EmittingLiteral { start: pos }
                }
            }
            State::EmittingLiteral { start } => {
                let len = literal_length(row, start);
                pack_literal(buf, &row[start..start + len]);
                pos = start + len;
                State::Scanning
            }
        };
    }
}

/// Length of the run of bytes equal to `row[pos]` starting at `pos`.
#[inline]
fn run_length(row: &[u8], pos: usize) -> usize {
    let value = row[pos];
    row[pos..].iter().take_while(|&&b| b == value).count()
}

/// Number of bytes from `start` up to the next run of `MIN_RUN` or more, or up
/// to the end of the row.
///
/// Runs are maximal, so a qualifying run can only begin where a shorter one
/// ends; walking run by run finds it.
fn literal_length(row: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < row.len() {
        let run = run_length(row, pos);
        if run >= MIN_RUN {
            break;
        }
        pos += run;
    }
    pos - start
}

/// Encoded mode: `(255, value)` pairs followed by the remainder.
#[allow(clippy::cast_possible_truncation)] // counts bounded by MAX_TOKEN_COUNT
fn pack_run<B: BufMut>(buf: &mut B, value: u8, len: usize) {
    let whole = len / MAX_TOKEN_COUNT;
    let rest = len % MAX_TOKEN_COUNT;

    for _ in 0..whole {
        Token::Repeat {
            count: MAX_TOKEN_COUNT as u8,
            value,
        }
        .write(buf);
    }
    if rest > 0 {
        Token::Repeat {
            count: rest as u8,
            value,
        }
        .write(buf);
    }
}

/// Absolute mode, split into chunks of at most 255 bytes.
///
/// A chunk of 1 or 2 bytes (a short stretch, or the tail of a long one) is
/// written as single-count repeats of its own bytes.
fn pack_literal<B: BufMut>(buf: &mut B, bytes: &[u8]) {
    for chunk in bytes.chunks(MAX_TOKEN_COUNT) {
        if chunk.len() < MIN_RUN {
            for &value in chunk {
                Token::Repeat { count: 1, value }.write(buf);
            }
        } else {
            Token::Literal(chunk).write(buf);
        }
    }
}
