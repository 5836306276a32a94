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

//! BMP container handling for palette-indexed bitmaps.
//!
//! # File Layout
//!
//! ```text
//! BITMAPFILEHEADER     14 bytes   "BM", file size, reserved, pixel offset
//! BITMAPINFOHEADER     40 bytes   dimensions, planes, depth, compression, ...
//! header extension     header_size - 40 bytes (V4/V5 headers), kept verbatim
//! color table          4 bytes per entry (blue, green, red, reserved)
//! pixel array          at pixel offset, image_size bytes
//! ```
//!
//! All multi-byte fields are little-endian. Only what is needed to rewrite an
//! uncompressed 8 bpp bitmap as `BI_RLE8` is interpreted; everything else is
//! carried through unchanged.

use std::io::Write;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result, Unsupported};
use crate::rle8::encode_rle8_to_vec;
use crate::{BI_RGB, BI_RLE8};

/// `BM`, read as a little-endian `u16`.
pub const BMP_SIGNATURE: u16 = 0x4D42;
/// Size of [`FileHeader`] on disk.
pub const FILE_HEADER_SIZE: usize = 14;
/// Size of the fixed part of [`InfoHeader`] on disk.
pub const INFO_HEADER_SIZE: usize = 40;
/// Size of one [`PaletteEntry`] on disk.
pub const PALETTE_ENTRY_SIZE: usize = 4;
/// Color table length of an 8 bpp bitmap that does not set `colors_used`.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// `BITMAPFILEHEADER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Always [`BMP_SIGNATURE`].
    pub signature: u16,
    /// Size of the whole file in bytes.
    pub file_size: u32,
    /// Two reserved `u16` fields, kept as read.
    pub reserved: u32,
    /// Offset of the pixel array from the start of the file.
    pub pixel_offset: u32,
}

impl FileHeader {
    fn parse(buf: &mut &[u8]) -> Result<Self> {
        ensure_len(*buf, FILE_HEADER_SIZE, "file header")?;
        let header = FileHeader {
            signature: buf.get_u16_le(),
            file_size: buf.get_u32_le(),
            reserved: buf.get_u32_le(),
            pixel_offset: buf.get_u32_le(),
        };
        if header.signature != BMP_SIGNATURE {
            return Err(Error::InvalidSignature(header.signature));
        }
        Ok(header)
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.signature);
        buf.put_u32_le(self.file_size);
        buf.put_u32_le(self.reserved);
        buf.put_u32_le(self.pixel_offset);
    }
}

/// `BITMAPINFOHEADER`; later header versions extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoHeader {
    /// Size of the info header including any extension.
    pub header_size: u32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels; negative for top-down row order.
    pub height: i32,
    /// Color planes, must be 1.
    pub planes: u16,
    /// Bits per pixel.
    pub bits_per_pixel: u16,
    /// Compression method (`BI_RGB`, `BI_RLE8`, ...).
    pub compression: u32,
    /// Size of the pixel array in bytes. May be 0 for `BI_RGB`.
    pub image_size: u32,
    /// Horizontal resolution.
    pub x_pixels_per_meter: i32,
    /// Vertical resolution.
    pub y_pixels_per_meter: i32,
    /// Color table entries in use, 0 meaning the maximum for the bit depth.
    pub colors_used: u32,
    /// Color table entries required for display, 0 meaning all.
    pub colors_important: u32,
}

impl InfoHeader {
    fn parse(buf: &mut &[u8]) -> Result<Self> {
        ensure_len(*buf, INFO_HEADER_SIZE, "info header")?;
        Ok(InfoHeader {
            header_size: buf.get_u32_le(),
            width: buf.get_i32_le(),
            height: buf.get_i32_le(),
            planes: buf.get_u16_le(),
            bits_per_pixel: buf.get_u16_le(),
            compression: buf.get_u32_le(),
            image_size: buf.get_u32_le(),
            x_pixels_per_meter: buf.get_i32_le(),
            y_pixels_per_meter: buf.get_i32_le(),
            colors_used: buf.get_u32_le(),
            colors_important: buf.get_u32_le(),
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.header_size);
        buf.put_i32_le(self.width);
        buf.put_i32_le(self.height);
        buf.put_u16_le(self.planes);
        buf.put_u16_le(self.bits_per_pixel);
        buf.put_u32_le(self.compression);
        buf.put_u32_le(self.image_size);
        buf.put_i32_le(self.x_pixels_per_meter);
        buf.put_i32_le(self.y_pixels_per_meter);
        buf.put_u32_le(self.colors_used);
        buf.put_u32_le(self.colors_important);
    }

    /// Number of color table entries that follow the headers.
    #[must_use]
    pub fn palette_len(&self) -> usize {
        match self.colors_used as usize {
            n @ 1..=MAX_PALETTE_ENTRIES => n,
            _ => MAX_PALETTE_ENTRIES,
        }
    }

    /// Bytes per padded row, for any bit depth.
    #[must_use]
    pub fn row_bytes(&self) -> usize {
        let bits = self.width.unsigned_abs() as usize * usize::from(self.bits_per_pixel);
        bits.div_ceil(32) * 4
    }

    /// Size of an uncompressed pixel array with these dimensions.
    #[must_use]
    pub fn pixel_array_len(&self) -> usize {
        self.row_bytes() * self.height.unsigned_abs() as usize
    }
}

/// One color table entry, stored as `blue, green, red, reserved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteEntry {
    /// Blue intensity.
    pub blue: u8,
    /// Green intensity.
    pub green: u8,
    /// Red intensity.
    pub red: u8,
    /// Usually 0.
    pub reserved: u8,
}

/// A parsed bitmap: headers, color table and raw pixel array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// File header as read (or as rewritten).
    pub file_header: FileHeader,
    /// Fixed 40-byte info header.
    pub info_header: InfoHeader,
    /// Info header bytes past the first 40, written back verbatim.
    pub header_extension: Vec<u8>,
    /// Color table.
    pub palette: Vec<PaletteEntry>,
    /// Pixel array, `image_size` bytes.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Parses a complete BMP file.
    ///
    /// Nothing about the pixel format is checked here; see
    /// [`Bitmap::validate_rle8_source`].
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is wrong, a structure is truncated or
    /// the pixel offset points into the headers.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        let file_header = FileHeader::parse(&mut buf)?;
        let info_header = InfoHeader::parse(&mut buf)?;

        let header_size = info_header.header_size as usize;
        if header_size < INFO_HEADER_SIZE {
            return Err(Unsupported::HeaderSize(info_header.header_size).into());
        }
        let extension_len = header_size - INFO_HEADER_SIZE;
        ensure_len(buf, extension_len, "header extension")?;
        let header_extension = buf[..extension_len].to_vec();
        buf.advance(extension_len);

        let palette_len = info_header.palette_len();
        ensure_len(buf, palette_len * PALETTE_ENTRY_SIZE, "color table")?;
        let palette: Vec<PaletteEntry> = (0..palette_len)
            .map(|_| PaletteEntry {
                blue: buf.get_u8(),
                green: buf.get_u8(),
                red: buf.get_u8(),
                reserved: buf.get_u8(),
            })
            .collect();

        let headers_end = FILE_HEADER_SIZE + header_size + palette_len * PALETTE_ENTRY_SIZE;
        let pixel_offset = file_header.pixel_offset as usize;
        if pixel_offset < headers_end {
            return Err(Error::InvalidHeader(format!(
                "pixel offset {pixel_offset} overlaps headers ending at {headers_end}"
            )));
        }
        if pixel_offset > data.len() {
            return Err(Error::Truncated {
                what: "pixel array",
                expected: pixel_offset,
                actual: data.len(),
            });
        }

        let image_size = match info_header.image_size {
            0 if info_header.compression == BI_RGB => info_header.pixel_array_len(),
            n => n as usize,
        };
        let available = &data[pixel_offset..];
        ensure_len(available, image_size, "pixel array")?;
        let pixels = available[..image_size].to_vec();

        let mut info_header = info_header;
        info_header.image_size = u32::try_from(image_size)
            .map_err(|_| Error::InvalidHeader(format!("image size {image_size} exceeds 4 GiB")))?;

        Ok(Bitmap {
            file_header,
            info_header,
            header_extension,
            palette,
            pixels,
        })
    }

    /// Checks that this bitmap is an uncompressed, single plane, 8 bpp,
    /// bottom-up image whose pixel array covers every row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] with the first failing condition,
    /// [`Error::ZeroWidth`] for an image without columns, or
    /// [`Error::InvalidHeader`] if `image_size` is smaller than
    /// `width` and `height` require.
    pub fn validate_rle8_source(&self) -> Result<()> {
        let info = &self.info_header;
        if info.planes != 1 {
            return Err(Unsupported::Planes(info.planes).into());
        }
        if info.bits_per_pixel != 8 {
            return Err(Unsupported::BitDepth(info.bits_per_pixel).into());
        }
        if info.compression != BI_RGB {
            return Err(Unsupported::Compression(info.compression).into());
        }
        if info.height < 0 {
            return Err(Unsupported::TopDown.into());
        }
        if info.width <= 0 {
            return Err(Error::ZeroWidth);
        }
        let expected = info.pixel_array_len();
        if (info.image_size as usize) < expected || self.pixels.len() < expected {
            return Err(Error::InvalidHeader(format!(
                "image size {} too small for {}x{} pixels ({expected} bytes)",
                info.image_size, info.width, info.height
            )));
        }
        Ok(())
    }

    /// Returns a copy of this bitmap with its pixel array run-length encoded.
    ///
    /// Headers, extension and palette are carried over; compression, image
    /// size, pixel offset and file size are updated. The pixel array is placed
    /// directly after the color table. Bytes past the last row (some writers
    /// pad the pixel array) are dropped.
    ///
    /// # Errors
    ///
    /// Fails if [`Bitmap::validate_rle8_source`] rejects the bitmap or the
    /// encoder rejects its dimensions.
    // width checked positive, and the pixel array length no larger than
    // image_size, by validate_rle8_source
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn compress_rle8(&self) -> Result<Bitmap> {
        self.validate_rle8_source()?;

        let info = &self.info_header;
        let image_size = info.pixel_array_len() as u32;
        let encoded = encode_rle8_to_vec(&self.pixels, info.width as u32, image_size)?;

        let mut compressed = Bitmap {
            file_header: self.file_header,
            info_header: *info,
            header_extension: self.header_extension.clone(),
            palette: self.palette.clone(),
            pixels: encoded,
        };
        compressed.info_header.compression = BI_RLE8;
        compressed.update_layout()?;

        #[cfg(feature = "debug-logging")]
        log::info!(
            "BMP: {}x{} pixel array {} -> {} bytes, file size {}",
            info.width,
            info.height,
            self.pixels.len(),
            compressed.pixels.len(),
            compressed.file_header.file_size
        );

        Ok(compressed)
    }

    /// Recomputes `image_size`, `pixel_offset` and `file_size` from the current
    /// contents.
    fn update_layout(&mut self) -> Result<()> {
        let headers = FILE_HEADER_SIZE
            + INFO_HEADER_SIZE
            + self.header_extension.len()
            + self.palette.len() * PALETTE_ENTRY_SIZE;
        let header_size = INFO_HEADER_SIZE + self.header_extension.len();
        let too_large =
            |what: &str, n: usize| Error::InvalidHeader(format!("{what} {n} exceeds 4 GiB"));

        self.info_header.header_size =
            u32::try_from(header_size).map_err(|_| too_large("header size", header_size))?;
        self.info_header.image_size = u32::try_from(self.pixels.len())
            .map_err(|_| too_large("image size", self.pixels.len()))?;
        self.file_header.pixel_offset =
            u32::try_from(headers).map_err(|_| too_large("pixel offset", headers))?;
        let file_size = headers + self.pixels.len();
        self.file_header.file_size =
            u32::try_from(file_size).map_err(|_| too_large("file size", file_size))?;
        Ok(())
    }

    /// Serialises the bitmap. The pixel array is written at
    /// `file_header.pixel_offset`, zero-filling any gap after the color table.
    #[must_use]
    pub fn to_bytes(&self) -> BytesMut {
        let pixel_offset = self.file_header.pixel_offset as usize;
        let mut buf =
            BytesMut::with_capacity(pixel_offset.max(FILE_HEADER_SIZE) + self.pixels.len());

        self.file_header.write(&mut buf);
        self.info_header.write(&mut buf);
        buf.put_slice(&self.header_extension);
        for entry in &self.palette {
            buf.put_u8(entry.blue);
            buf.put_u8(entry.green);
            buf.put_u8(entry.red);
            buf.put_u8(entry.reserved);
        }
        if buf.len() < pixel_offset {
            buf.put_bytes(0, pixel_offset - buf.len());
        }
        buf.put_slice(&self.pixels);
        buf
    }

    /// Writes the serialised bitmap to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

fn ensure_len(buf: &[u8], expected: usize, what: &'static str) -> Result<()> {
    if buf.len() < expected {
        return Err(Error::Truncated {
            what,
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}
