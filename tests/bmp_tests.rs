// End-to-end tests: uncompressed 8 bpp BMP files in, BI_RLE8 files out.


use bmp_rle8::bmp::{BMP_SIGNATURE, FILE_HEADER_SIZE, INFO_HEADER_SIZE};
use bmp_rle8::{
    compress_bmp, compress_bmp_file, row_stride, Bitmap, Error, ErrorKind, FileHeader, InfoHeader,
    PaletteEntry, Unsupported, BI_RGB, BI_RLE4, BI_RLE8,
};
use decoders::decode_rle8;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes an uncompressed 8 bpp BMP the way common image editors do.
fn write_bmp(width: i32, height: i32, pixels: &[u8], extension: &[u8], colors: usize) -> Vec<u8> {
    let header_size = INFO_HEADER_SIZE + extension.len();
    let pixel_offset = FILE_HEADER_SIZE + header_size + colors * 4;
    let mut out = Vec::new();

    out.extend_from_slice(&BMP_SIGNATURE.to_le_bytes());
    out.extend_from_slice(&((pixel_offset + pixels.len()) as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(pixel_offset as u32).to_le_bytes());

    out.extend_from_slice(&(header_size as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&(pixels.len() as u32).to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    let colors_used = if colors == 256 { 0 } else { colors as u32 };
    out.extend_from_slice(&colors_used.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(extension);

    for i in 0..colors {
        // Blue, green, red, reserved
        out.extend_from_slice(&[i as u8, (255 - i) as u8, (i * 3) as u8, 0]);
    }
    out.extend_from_slice(pixels);
    out
}

/// A bottom-up image with a solid sky, a striped band and noisy ground.
fn scene(width: u32, height: usize) -> Vec<u8> {
    let stride = row_stride(width);
    let mut pixels = vec![0u8; stride * height];
    for y in 0..height {
        for x in 0..width as usize {
            pixels[y * stride + x] = match y * 3 / height {
                0 => ((x * 31 + y * 17) % 7) as u8,
                1 => (x / 4 % 2) as u8 + 10,
                _ => 200,
            };
        }
    }
    pixels
}

#[test]
fn test_convert_preserves_everything_but_pixels() {
    init_logging();
    let width = 37;
    let height = 12;
    let pixels = scene(width, height);
    let input = write_bmp(width as i32, height as i32, &pixels, &[], 256);

    let (output, summary) = compress_bmp(&input).unwrap();
    assert_eq!(summary.source_image_size as usize, pixels.len());
    assert_eq!(summary.file_size as usize, output.len());

    let source = Bitmap::parse(&input).unwrap();
    let converted = Bitmap::parse(&output).unwrap();

    assert_eq!(converted.info_header.compression, BI_RLE8);
    assert_eq!(
        converted.info_header.image_size,
        summary.encoded_image_size
    );
    assert_eq!(converted.info_header.width, source.info_header.width);
    assert_eq!(converted.info_header.height, source.info_header.height);
    assert_eq!(converted.info_header.bits_per_pixel, 8);
    assert_eq!(
        converted.info_header.x_pixels_per_meter,
        source.info_header.x_pixels_per_meter
    );
    assert_eq!(converted.palette, source.palette);
    assert_eq!(converted.file_header.pixel_offset, source.file_header.pixel_offset);

    let decoded = decode_rle8(&converted.pixels, row_stride(width)).unwrap();
    assert_eq!(decoded.pixels, pixels);
    assert_eq!(decoded.rows, height);
}

#[test]
fn test_convert_keeps_header_extension() {
    // BITMAPV5HEADER: 84 bytes beyond the 40-byte info header
    let extension: Vec<u8> = (0..84u8).map(|b| b.wrapping_mul(3)).collect();
    let pixels = scene(16, 6);
    let input = write_bmp(16, 6, &pixels, &extension, 256);

    let (output, _) = compress_bmp(&input).unwrap();
    let converted = Bitmap::parse(&output).unwrap();

    assert_eq!(converted.info_header.header_size, 124);
    assert_eq!(converted.header_extension, extension);
    assert_eq!(
        converted.file_header.pixel_offset as usize,
        FILE_HEADER_SIZE + 124 + 1024
    );
    let decoded = decode_rle8(&converted.pixels, 16).unwrap();
    assert_eq!(decoded.pixels, pixels);
}

#[test]
fn test_convert_small_palette() {
    let pixels = scene(8, 3);
    let input = write_bmp(8, 3, &pixels, &[], 16);
    let (output, summary) = compress_bmp(&input).unwrap();
    let converted = Bitmap::parse(&output).unwrap();

    assert_eq!(converted.palette.len(), 16);
    assert_eq!(
        converted.palette[2],
        PaletteEntry {
            blue: 2,
            green: 253,
            red: 6,
            reserved: 0
        }
    );
    assert_eq!(
        summary.file_size as usize,
        FILE_HEADER_SIZE + INFO_HEADER_SIZE + 16 * 4 + summary.encoded_image_size as usize
    );
}

#[test]
fn test_solid_image_compresses_well() {
    let width = 640;
    let height = 480;
    let pixels = vec![17u8; 640 * 480];
    let input = write_bmp(width, height, &pixels, &[], 256);
    let (_, summary) = compress_bmp(&input).unwrap();

    // Per row: (255,17) (255,17) (130,17) and a 2-byte terminator
    assert_eq!(summary.encoded_image_size, 480 * 8);
    assert!(summary.ratio() < 0.02);
}

#[test]
fn test_rejects_unsupported_sources() {
    let pixels = scene(4, 2);
    let base = write_bmp(4, 2, &pixels, &[], 256);

    // Bits per pixel at offset 14 + 14
    let mut input = base.clone();
    input[28..30].copy_from_slice(&4u16.to_le_bytes());
    let err = compress_bmp(&input).unwrap_err();
    assert!(matches!(err, Error::Unsupported(Unsupported::BitDepth(4))));

    // Planes at offset 14 + 12
    let mut input = base.clone();
    input[26..28].copy_from_slice(&3u16.to_le_bytes());
    let err = compress_bmp(&input).unwrap_err();
    assert!(matches!(err, Error::Unsupported(Unsupported::Planes(3))));

    // Compression at offset 14 + 16
    let mut input = base.clone();
    input[30..34].copy_from_slice(&BI_RLE4.to_le_bytes());
    let err = compress_bmp(&input).unwrap_err();
    assert!(matches!(
        err,
        Error::Unsupported(Unsupported::Compression(BI_RLE4))
    ));

    // Negative height means top-down
    let mut input = base;
    input[22..26].copy_from_slice(&(-2i32).to_le_bytes());
    let err = compress_bmp(&input).unwrap_err();
    assert!(matches!(err, Error::Unsupported(Unsupported::TopDown)));
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_rejects_malformed_files() {
    let err = compress_bmp(b"GIF89a").unwrap_err();
    assert!(matches!(err, Error::Truncated { .. }));

    let mut input = write_bmp(4, 1, &[1, 2, 3, 4], &[], 256);
    input[0] = b'P';
    let err = compress_bmp(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedContainer);
}

#[test]
fn test_trailing_pixel_bytes_are_dropped() {
    // Some writers add two trailing bytes to image_size
    let pixels = scene(4, 2);
    let mut padded = pixels.clone();
    padded.extend_from_slice(&[0, 0]);
    let input = write_bmp(4, 2, &padded, &[], 256);

    let (output, summary) = compress_bmp(&input).unwrap();
    assert_eq!(summary.source_image_size, 10);
    let converted = Bitmap::parse(&output).unwrap();
    let decoded = decode_rle8(&converted.pixels, row_stride(4)).unwrap();
    assert_eq!(decoded.rows, 2);
    assert_eq!(decoded.pixels, pixels);
}

#[test]
fn test_rejects_height_not_matching_image_size() {
    let input = write_bmp(4, 2, &scene(4, 2), &[], 256);

    // Height at offset 14 + 8; image_size still covers two rows
    let mut taller = input.clone();
    taller[22..26].copy_from_slice(&3i32.to_le_bytes());
    let err = compress_bmp(&taller).unwrap_err();
    assert!(matches!(err, Error::InvalidHeader(_)));
    assert_eq!(err.kind(), ErrorKind::MalformedContainer);

    // Width at offset 14 + 4; two rows of 8 no longer fit in 8 bytes
    let mut wider = input;
    wider[18..22].copy_from_slice(&5i32.to_le_bytes());
    let err = compress_bmp(&wider).unwrap_err();
    assert!(matches!(err, Error::InvalidHeader(_)));
}

#[test]
fn test_compress_file_round_trip() {
    init_logging();
    let dir = std::env::temp_dir().join(format!("bmp-rle8-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("scene.bmp");
    let output_path = dir.join("scene_rle8.bmp");

    let pixels = scene(101, 9);
    std::fs::write(&input_path, write_bmp(101, 9, &pixels, &[], 256)).unwrap();

    let summary = compress_bmp_file(&input_path, &output_path).unwrap();
    let written = std::fs::read(&output_path).unwrap();
    assert_eq!(written.len(), summary.file_size as usize);

    let converted = Bitmap::parse(&written).unwrap();
    let decoded = decode_rle8(&converted.pixels, row_stride(101)).unwrap();
    assert_eq!(decoded.pixels, pixels);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_failed_conversion_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("bmp-rle8-fail-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input_path = dir.join("top_down.bmp");
    let output_path = dir.join("out.bmp");

    std::fs::write(&input_path, write_bmp(4, -1, &[1, 2, 3, 4], &[], 256)).unwrap();
    assert!(compress_bmp_file(&input_path, &output_path).is_err());
    assert!(!output_path.exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_manual_bitmap_round_trip() {
    // Bitmaps built in code serialise and compress like parsed ones
    let bitmap = Bitmap {
        file_header: FileHeader {
            signature: BMP_SIGNATURE,
            file_size: 14 + 40 + 8 + 8,
            reserved: 0,
            pixel_offset: 14 + 40 + 8,
        },
        info_header: InfoHeader {
            header_size: 40,
            width: 4,
            height: 2,
            planes: 1,
            bits_per_pixel: 8,
            compression: BI_RGB,
            image_size: 8,
            x_pixels_per_meter: 0,
            y_pixels_per_meter: 0,
            colors_used: 2,
            colors_important: 2,
        },
        header_extension: Vec::new(),
        palette: vec![PaletteEntry::default(); 2],
        pixels: vec![0, 0, 0, 0, 1, 0, 1, 0],
    };
    let compressed = bitmap.compress_rle8().unwrap();
    assert_eq!(compressed.pixels, [4, 0, 0, 0, 0, 4, 1, 0, 1, 0, 0, 1]);
    assert_eq!(compressed.info_header.colors_important, 2);

    let mut file = Vec::new();
    compressed.write_to(&mut file).unwrap();
    assert_eq!(Bitmap::parse(&file).unwrap(), compressed);
}
