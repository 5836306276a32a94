//! bmp-rle8 CLI - BI_RLE8 compression for BMP files
//!
//! Reads an uncompressed 8 bits-per-pixel BMP, run-length encodes its pixel
//! array and writes a `BI_RLE8` bitmap with the same headers and color table.
//!
//! # Usage
//!
//! ```bash
//! bmp-rle8 input.bmp                 # writes res.bmp
//! bmp-rle8 input.bmp -o out.bmp -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use bmp_rle8::compress_bmp_file;

/// Compress an uncompressed 8-bit BMP with BI_RLE8 run-length encoding.
#[derive(Parser, Debug)]
#[command(name = "bmp-rle8")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Uncompressed 8 bits-per-pixel BMP file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "OUTPUT", default_value = "res.bmp")]
    output: PathBuf,

    /// Lower the log filter to debug
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    log::debug!(
        "Converting {} -> {}",
        args.input.display(),
        args.output.display()
    );

    match compress_bmp_file(&args.input, &args.output) {
        Ok(summary) => {
            log::info!(
                "{}: {}x{} pixel array {} -> {} bytes ({:.1}%), file size {} bytes",
                args.output.display(),
                summary.width,
                summary.height,
                summary.source_image_size,
                summary.encoded_image_size,
                summary.ratio() * 100.0,
                summary.file_size
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}: {err}", args.input.display());
            ExitCode::FAILURE
        }
    }
}
