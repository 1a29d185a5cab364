use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use thiserror::Error;

use huffman_stream::{Codec, CodecConfig, DEFAULT_BUFFER_SIZE, HuffmanError, read_header};

#[derive(Parser)]
#[command(name = "huffman", version)]
#[command(about = "Static Huffman compression for files of any size.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress SRC into DST
    Compress {
        src: PathBuf,
        dst: PathBuf,
        /// Size in bytes of the I/O staging buffers
        #[arg(long, env = "HUFFMAN_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },
    /// Decompress SRC into DST
    Decompress {
        src: PathBuf,
        dst: PathBuf,
        #[arg(long, env = "HUFFMAN_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },
    /// Print the code table stored in a compressed file
    Codes { src: PathBuf },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("source file matches destination file: {0}")]
    SameFile(PathBuf),

    #[error(transparent)]
    Codec(#[from] HuffmanError),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Codec(HuffmanError::Io(err))
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let started = Instant::now();

    let result = match &cli.command {
        Commands::Compress {
            src,
            dst,
            buffer_size,
        } => compress_file(src, dst, *buffer_size),
        Commands::Decompress {
            src,
            dst,
            buffer_size,
        } => decompress_file(src, dst, *buffer_size),
        Commands::Codes { src } => print_codes(src),
    };

    match result {
        Ok(()) => {
            if !matches!(cli.command, Commands::Codes { .. }) {
                println!("Duration: {} ms", started.elapsed().as_millis());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn same_file(src: &Path, dst: &Path) -> bool {
    if src == dst {
        return true;
    }
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Creates `dst` and hands it to `op`. Only a file created here is removed
/// when `op` fails.
fn write_output<T, F>(dst: &Path, op: F) -> Result<T, CliError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<T, HuffmanError>,
{
    let mut sink = BufWriter::new(File::create(dst)?);
    let result = op(&mut sink);
    drop(sink);

    if result.is_err() {
        warn!("Removing partial output {}", dst.display());
        if let Err(e) = fs::remove_file(dst) {
            warn!("Could not remove {}: {}", dst.display(), e);
        }
    }
    Ok(result?)
}

fn compress_file(src: &Path, dst: &Path, buffer_size: usize) -> Result<(), CliError> {
    if same_file(src, dst) {
        return Err(CliError::SameFile(src.to_path_buf()));
    }
    info!("Compressing {} into {}", src.display(), dst.display());
    let config = CodecConfig::new(buffer_size)?;
    let mut source = BufReader::new(File::open(src)?);

    let stats = write_output(dst, |sink| Codec::new(config).compress(&mut source, sink))?;

    let ratio = if stats.original_len > 0 {
        100.0 * (1.0 - stats.compressed_len() as f64 / stats.original_len as f64)
    } else {
        0.0
    };
    println!(
        "✅ Encoding successful.\n\
         📂  Input:       {} ({} bytes)\n\
         💾  Output:      {} ({} bytes)\n\
         🔣  Symbols:     {}\n\
         ℹ️  Entropy:     {:.4} bits/symbol\n\
         🗜️  Ratio:       {:.4}%",
        src.display(),
        stats.original_len,
        dst.display(),
        stats.compressed_len(),
        stats.distinct_symbols,
        stats.entropy,
        ratio
    );
    Ok(())
}

fn decompress_file(src: &Path, dst: &Path, buffer_size: usize) -> Result<(), CliError> {
    if same_file(src, dst) {
        return Err(CliError::SameFile(src.to_path_buf()));
    }
    info!("Decompressing {} into {}", src.display(), dst.display());
    let config = CodecConfig::new(buffer_size)?;
    let input_size = fs::metadata(src)?.len();
    let mut source = BufReader::new(File::open(src)?);

    let stats = write_output(dst, |sink| Codec::new(config).decompress(&mut source, sink))?;

    println!(
        "✅ Decoding successful.\n\
         📂  Input:       {} ({} bytes)\n\
         💾  Output:      {} ({} bytes)\n\
         🔣  Symbols:     {}",
        src.display(),
        input_size,
        dst.display(),
        stats.original_len,
        stats.distinct_symbols
    );
    Ok(())
}

fn print_codes(src: &Path) -> Result<(), CliError> {
    let mut source = BufReader::new(File::open(src)?);
    let header = read_header(&mut source)?;

    println!(
        "Original length: {} bytes, {} symbols",
        header.original_len,
        header.table.len()
    );
    for (byte, code) in header.table.iter() {
        println!("{:#04x} '{}' => {}", byte, byte.escape_ascii(), code);
    }
    Ok(())
}
