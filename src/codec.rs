//! Stream driver: two passes to compress, one pass to decompress.

use std::io::{Read, Seek, Write};

use log::{debug, info};

use crate::bits::{BitReader, BitWriter, read_chunk};
use crate::code::CodeTable;
use crate::config::CodecConfig;
use crate::error::{HuffmanError, Result};
use crate::frequency::FrequencyTable;
use crate::header::{read_header, write_header};
use crate::huffman::build_huffman_tree;
use crate::trie::DecodeTrie;

#[derive(Debug, Clone, PartialEq)]
pub struct CompressStats {
    pub original_len: u64,
    pub header_len: u64,
    /// Bits of packed payload, before padding to a whole byte.
    pub payload_bits: u64,
    pub distinct_symbols: usize,
    /// Shannon entropy of the input in bits per symbol.
    pub entropy: f64,
}

impl CompressStats {
    /// Bytes written to the sink.
    pub fn compressed_len(&self) -> u64 {
        self.header_len + self.payload_bits.div_ceil(8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressStats {
    pub original_len: u64,
    pub header_len: u64,
    pub distinct_symbols: usize,
}

/// Owns the staging buffers for a single compress or decompress call.
pub struct Codec {
    config: CodecConfig,
    buffer: Vec<u8>,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            buffer: vec![0; config.buffer_size()],
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compresses all of `source` into `sink`. The source is rewound before
    /// each of the two passes.
    pub fn compress<R, W>(&mut self, source: &mut R, sink: &mut W) -> Result<CompressStats>
    where
        R: Read + Seek,
        W: Write,
    {
        source.rewind()?;
        let frequencies = FrequencyTable::count(source, &mut self.buffer)?;
        let table = match build_huffman_tree(&frequencies) {
            Some(tree) => CodeTable::derive(&tree),
            None => CodeTable::new(),
        };

        let header_len = write_header(&table, frequencies.total(), sink)?;
        let mut stats = CompressStats {
            original_len: frequencies.total(),
            header_len,
            payload_bits: 0,
            distinct_symbols: table.len(),
            entropy: frequencies.entropy(),
        };
        if table.is_empty() {
            debug!("Empty input, header only");
            sink.flush()?;
            return Ok(stats);
        }

        source.rewind()?;
        let mut writer = BitWriter::new(&mut *sink, self.config.buffer_size())?;
        let mut seen = 0u64;
        loop {
            let n = read_chunk(source, &mut self.buffer)?;
            if n == 0 {
                break;
            }
            for &byte in &self.buffer[..n] {
                let code = table.get(byte).ok_or_else(|| HuffmanError::SourceChanged {
                    message: format!("byte {:#04x} was not seen in the first pass", byte),
                })?;
                writer.pack(code)?;
            }
            seen += n as u64;
        }
        if seen != frequencies.total() {
            return Err(HuffmanError::SourceChanged {
                message: format!(
                    "first pass read {} bytes, second pass {}",
                    frequencies.total(),
                    seen
                ),
            });
        }

        stats.payload_bits = writer.bits_written();
        writer.finish()?;
        info!(
            "Compressed {} bytes into {} bytes ({} symbols)",
            stats.original_len,
            stats.compressed_len(),
            stats.distinct_symbols
        );
        Ok(stats)
    }

    /// Decompresses `source` into `sink`, stopping once the recorded original
    /// length has been emitted. Bytes after that point are left unread or ignored.
    pub fn decompress<R, W>(&mut self, source: &mut R, sink: &mut W) -> Result<DecompressStats>
    where
        R: Read,
        W: Write,
    {
        let header = read_header(source)?;
        let stats = DecompressStats {
            original_len: header.original_len,
            header_len: header.encoded_len(),
            distinct_symbols: header.table.len(),
        };
        // read_header guarantees symbols are present exactly when content is
        if header.original_len == 0 {
            debug!("Archive holds no content");
            sink.flush()?;
            return Ok(stats);
        }

        let trie = DecodeTrie::from_table(&header.table)?;
        let capacity = self.config.buffer_size();
        let mut bits = BitReader::new(&mut *source, capacity)?;
        trie.decode(&mut bits, header.original_len, sink, capacity)?;
        info!(
            "Decompressed {} bytes ({} symbols)",
            stats.original_len, stats.distinct_symbols
        );
        Ok(stats)
    }
}

/// Compresses with the default configuration.
pub fn compress<R, W>(source: &mut R, sink: &mut W) -> Result<CompressStats>
where
    R: Read + Seek,
    W: Write,
{
    Codec::new(CodecConfig::default()).compress(source, sink)
}

/// Decompresses with the default configuration.
pub fn decompress<R, W>(source: &mut R, sink: &mut W) -> Result<DecompressStats>
where
    R: Read,
    W: Write,
{
    Codec::new(CodecConfig::default()).decompress(source, sink)
}
