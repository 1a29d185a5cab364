//! Static, whole-alphabet Huffman compression over byte streams.
//!
//! Compression makes two passes over a seekable source (count, then encode);
//! decompression makes one. Memory use is bounded by the configured buffer
//! size, whatever the input length.

pub mod bits;
pub mod code;
pub mod codec;
pub mod config;
pub mod error;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod trie;

pub use code::{Code, CodeTable};
pub use codec::{Codec, CompressStats, DecompressStats, compress, decompress};
pub use config::{CodecConfig, DEFAULT_BUFFER_SIZE};
pub use error::{HuffmanError, Result};
pub use frequency::FrequencyTable;
pub use header::{Header, read_header, write_header};
pub use trie::DecodeTrie;
