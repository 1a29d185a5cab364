//! Self-describing archive header.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! [8 bytes]  original length
//! [4 bytes]  distinct symbol count N (0..=256)
//! N times:
//!   [1 byte]           symbol
//!   [4 bytes]          code length L (1..=255)
//!   [ceil(L/8) bytes]  code bits, MSB-first
//! ```
//!
//! The symbol count is zero exactly when the original length is zero. A
//! header breaking that rule in either direction is rejected as corrupt.

use std::io::{Read, Write};

use log::debug;

use crate::code::{Code, CodeTable, MAX_CODE_BITS, packed_len};
use crate::error::{HuffmanError, Result};
use crate::frequency::SYMBOLS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub original_len: u64,
    pub table: CodeTable,
}

impl Header {
    /// Size in bytes of this header once written.
    pub fn encoded_len(&self) -> u64 {
        encoded_len(&self.table)
    }
}

fn encoded_len(table: &CodeTable) -> u64 {
    12 + table
        .iter()
        .map(|(_, code)| 5 + packed_len(code.len()) as u64)
        .sum::<u64>()
}

/// Writes the header and returns the number of bytes written.
pub fn write_header<W: Write>(table: &CodeTable, original_len: u64, sink: &mut W) -> Result<u64> {
    let symbols = table.len() as u32;
    sink.write_all(&original_len.to_le_bytes())?;
    sink.write_all(&symbols.to_le_bytes())?;

    for (symbol, code) in table.iter() {
        sink.write_all(&[symbol])?;
        sink.write_all(&code.len().to_le_bytes())?;
        sink.write_all(code.bytes())?;
    }

    let written = encoded_len(table);
    debug!(
        "Header written: original length {}, {} symbols, {} bytes",
        original_len, symbols, written
    );
    Ok(written)
}

/// Reads and validates a header. Truncation and out-of-range fields are
/// reported as [`HuffmanError::CorruptArchive`].
pub fn read_header<R: Read>(source: &mut R) -> Result<Header> {
    let original_len = u64::from_le_bytes(read_array(source, "original length")?);
    let symbols = u32::from_le_bytes(read_array(source, "symbol count")?);
    if symbols as usize > SYMBOLS {
        return Err(HuffmanError::corrupt(format!(
            "symbol count {} exceeds {}",
            symbols, SYMBOLS
        )));
    }
    if symbols == 0 && original_len != 0 {
        return Err(HuffmanError::corrupt(format!(
            "no symbols declared for {} bytes of content",
            original_len
        )));
    }
    if symbols != 0 && original_len == 0 {
        return Err(HuffmanError::corrupt(format!(
            "{} symbols declared for empty content",
            symbols
        )));
    }

    let mut table = CodeTable::new();
    for _ in 0..symbols {
        let [symbol] = read_array::<_, 1>(source, "symbol entry")?;
        let len = u32::from_le_bytes(read_array(source, "code length")?);
        if len == 0 || len > MAX_CODE_BITS {
            return Err(HuffmanError::corrupt(format!(
                "code length {} for symbol {:#04x} out of range",
                len, symbol
            )));
        }
        let mut bytes = vec![0u8; packed_len(len)];
        source
            .read_exact(&mut bytes)
            .map_err(|e| HuffmanError::from_read(e, "code bits"))?;
        if table.insert(symbol, Code::from_packed(len, bytes)).is_some() {
            return Err(HuffmanError::corrupt(format!(
                "symbol {:#04x} declared twice",
                symbol
            )));
        }
    }

    debug!(
        "Header read: original length {}, {} symbols",
        original_len, symbols
    );
    Ok(Header {
        original_len,
        table,
    })
}

fn read_array<R: Read, const N: usize>(source: &mut R, what: &str) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    source
        .read_exact(&mut buf)
        .map_err(|e| HuffmanError::from_read(e, what))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_table() -> CodeTable {
        let mut table = CodeTable::new();
        table.insert(b'a', Code::from_bits(&[false]));
        table.insert(b'b', Code::from_bits(&[true, false]));
        table.insert(
            b'c',
            Code::from_bits(&[true, true, true, true, true, true, true, true, true]),
        );
        table
    }

    #[test]
    fn layout_is_little_endian() {
        let mut table = CodeTable::new();
        table.insert(0x07, Code::from_bits(&[true, false, true]));
        let mut out = Vec::new();
        let written = write_header(&table, 0x0102, &mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0x02, 0x01, 0, 0, 0, 0, 0, 0, // length
                1, 0, 0, 0, // symbols
                0x07, 3, 0, 0, 0, 0b1010_0000,
            ]
        );
        assert_eq!(written, out.len() as u64);
    }

    #[test]
    fn reads_back_what_was_written() {
        let table = sample_table();
        let mut out = Vec::new();
        write_header(&table, 42, &mut out).unwrap();
        out.extend_from_slice(b"payload");

        let mut cursor = Cursor::new(out);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.original_len, 42);
        assert_eq!(header.table, table);
        assert_eq!(header.encoded_len(), cursor.position());
    }

    #[test]
    fn empty_header() {
        let mut out = Vec::new();
        write_header(&CodeTable::new(), 0, &mut out).unwrap();
        assert_eq!(out.len(), 12);
        let header = read_header(&mut Cursor::new(out)).unwrap();
        assert!(header.table.is_empty());
        assert_eq!(header.original_len, 0);
    }

    #[test]
    fn rejects_too_many_symbols() {
        let mut data = 10u64.to_le_bytes().to_vec();
        data.extend_from_slice(&257u32.to_le_bytes());
        let err = read_header(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, HuffmanError::CorruptArchive { .. }));
    }

    #[test]
    fn rejects_every_truncation() {
        let mut full = Vec::new();
        write_header(&sample_table(), 9, &mut full).unwrap();
        for cut in 0..full.len() {
            let err = read_header(&mut Cursor::new(&full[..cut])).unwrap_err();
            assert!(
                matches!(err, HuffmanError::CorruptArchive { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_zero_and_oversized_code_lengths() {
        for len in [0u32, MAX_CODE_BITS + 1] {
            let mut data = 1u64.to_le_bytes().to_vec();
            data.extend_from_slice(&1u32.to_le_bytes());
            data.push(b'x');
            data.extend_from_slice(&len.to_le_bytes());
            data.extend_from_slice(&[0u8; 40]);
            let err = read_header(&mut Cursor::new(data)).unwrap_err();
            assert!(matches!(err, HuffmanError::CorruptArchive { .. }));
        }
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let mut data = 2u64.to_le_bytes().to_vec();
        data.extend_from_slice(&2u32.to_le_bytes());
        for bits in [0u8, 0x80] {
            data.push(b'x');
            data.extend_from_slice(&1u32.to_le_bytes());
            data.push(bits);
        }
        let err = read_header(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, HuffmanError::CorruptArchive { .. }));
    }

    #[test]
    fn rejects_content_without_symbols() {
        let mut data = 5u64.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        let err = read_header(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, HuffmanError::CorruptArchive { .. }));
    }

    #[test]
    fn rejects_symbols_without_content() {
        let mut data = 0u64.to_le_bytes().to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(b'x');
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(0);
        let err = read_header(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, HuffmanError::CorruptArchive { .. }));
    }
}
