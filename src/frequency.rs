use std::io::Read;

use log::debug;

use crate::bits::read_chunk;
use crate::error::Result;

pub const SYMBOLS: usize = 256;

/// Occurrence count of every byte value over one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; SYMBOLS],
    total: u64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: [0; SYMBOLS],
            total: 0,
        }
    }

    /// Counts every byte of `source` in one pass, reading at most `buffer.len()` bytes at a time.
    pub fn count<R: Read>(source: &mut R, buffer: &mut [u8]) -> Result<Self> {
        let mut table = Self::new();
        loop {
            let n = read_chunk(source, buffer)?;
            if n == 0 {
                break;
            }
            table.add_bytes(&buffer[..n]);
        }
        debug!(
            "Counted {} bytes, {} distinct symbols",
            table.total,
            table.distinct()
        );
        Ok(table)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::new();
        table.add_bytes(data);
        table
    }

    pub fn add_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.counts[byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    /// Element-wise addition of a partial table, e.g. one counted over another shard.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
        self.total += other.total;
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Number of bytes counted, i.e. the original length.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Present symbols with their counts, in ascending symbol order.
    pub fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(symbol, count)| (symbol as u8, *count))
    }

    /// Shannon entropy in bits per symbol; zero for an empty table.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.present()
            .map(|(_, count)| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn counts_across_chunk_boundaries() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 7) as u8).collect();
        let mut buffer = [0u8; 13];
        let table = FrequencyTable::count(&mut Cursor::new(&data), &mut buffer).unwrap();
        assert_eq!(table.total(), 1000);
        assert_eq!(table.distinct(), 7);
        assert_eq!(table, FrequencyTable::from_bytes(&data));
        let sum: u64 = table.present().map(|(_, c)| c).sum();
        assert_eq!(sum, table.total());
    }

    #[test]
    fn empty_stream_yields_zero_table() {
        let mut buffer = [0u8; 8];
        let table = FrequencyTable::count(&mut Cursor::new(Vec::<u8>::new()), &mut buffer).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.distinct(), 0);
        assert_eq!(table.entropy(), 0.0);
    }

    #[test]
    fn merge_adds_element_wise() {
        let mut left = FrequencyTable::from_bytes(b"aab");
        let right = FrequencyTable::from_bytes(b"bc");
        left.merge(&right);
        assert_eq!(left, FrequencyTable::from_bytes(b"aabbc"));
    }

    #[test]
    fn entropy_of_uniform_pair_is_one_bit() {
        let table = FrequencyTable::from_bytes(b"abab");
        assert!((table.entropy() - 1.0).abs() < 1e-12);
    }
}
