//! Per-symbol bit codes and the table derived from a Huffman tree.
//!
//! Bit convention, shared with the decode automaton: a `0` bit selects the
//! left child, a `1` bit the right child. A tree made of a single leaf is read
//! as that leaf hanging off the left of an implicit root, so the lone symbol
//! is coded as the single bit `0`.

use std::fmt;

use log::{debug, trace};

use crate::frequency::{FrequencyTable, SYMBOLS};
use crate::huffman::Node;

/// Longest code the format accepts; a 256-leaf tree is at most 255 deep.
pub const MAX_CODE_BITS: u32 = 255;

/// A variable-length bit string, stored MSB-first, eight bits per byte.
/// Bits past `len` in the last byte are always zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Code {
    len: u32,
    bytes: Vec<u8>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a code from its packed form, clearing any bits past `len`.
    /// `bytes` must hold exactly `ceil(len / 8)` bytes.
    pub fn from_packed(len: u32, mut bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), packed_len(len));
        let tail = len % 8;
        if tail != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xFFu8 << (8 - tail);
            }
        }
        Self { len, bytes }
    }

    pub fn from_bits(bits: &[bool]) -> Self {
        let mut code = Self::new();
        for &bit in bits {
            code.push(bit);
        }
        code
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed bytes, `ceil(len / 8)` of them.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push(&mut self, bit: bool) {
        let index = self.len as usize;
        if index / 8 == self.bytes.len() {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[index / 8] |= 0x80 >> (index % 8);
        }
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<bool> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let index = self.len as usize;
        let bit = self.bit(index);
        if index % 8 == 0 {
            self.bytes.pop();
        } else {
            self.bytes[index / 8] &= !(0x80 >> (index % 8));
        }
        Some(bit)
    }

    /// Bit at `index`, counting from the most significant end.
    pub fn bit(&self, index: usize) -> bool {
        self.bytes[index / 8] & (0x80 >> (index % 8)) != 0
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len as usize).map(|i| self.bit(i))
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (0..self.len as usize).all(|i| self.bit(i) == other.bit(i))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Bytes needed to hold `bits` bits.
pub fn packed_len(bits: u32) -> usize {
    bits.div_ceil(8) as usize
}

/// Symbol to code mapping, populated only for symbols present in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<Code>>,
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeTable {
    pub fn new() -> Self {
        Self {
            codes: vec![None; SYMBOLS],
        }
    }

    /// Walks the tree depth first, left before right.
    pub fn derive(root: &Node) -> Self {
        let mut table = Self::new();
        let mut prefix = Code::new();
        if root.is_leaf() {
            prefix.push(false);
        }
        build_code_table(root, &mut prefix, &mut table);
        debug!(
            "Code table derived: {} symbols, longest code {} bits",
            table.len(),
            table.max_len()
        );
        table
    }

    pub fn insert(&mut self, symbol: u8, code: Code) -> Option<Code> {
        self.codes[symbol as usize].replace(code)
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes[symbol as usize].as_ref()
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(Option::is_none)
    }

    /// Present symbols in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.as_ref().map(|c| (symbol as u8, c)))
    }

    pub fn max_len(&self) -> u32 {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Size of the packed bitstream for input with these frequencies.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        frequencies
            .present()
            .map(|(symbol, count)| count * self.get(symbol).map_or(0, |c| c.len() as u64))
            .sum()
    }
}

fn build_code_table(node: &Node, prefix: &mut Code, table: &mut CodeTable) {
    match node {
        Node::Leaf { byte, .. } => {
            trace!(
                "Assigning code to byte {:#04x} ('{}') : '{}'",
                byte,
                byte.escape_ascii(),
                prefix
            );
            table.insert(*byte, prefix.clone());
        }
        Node::Internal { left, right, .. } => {
            prefix.push(false);
            build_code_table(left, prefix, table);
            prefix.pop();
            prefix.push(true);
            build_code_table(right, prefix, table);
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::build_huffman_tree;

    fn table_for(data: &[u8]) -> CodeTable {
        let tree = build_huffman_tree(&FrequencyTable::from_bytes(data)).unwrap();
        CodeTable::derive(&tree)
    }

    #[test]
    fn push_and_pop_across_bytes() {
        let bits = [true, false, true, true, false, false, true, false, true, true];
        let mut code = Code::from_bits(&bits);
        assert_eq!(code.len(), 10);
        assert_eq!(code.bytes(), &[0b1011_0010, 0b1100_0000]);
        assert_eq!(code.to_string(), "1011001011");

        assert_eq!(code.pop(), Some(true));
        assert_eq!(code.pop(), Some(true));
        assert_eq!(code.bytes(), &[0b1011_0010]);
        assert_eq!(code.pop(), Some(false));
        assert_eq!(code.pop(), Some(true));
        assert_eq!(code.bytes(), &[0b1011_0000]);
        assert_eq!(code.len(), 6);
    }

    #[test]
    fn from_packed_clears_trailing_bits() {
        let code = Code::from_packed(3, vec![0b1011_1111]);
        assert_eq!(code.bytes(), &[0b1010_0000]);
        assert_eq!(code, Code::from_bits(&[true, false, true]));
    }

    #[test]
    fn lone_symbol_gets_one_bit() {
        let table = table_for(&[0x41; 100]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0x41).unwrap().to_string(), "0");
    }

    #[test]
    fn skewed_pair_favours_frequent_symbol() {
        let table = table_for(&[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(table.len(), 2);
        let zero = table.get(0x00).unwrap();
        let one = table.get(0x01).unwrap();
        assert!(zero.len() <= one.len());
        assert_eq!(zero.len(), 1);
        // the rarer symbol is popped first and goes left
        assert_eq!(one.to_string(), "0");
        assert_eq!(zero.to_string(), "1");
    }

    #[test]
    fn codes_are_prefix_free() {
        let table = table_for(b"it was the best of times, it was the worst of times");
        let codes: Vec<_> = table.iter().collect();
        for (a, code_a) in &codes {
            for (b, code_b) in &codes {
                if a != b {
                    assert!(!code_a.is_prefix_of(code_b), "{a} prefixes {b}");
                }
            }
        }
    }

    #[test]
    fn encoded_bits_matches_code_lengths() {
        let data = b"aaaabbc";
        let table = table_for(data);
        let expected: u64 = data.iter().map(|&b| table.get(b).unwrap().len() as u64).sum();
        assert_eq!(table.encoded_bits(&FrequencyTable::from_bytes(data)), expected);
    }
}
