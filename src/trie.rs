//! Decode automaton: a binary trie walked one bit at a time.

use std::io::{Read, Write};

use log::debug;

use crate::bits::{BitReader, check_capacity};
use crate::code::CodeTable;
use crate::error::{HuffmanError, Result};

const ROOT: usize = 0;
/// Link value for a missing child. The root is never anyone's child.
const ABSENT: usize = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TrieNode {
    links: [usize; 2],
    symbol: Option<u8>,
}

impl TrieNode {
    fn is_leaf(&self) -> bool {
        self.links == [ABSENT, ABSENT]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTrie {
    nodes: Vec<TrieNode>,
}

impl DecodeTrie {
    /// Builds the trie for `table`. Fails if any code is a prefix of another.
    pub fn from_table(table: &CodeTable) -> Result<Self> {
        let mut nodes = vec![TrieNode::default()];

        for (symbol, code) in table.iter() {
            let mut cur = ROOT;
            for bit in code.bits() {
                if nodes[cur].symbol.is_some() {
                    return Err(not_prefix_free(symbol));
                }
                let next = nodes[cur].links[bit as usize];
                cur = if next == ABSENT {
                    nodes.push(TrieNode::default());
                    let created = nodes.len() - 1;
                    nodes[cur].links[bit as usize] = created;
                    created
                } else {
                    next
                };
            }
            if cur == ROOT || nodes[cur].symbol.is_some() || !nodes[cur].is_leaf() {
                return Err(not_prefix_free(symbol));
            }
            nodes[cur].symbol = Some(symbol);
        }

        debug!("Decode trie built with {} nodes", nodes.len());
        Ok(Self { nodes })
    }

    pub fn root(&self) -> usize {
        ROOT
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT].is_leaf()
    }

    /// Follows `bit` from `current`. On reaching a leaf, returns its symbol and
    /// the root as the next state.
    pub fn feed_bit(&self, current: usize, bit: bool) -> Result<(usize, Option<u8>)> {
        let Some(node) = self.nodes.get(current) else {
            return Err(HuffmanError::corrupt(format!(
                "decoder state {} outside a trie of {} nodes",
                current,
                self.nodes.len()
            )));
        };
        let next = node.links[bit as usize];
        if next == ABSENT {
            return Err(HuffmanError::corrupt(
                "bit pattern matches no code in the table",
            ));
        }
        let node = &self.nodes[next];
        if node.is_leaf() {
            match node.symbol {
                Some(symbol) => Ok((ROOT, Some(symbol))),
                None => Err(HuffmanError::corrupt("reached a leaf without a symbol")),
            }
        } else {
            Ok((next, None))
        }
    }

    /// Decodes exactly `original_len` bytes from `bits` into `sink`, staging
    /// output in a buffer of `capacity` bytes. Padding bits after the last
    /// symbol are never looked at.
    pub fn decode<R: Read, W: Write>(
        &self,
        bits: &mut BitReader<R>,
        original_len: u64,
        sink: &mut W,
        capacity: usize,
    ) -> Result<u64> {
        check_capacity(capacity)?;
        let mut out = Vec::with_capacity(capacity);
        let mut emitted = 0u64;
        let mut state = ROOT;

        while emitted < original_len {
            let Some(bit) = bits.next_bit()? else {
                return Err(HuffmanError::corrupt(format!(
                    "bitstream ended after {} of {} bytes",
                    emitted, original_len
                )));
            };
            let (next, symbol) = self.feed_bit(state, bit)?;
            state = next;
            if let Some(symbol) = symbol {
                out.push(symbol);
                emitted += 1;
                if out.len() == capacity {
                    sink.write_all(&out)?;
                    out.clear();
                }
            }
        }

        sink.write_all(&out)?;
        sink.flush()?;
        debug!("Decoded {} bytes", emitted);
        Ok(emitted)
    }
}

fn not_prefix_free(symbol: u8) -> HuffmanError {
    HuffmanError::corrupt(format!(
        "code for symbol {:#04x} collides with another code",
        symbol
    ))
}
