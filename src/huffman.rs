use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use crate::frequency::FrequencyTable;

/// Prefix-code tree. Each internal node uniquely owns both children.
#[derive(Debug, Eq, PartialEq)]
pub enum Node {
    Leaf {
        byte: u8,
        freq: u64,
    },
    Internal {
        freq: u64,
        /// Smallest symbol in this subtree; breaks ties between equal weights.
        key: u8,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq,
        }
    }

    pub fn key(&self) -> u8 {
        match self {
            Node::Leaf { byte, .. } => *byte,
            Node::Internal { key, .. } => *key,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

pub type HuffmanTree = Node;

/// Heap entry ordered by (weight, key), smallest first.
#[derive(Eq, PartialEq)]
struct HeapNode {
    freq: u64,
    key: u8,
    node: Box<Node>,
}

impl HeapNode {
    fn new(node: Node) -> Self {
        Self {
            freq: node.freq(),
            key: node.key(),
            node: Box::new(node),
        }
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so both keys are reversed
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the Huffman tree for every symbol with a non-zero count.
///
/// The first node popped becomes the left child. Keys of nodes in the heap are
/// always distinct, so the merge order never depends on insertion order.
/// Returns `None` for an empty table; a single symbol yields a bare leaf.
pub fn build_huffman_tree(frequencies: &FrequencyTable) -> Option<Box<HuffmanTree>> {
    debug!(
        "Building Huffman tree from {} unique symbols",
        frequencies.distinct()
    );

    let mut heap: BinaryHeap<HeapNode> = frequencies
        .present()
        .map(|(byte, freq)| HeapNode::new(Node::Leaf { byte, freq }))
        .collect();

    while heap.len() > 1 {
        let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
            break;
        };
        heap.push(HeapNode {
            freq: left.freq + right.freq,
            key: left.key.min(right.key),
            node: Box::new(Node::Internal {
                freq: left.freq + right.freq,
                key: left.key.min(right.key),
                left: left.node,
                right: right.node,
            }),
        });
    }

    heap.pop().map(|n| n.node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_of(node: &Node, byte: u8) -> Option<usize> {
        match node {
            Node::Leaf { byte: b, .. } => (*b == byte).then_some(0),
            Node::Internal { left, right, .. } => depth_of(left, byte)
                .or_else(|| depth_of(right, byte))
                .map(|d| d + 1),
        }
    }

    fn check_weights(node: &Node) -> u64 {
        match node {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal {
                freq, left, right, ..
            } => {
                assert_eq!(*freq, check_weights(left) + check_weights(right));
                assert_eq!(node.key(), left.key().min(right.key()));
                *freq
            }
        }
    }

    #[test]
    fn empty_table_has_no_tree() {
        assert!(build_huffman_tree(&FrequencyTable::new()).is_none());
    }

    #[test]
    fn single_symbol_is_a_leaf() {
        let tree = build_huffman_tree(&FrequencyTable::from_bytes(b"zzzz")).unwrap();
        assert_eq!(*tree, Node::Leaf { byte: b'z', freq: 4 });
    }

    #[test]
    fn internal_weights_sum_children() {
        let table = FrequencyTable::from_bytes(b"abracadabra alakazam");
        let tree = build_huffman_tree(&table).unwrap();
        assert_eq!(check_weights(&tree), table.total());
    }

    #[test]
    fn frequent_symbols_sit_higher() {
        let table = FrequencyTable::from_bytes(b"aaaaaaaabbbbccd");
        let tree = build_huffman_tree(&table).unwrap();
        let a = depth_of(&tree, b'a').unwrap();
        let d = depth_of(&tree, b'd').unwrap();
        assert!(a < d);
    }

    #[test]
    fn equal_weights_merge_by_symbol() {
        let tree = build_huffman_tree(&FrequencyTable::from_bytes(b"dcba")).unwrap();
        // (a,b) and (c,d) merge first, in that order
        let Node::Internal { left, right, .. } = *tree else {
            panic!("expected internal root");
        };
        assert_eq!(left.key(), b'a');
        assert_eq!(right.key(), b'c');
        let Node::Internal { left: ab_left, .. } = *left else {
            panic!("expected internal node");
        };
        assert!(ab_left.is_leaf());
        assert_eq!(ab_left.key(), b'a');
    }

    #[test]
    fn build_is_deterministic() {
        let table = FrequencyTable::from_bytes(b"the quick brown fox jumps over the lazy dog");
        assert_eq!(build_huffman_tree(&table), build_huffman_tree(&table));
    }
}
