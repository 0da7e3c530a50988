// Huffman tree construction.
//
// Nodes live in an arena (`Vec<Node>`) and refer to their children by index,
// so the tree is a plain owned value with no shared or back references.
// Traversal is strictly root-to-leaf.
//
// Tie-breaking: heap entries are ordered by `(weight, node id)`. Leaves are
// allocated in ascending symbol order and internal nodes in creation order,
// so equal weights always resolve the same way for the same table. The
// encoder and decoder of one archive therefore always agree on the shape.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::frequency::FrequencyTable;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// A node of the Huffman tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    /// `children[0]` is reached by a 0 bit, `children[1]` by a 1 bit.
    Internal {
        weight: u64,
        children: [Option<NodeId>; 2],
    },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match *self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => weight,
        }
    }
}

/// Huffman tree over the nonzero symbols of a [`FrequencyTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the tree for `freq`.
    ///
    /// Returns `None` when no symbol has a nonzero count. A table with a
    /// single symbol yields a root with only a 0-child, so that symbol still
    /// gets a one-bit code.
    pub fn build(freq: &FrequencyTable) -> Option<Self> {
        let distinct = freq.distinct_symbols();
        let mut nodes = Vec::with_capacity(distinct.saturating_mul(2));
        let mut heap = BinaryHeap::with_capacity(distinct);

        for (symbol, weight) in freq.symbols() {
            heap.push(Reverse((weight, nodes.len())));
            nodes.push(Node::Leaf { symbol, weight });
        }

        if nodes.len() == 1 {
            let weight = nodes[0].weight();
            nodes.push(Node::Internal {
                weight,
                children: [Some(0), None],
            });
            return Some(Self { nodes, root: 1 });
        }

        loop {
            let Reverse((left_weight, left)) = heap.pop()?;
            let Some(Reverse((right_weight, right))) = heap.pop() else {
                return Some(Self { nodes, root: left });
            };
            // Only a corrupt table can overflow here; saturating keeps the
            // shape deterministic anyway.
            let weight = left_weight.saturating_add(right_weight);
            heap.push(Reverse((weight, nodes.len())));
            nodes.push(Node::Internal {
                weight,
                children: [Some(left), Some(right)],
            });
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Total weight (the payload length the tree was built for).
    pub fn weight(&self) -> u64 {
        self.nodes[self.root].weight()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// The symbol of a degenerate one-leaf tree, if this is one.
    pub fn single_symbol(&self) -> Option<u8> {
        match self.nodes[self.root] {
            Node::Internal {
                children: [Some(only), None],
                ..
            } => match self.nodes[only] {
                Node::Leaf { symbol, .. } => Some(symbol),
                Node::Internal { .. } => None,
            },
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depths(tree: &HuffmanTree) -> Vec<(u8, u64, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(tree.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            match *tree.node(id) {
                Node::Leaf { symbol, weight } => out.push((symbol, weight, depth)),
                Node::Internal { children, .. } => {
                    for child in children.into_iter().flatten() {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }
        out.sort();
        out
    }

    #[test]
    fn empty_table_has_no_tree() {
        assert!(HuffmanTree::build(&FrequencyTable::new()).is_none());
    }

    #[test]
    fn single_symbol_is_degenerate_root() {
        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(&[9u8; 40])).unwrap();
        assert_eq!(tree.single_symbol(), Some(9));
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.weight(), 40);
        assert_eq!(depths(&tree), vec![(9, 40, 1)]);
    }

    #[test]
    fn two_symbols_are_siblings() {
        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(b"aab")).unwrap();
        assert_eq!(tree.single_symbol(), None);
        // Lighter node is popped first and becomes the 0-child.
        match *tree.node(tree.root()) {
            Node::Internal {
                weight,
                children: [Some(l), Some(r)],
            } => {
                assert_eq!(weight, 3);
                assert_eq!(*tree.node(l), Node::Leaf { symbol: b'b', weight: 1 });
                assert_eq!(*tree.node(r), Node::Leaf { symbol: b'a', weight: 2 });
            }
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn weighted_path_length_is_optimal() {
        // Textbook example (CLRS 16.3): optimal cost is 224.
        let mut counts = [0u64; 256];
        for (s, w) in [(b'a', 45), (b'b', 13), (b'c', 12), (b'd', 16), (b'e', 9), (b'f', 5)] {
            counts[s as usize] = w;
        }
        let tree = HuffmanTree::build(&FrequencyTable::from_counts(counts)).unwrap();
        let cost: u64 = depths(&tree).iter().map(|&(_, w, d)| w * d as u64).sum();
        assert_eq!(cost, 224);
        assert_eq!(tree.weight(), 100);
        assert_eq!(tree.leaf_count(), 6);
    }

    #[test]
    fn internal_weights_are_child_sums() {
        let tree = HuffmanTree::build(&FrequencyTable::from_bytes(b"the quick brown fox")).unwrap();
        for id in 0..tree.nodes.len() {
            if let Node::Internal { weight, children } = *tree.node(id) {
                let sum: u64 = children
                    .into_iter()
                    .flatten()
                    .map(|c| tree.node(c).weight())
                    .sum();
                assert_eq!(weight, sum);
            }
        }
    }

    #[test]
    fn construction_is_deterministic() {
        // Many equal weights to exercise tie-breaking.
        let data: Vec<u8> = (0..=255u8).collect();
        let freq = FrequencyTable::from_bytes(&data);
        let a = HuffmanTree::build(&freq).unwrap();
        let b = HuffmanTree::build(&freq).unwrap();
        assert_eq!(a, b);
        assert!(depths(&a).iter().all(|&(_, _, d)| d == 8));
    }
}
