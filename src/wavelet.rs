//! Wavelet tree shaped by an alphabetic (Hu-Tucker) tree.
//!
//! Instead of halving a symbol alphabet, each internal node here covers the
//! interval of an alphabetic-tree node over the value-index domain and
//! stores one bitmap recording, per position of its slice, whether the
//! element was contributed by the left (0) or right (1) subtree.
//!
//! The build runs bottom-up over a shared scratch sequence: a node's slice
//! starts as its left child's sorted values followed by its right child's
//! sorted values (a leaf's slice is a single ascending run, sorted by
//! definition), and the node merges the two halves while emitting its
//! bitmap, writing the merged result back in place. Completing the root
//! therefore leaves the whole scratch sequence sorted; decoding relies on
//! the element-to-leaf mapping this order encodes. Only the per-node bit
//! sequences survive; the alphabetic tree and the sorted scratch are
//! dropped.

use log::debug;

use crate::bitvec::{BitSequence, BitVector, W};
use crate::hutucker::{HuTucker, TreeNode};

/// One wavelet-tree node: a branch bitmap plus up to two children.
///
/// A missing child is an implicit leaf: its run contributes positions but
/// no bitmap.
pub struct WaveletNode {
    pub(crate) bits: Box<dyn BitSequence>,
    pub(crate) children: [Option<Box<WaveletNode>>; 2],
}

impl WaveletNode {
    pub(crate) fn new(bits: Box<dyn BitSequence>) -> Self {
        Self {
            bits,
            children: [None, None],
        }
    }

    fn size_bytes(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>() + self.bits.size_bytes();
        for child in self.children.iter().flatten() {
            bytes += child.size_bytes();
        }
        bytes
    }

    fn bits_required(&self) -> usize {
        let mut bits = self.bits.bits_required();
        for child in self.children.iter().flatten() {
            bits += child.bits_required();
        }
        bits
    }

    pub(crate) fn count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(|c| c.count())
            .sum::<usize>()
    }
}

/// Wavelet tree over the run decomposition of a value sequence.
pub struct WaveletTree {
    pub(crate) root: WaveletNode,
    /// Number of nodes carrying a bitmap.
    nodes: usize,
}

impl WaveletTree {
    /// Build the tree for `values` whose ascending runs have the lengths
    /// `runs`. `values` is scratch: on return it is sorted ascending.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty or `runs` does not sum to its length.
    pub fn new(values: &mut [usize], runs: &[usize]) -> Self {
        assert!(!values.is_empty(), "value sequence must be non-empty");
        assert_eq!(
            runs.iter().sum::<usize>(),
            values.len(),
            "run lengths must cover the value sequence"
        );
        debug!(
            "building wavelet tree: {} values, {} runs",
            values.len(),
            runs.len()
        );

        let ht = HuTucker::new(runs);
        if ht.leaves() == 1 {
            // A single run is already sorted: the root keeps an all-zero
            // bitmap and no children, and queries reduce to the identity.
            let bits = BitVector::new(&[], values.len());
            return Self {
                root: WaveletNode::new(Box::new(bits)),
                nodes: 1,
            };
        }

        let mut nodes = 1;
        let root = Self::build(ht.root(), values, &mut nodes);
        debug_assert_eq!(nodes, ht.internal_nodes());
        debug_assert!(values.windows(2).all(|p| p[0] <= p[1]));
        Self { root, nodes }
    }

    /// Reassemble a tree from loaded parts.
    pub(crate) fn from_root(root: WaveletNode) -> Self {
        let nodes = root.count();
        Self { root, nodes }
    }

    /// Post-order build: children first, then merge this node's two sorted
    /// halves in place while recording the branch bitmap.
    fn build(bnode: &TreeNode, values: &mut [usize], nodes: &mut usize) -> WaveletNode {
        let left_shape = bnode.children[0]
            .as_deref()
            .expect("internal alphabetic node has two children");
        let right_shape = bnode.children[1]
            .as_deref()
            .expect("internal alphabetic node has two children");

        let left = if left_shape.internal {
            *nodes += 1;
            Some(Box::new(Self::build(left_shape, values, nodes)))
        } else {
            None
        };
        let right = if right_shape.internal {
            *nodes += 1;
            Some(Box::new(Self::build(right_shape, values, nodes)))
        } else {
            None
        };

        let width = bnode.weight;
        let base = bnode.start;
        let rbase = bnode.end + 1 - right_shape.weight;
        let mut bitmap = vec![0u64; width / W + 1];
        let mut merged = Vec::with_capacity(width);

        let (mut i, mut j) = (0, 0);
        while i < left_shape.weight && j < right_shape.weight {
            if values[base + i] < values[rbase + j] {
                merged.push(values[base + i]);
                i += 1;
            } else {
                bitmap[merged.len() / W] |= 1 << (merged.len() % W);
                merged.push(values[rbase + j]);
                j += 1;
            }
        }
        while i < left_shape.weight {
            merged.push(values[base + i]);
            i += 1;
        }
        while j < right_shape.weight {
            bitmap[merged.len() / W] |= 1 << (merged.len() % W);
            merged.push(values[rbase + j]);
            j += 1;
        }
        values[base..=bnode.end].copy_from_slice(&merged);

        let mut node = WaveletNode::new(Box::new(BitVector::new(&bitmap, width)));
        node.children = [left, right];
        node
    }

    /// Length of the underlying value sequence.
    pub fn len(&self) -> usize {
        self.root.bits.len()
    }

    /// Returns true if the underlying sequence has length 0 (never, by
    /// construction).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bitmap-carrying nodes.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Struct and heap bytes of the whole tree.
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.root.size_bytes()
    }

    /// Space accounting over all node bitmaps: packed data words plus rank
    /// table words, in bits.
    pub fn bits_required(&self) -> usize {
        self.root.bits_required()
    }
}
