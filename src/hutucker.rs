//! Order-preserving minimum-weight binary trees (Hu-Tucker).
//!
//! Given an ordered sequence of positive leaf weights, builds a binary tree
//! whose leaves keep their left-to-right order while the total weighted
//! depth is the minimum over *all* order-preserving binary trees. This is a
//! strictly harder constraint than Huffman coding, solved with the
//! classical three-phase algorithm: combination (an unconstrained tree that
//! fixes per-leaf depths), level assignment, and a stack recombination that
//! rebuilds an order-preserving tree from those depths.
//!
//! Construction is O(L²) in the number of leaves: each merge performs a
//! linear minimum search and a linear removal. The codecs use one leaf per
//! run, so L is small relative to the permutation length for compressible
//! inputs and the quadratic bound is acceptable.

use log::debug;

/// A node of the alphabetic tree.
///
/// Leaves carry one input weight and its position in the weight sequence;
/// internal nodes carry the sum of their children. Every node knows the
/// half-open-free interval `[start, end]` it covers in the flattened
/// weight-index domain (prefix sums of the leaf weights), which the wavelet
/// tree construction consumes as slice boundaries.
pub struct TreeNode {
    /// Leaf weight, or sum of children for internal nodes.
    pub weight: usize,
    /// Original position in the weight sequence (left node's for merges).
    pub pos: usize,
    /// False for leaves, true for merged nodes.
    pub internal: bool,
    /// First covered index in the flattened weight domain.
    pub start: usize,
    /// Last covered index in the flattened weight domain.
    pub end: usize,
    /// Children: 0 = left, 1 = right. Both present or both absent.
    pub children: [Option<Box<TreeNode>>; 2],
}

impl TreeNode {
    fn leaf(weight: usize, pos: usize, start: usize) -> Box<Self> {
        Box::new(Self {
            weight,
            pos,
            internal: false,
            start,
            end: start + weight - 1,
            children: [None, None],
        })
    }

    fn merge(left: Box<TreeNode>, right: Box<TreeNode>) -> Box<Self> {
        Box::new(Self {
            weight: left.weight + right.weight,
            pos: left.pos,
            internal: true,
            start: left.start,
            end: right.end,
            children: [Some(left), Some(right)],
        })
    }
}

/// Order-preserving minimum-weighted-depth binary tree over run lengths.
///
/// The tree is scratch for the wavelet-tree build: it is consumed for its
/// shape and dropped afterwards.
pub struct HuTucker {
    root: Box<TreeNode>,
    /// Number of internal nodes.
    internal: usize,
    /// Number of leaves.
    leaves: usize,
}

impl HuTucker {
    /// Build the tree for the given ordered weight sequence.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty or any weight is zero; both are caller
    /// contract violations.
    pub fn new(weights: &[usize]) -> Self {
        assert!(!weights.is_empty(), "weight sequence must be non-empty");
        assert!(
            weights.iter().all(|&w| w > 0),
            "weights must be positive"
        );
        debug!("building alphabetic tree over {} leaves", weights.len());

        let leaves = weights.len();
        let unconstrained = Self::combination(Self::make_leaves(weights));

        let mut levels = vec![0usize; leaves];
        let mut internal = 0;
        Self::assign_levels(unconstrained, 0, &mut levels, &mut internal);

        let root = Self::recombine(Self::make_leaves(weights), &levels);
        Self {
            root,
            internal,
            leaves,
        }
    }

    fn make_leaves(weights: &[usize]) -> Vec<Box<TreeNode>> {
        let mut point = 0;
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let leaf = TreeNode::leaf(w, i, point);
                point += w;
                leaf
            })
            .collect()
    }

    /// Phase 1: repeatedly merge the globally minimal node with its nearest
    /// compatible partner until one node remains. The result has optimal
    /// per-leaf depths but does not preserve leaf order.
    fn combination(mut seq: Vec<Box<TreeNode>>) -> Box<TreeNode> {
        while seq.len() > 1 {
            let pmin = Self::pos_min(&seq);
            let pcom = Self::pos_compatible(&seq, pmin);
            let (lo, hi) = if pmin < pcom {
                (pmin, pcom)
            } else {
                (pcom, pmin)
            };
            let right = seq.remove(hi);
            let left = seq.remove(lo);
            seq.insert(lo, TreeNode::merge(left, right));
        }
        seq.pop().expect("combination leaves exactly one node")
    }

    /// Index of the minimum-weight node; ties resolve to the leftmost.
    fn pos_min(seq: &[Box<TreeNode>]) -> usize {
        let mut min = 0;
        for i in 1..seq.len() {
            if seq[min].weight > seq[i].weight {
                min = i;
            }
        }
        min
    }

    /// Nearest compatible merge partner of `pmin`: scan outward on both
    /// sides, where a side keeps extending only while the node being
    /// crossed is internal (two nodes are compatible when no leaf lies
    /// between them). The smaller-weight side wins, ties going left.
    fn pos_compatible(seq: &[Box<TreeNode>], pmin: usize) -> usize {
        let end = seq.len() - 1;
        let mut minleft = pmin;
        let mut minright = pmin;

        if pmin != 0 {
            minleft = pmin - 1;
            let mut left = pmin as isize - 2;
            while left >= 0 && seq[(left + 1) as usize].internal {
                if seq[minleft].weight >= seq[left as usize].weight {
                    minleft = left as usize;
                }
                left -= 1;
            }
        }
        if pmin != end {
            minright = pmin + 1;
            let mut right = pmin + 2;
            while right <= end && seq[right - 1].internal {
                if seq[minright].weight > seq[right].weight {
                    minright = right;
                }
                right += 1;
            }
        }

        if minleft == pmin {
            minright
        } else if minright == pmin {
            minleft
        } else if seq[minleft].weight <= seq[minright].weight {
            minleft
        } else {
            minright
        }
    }

    /// Phase 2: record each leaf's depth in the unconstrained tree and
    /// count internal nodes; the scratch internals are dropped here.
    fn assign_levels(
        node: Box<TreeNode>,
        depth: usize,
        levels: &mut [usize],
        internal: &mut usize,
    ) {
        if node.internal {
            *internal += 1;
            let [left, right] = node.children;
            let left = left.expect("internal node has two children");
            let right = right.expect("internal node has two children");
            Self::assign_levels(left, depth + 1, levels, internal);
            Self::assign_levels(right, depth + 1, levels, internal);
        } else {
            levels[node.pos] = depth;
        }
    }

    /// Phase 3: rebuild an order-preserving tree from the assigned levels.
    /// Leaves are pushed left to right; whenever the two most recent stack
    /// entries sit on the same level they merge one level up. The Kraft
    /// equality of the assigned levels guarantees a single final entry.
    fn recombine(leaves: Vec<Box<TreeNode>>, levels: &[usize]) -> Box<TreeNode> {
        let mut stack: Vec<(usize, Box<TreeNode>)> = Vec::new();
        for leaf in leaves {
            stack.push((levels[leaf.pos], leaf));
            while stack.len() > 1 && stack[stack.len() - 1].0 == stack[stack.len() - 2].0 {
                let (_, right) = stack.pop().expect("stack has two entries");
                let (level, left) = stack.pop().expect("stack has two entries");
                stack.push((level - 1, TreeNode::merge(left, right)));
            }
        }
        debug_assert_eq!(stack.len(), 1, "leaf levels violate the Kraft equality");
        stack.pop().expect("recombination leaves one node").1
    }

    /// Root of the order-preserving tree.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Number of internal nodes.
    pub fn internal_nodes(&self) -> usize {
        self.internal
    }

    /// Number of leaves.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Total weighted depth, the quantity the construction minimizes.
    pub fn weighted_depth(&self) -> usize {
        fn walk(node: &TreeNode, depth: usize) -> usize {
            match (&node.children[0], &node.children[1]) {
                (Some(left), Some(right)) => walk(left, depth + 1) + walk(right, depth + 1),
                _ => node.weight * depth,
            }
        }
        walk(&self.root, 0)
    }
}
