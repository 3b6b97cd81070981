//! # Compressed Permutations
//!
//! *Answer `pi(i)` and `pi_inv(i)` without storing the permutation.*
//!
//! ## Intuition First
//!
//! Imagine a deck of cards that someone "almost" sorted: long sorted
//! stretches, shuffled only at the seams. Writing down every card's
//! position wastes space on the parts that are already in order. If instead
//! we remember only how the sorted stretches interleave, the description
//! shrinks toward the entropy of the stretch lengths — and, with the right
//! bookkeeping, we can still ask "where did card i end up?" and "which card
//! ended up at position i?" without ever re-sorting the deck.
//!
//! ## The Problem
//!
//! A permutation of $n$ elements and its inverse cost $2 n \log n$ bits as
//! plain arrays. Storing only one of them halves the space but makes the
//! inverse query $O(n)$. We want both directions fast *and* space that
//! adapts to how disordered the permutation actually is.
//!
//! ## Historical Context
//!
//! ```text
//! 1952  Huffman     Optimal prefix codes over unordered weights
//! 1971  Hu-Tucker   Optimal codes that preserve the leaf order
//! 2003  Grossi      Wavelet trees: rank/select over arbitrary alphabets
//! 2009  Barbay      Compressed permutations through runs and strict runs
//! ```
//!
//! Barbay and Navarro's insight was that the bitmaps a mergesort would
//! produce while merging the permutation's ascending runs are themselves a
//! representation of the permutation: replaying a merge step with rank is a
//! step of `pi_inv`, and un-replaying it with select is a step of `pi`.
//!
//! ## Mathematical Formulation
//!
//! Decompose $\pi$ into $\rho$ maximal ascending runs of lengths
//! $n_1, \dots, n_\rho$. Build an order-preserving binary tree over the
//! run lengths minimizing weighted depth (Hu-Tucker), and store one
//! rank/select bitmap per internal node recording the merge of its
//! children. The space is $n (1 + H(n_1, \dots, n_\rho)) + o(n \log \rho)$
//! bits, and either query costs $O(1 + \log \rho)$ rank/select steps.
//! Strict runs (consecutive values) compound the gain: the permutation
//! reduces to one element per strict run plus two bitmaps.
//!
//! ## Complexity Analysis
//!
//! - **Queries**: $O(1 + \log \rho)$ for `pi` and `pi_inv`.
//! - **Space**: the merge bitmaps plus a ~5% rank-table overhead each.
//! - **Construction**: $O(\rho^2 + n \log \rho)$; the quadratic term is the
//!   alphabetic tree and is negligible when runs are few.
//!
//! ## What Could Go Wrong
//!
//! 1. **Adversarial inputs**: a reversed permutation has $n$ runs, the tree
//!    degenerates to one leaf per element, and the structure is *larger*
//!    than the plain array. Run compression only pays when runs are few.
//! 2. **Static only**: everything here is immutable after construction;
//!    changing the permutation means rebuilding from scratch.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - **`BitVector`**: rank/select bit storage backing the tree nodes.
//! - **`HuTucker`**: order-preserving minimum-weighted-depth trees.
//! - **`WaveletTree`**: the merge bitmaps, shaped by the alphabetic tree.
//! - **`RunsPermutation`** / **`StrictRunsPermutation`**: the two codecs.
//!
//! ## References
//!
//! - Barbay, J., & Navarro, G. (2009). "Compressed Representations of
//!   Permutations, and Applications."
//! - Hu, T. C., & Tucker, A. C. (1971). "Optimal Computer Search Trees and
//!   Variable-Length Alphabetical Codes."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitvec;
pub mod error;
pub mod hutucker;
pub mod permutation;
pub mod runs;
pub mod wavelet;

pub use bitvec::{BitSequence, BitVector};
pub use error::Error;
pub use hutucker::HuTucker;
pub use permutation::{CompressedPermutation, RunsPermutation, StrictRunsPermutation};
pub use runs::{ascending_runs, strict_runs};
pub use wavelet::WaveletTree;
