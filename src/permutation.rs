//! Compressed permutations answering forward and inverse queries.
//!
//! Two codecs over the wavelet-tree machinery:
//!
//! - [`RunsPermutation`]: one wavelet-tree leaf per maximal ascending run.
//!   `pi` descends to the leaf containing the target rank and then converts
//!   the leaf-local rank back to root coordinates one select per ancestor;
//!   `pi_inv` is a single downward walk carrying an offset accumulator.
//! - [`StrictRunsPermutation`]: leaves are strict runs (consecutive
//!   values), reduced to one representative per run class. Two marker bit
//!   vectors translate between the original domain and the class domain of
//!   an inner [`RunsPermutation`], and the residual within a strict run is
//!   pure arithmetic.
//!
//! Both serialize to a single self-describing stream: an 8-byte magic, the
//! tree shape (`u32` bit count + packed pre-order presence bits), the node
//! bit-sequence records in pre-order, and, for the strict-runs codec, the
//! two marker records appended last.

use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::bitvec::{
    load_bit_sequence, read_u32, read_u64, write_u32, write_u64, BitSequence, BitVector, W,
};
use crate::error::{Error, Result};
use crate::runs::{ascending_runs, strict_runs};
use crate::wavelet::{WaveletNode, WaveletTree};

const RUNS_MAGIC: &[u8; 8] = b"RPERMWT1";
const STRICT_MAGIC: &[u8; 8] = b"RPERMWT2";

/// Common interface of the two permutation codecs.
pub trait CompressedPermutation {
    /// Length of the encoded permutation.
    fn len(&self) -> usize;

    /// Returns true if the permutation has length 0 (never, by
    /// construction).
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forward query: the image of position `i`. Precondition: `i < len()`.
    fn pi(&self, i: usize) -> usize;

    /// Inverse query: the position mapping to `i`. Precondition:
    /// `i < len()`.
    fn pi_inv(&self, i: usize) -> usize;

    /// Struct and heap bytes of the whole structure, nested parts
    /// included.
    fn size_bytes(&self) -> usize;

    /// Space accounting in bits over every query-relevant bit sequence.
    fn bits_required(&self) -> usize;

    /// Serialize the full structure.
    fn save(&self, out: &mut dyn Write) -> Result<()>;
}

fn is_permutation(values: &[usize]) -> bool {
    let mut seen = vec![false; values.len()];
    values
        .iter()
        .all(|&v| v < seen.len() && !std::mem::replace(&mut seen[v], true))
}

fn check_magic(input: &mut dyn Read, expected: &[u8; 8], what: &str) -> Result<()> {
    let mut magic = [0u8; 8];
    input.read_exact(&mut magic)?;
    if &magic != expected {
        return Err(Error::InvalidEncoding(format!("bad magic for {what}")));
    }
    Ok(())
}

/// Permutation compressed by its ascending-run decomposition.
pub struct RunsPermutation {
    len: usize,
    wt: WaveletTree,
}

impl RunsPermutation {
    /// Encode `values`, which must be a permutation of `0..values.len()`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty; passing a non-permutation is a caller
    /// contract violation checked only under debug assertions.
    pub fn new(values: &[usize]) -> Self {
        assert!(!values.is_empty(), "cannot encode an empty permutation");
        debug_assert!(is_permutation(values), "input is not a permutation");
        let runs = ascending_runs(values);
        debug!(
            "encoding runs permutation: {} elements, {} runs",
            values.len(),
            runs.len()
        );
        let mut scratch = values.to_vec();
        let wt = WaveletTree::new(&mut scratch, &runs);
        Self {
            len: values.len(),
            wt,
        }
    }

    fn rec_pi(node: &WaveletNode, j: usize) -> usize {
        let zeros = node.bits.rank0(node.bits.len() - 1);
        if zeros >= j {
            let r = match &node.children[0] {
                Some(child) => Self::rec_pi(child, j),
                None => j,
            };
            node.bits.select0(r) + 1
        } else {
            let j = j - zeros;
            let r = match &node.children[1] {
                Some(child) => Self::rec_pi(child, j),
                None => j,
            };
            node.bits.select1(r) + 1
        }
    }

    fn rec_pi_inv(node: Option<&WaveletNode>, i: usize, offset: usize) -> usize {
        let Some(node) = node else {
            // Implicit leaf: `i` is the rank within one run.
            return offset + i;
        };
        if node.bits.access(i) {
            let below_left = node.bits.rank0(node.bits.len() - 1);
            Self::rec_pi_inv(
                node.children[1].as_deref(),
                node.bits.rank1(i) - 1,
                offset + below_left,
            )
        } else {
            Self::rec_pi_inv(node.children[0].as_deref(), node.bits.rank0(i) - 1, offset)
        }
    }

    /// Shape and payload sections, shared with the strict-runs codec.
    fn write_tree(&self, out: &mut dyn Write) -> Result<()> {
        let mut shape = Vec::new();
        let mut payload = Vec::new();
        Self::rec_save(Some(&self.wt.root), &mut payload, &mut shape)?;

        write_u32(out, shape.len() as u32)?;
        let mut words = vec![0u64; shape.len().div_ceil(W)];
        for (k, &present) in shape.iter().enumerate() {
            if present {
                words[k / W] |= 1 << (k % W);
            }
        }
        for &w in &words {
            write_u64(out, w)?;
        }
        out.write_all(&payload)?;
        Ok(())
    }

    /// Pre-order: one presence bit per visited child slot; present nodes
    /// append their bit-sequence record to the payload before recursing.
    fn rec_save(
        node: Option<&WaveletNode>,
        payload: &mut Vec<u8>,
        shape: &mut Vec<bool>,
    ) -> Result<()> {
        match node {
            None => {
                shape.push(false);
                Ok(())
            }
            Some(node) => {
                shape.push(true);
                node.bits.save(payload)?;
                Self::rec_save(node.children[0].as_deref(), payload, shape)?;
                Self::rec_save(node.children[1].as_deref(), payload, shape)
            }
        }
    }

    fn read_tree(input: &mut dyn Read) -> Result<WaveletTree> {
        let nbits = read_u32(input)? as usize;
        if nbits == 0 {
            return Err(Error::InvalidEncoding("empty tree shape".to_string()));
        }
        let mut words = Vec::with_capacity(nbits.div_ceil(W));
        for _ in 0..nbits.div_ceil(W) {
            words.push(read_u64(input)?);
        }

        let mut curr = 0;
        let root = Self::rec_load(input, &words, nbits, &mut curr)?
            .ok_or_else(|| Error::InvalidEncoding("tree shape has no root".to_string()))?;
        if curr != nbits {
            return Err(Error::InvalidEncoding(
                "tree shape bit count does not match its structure".to_string(),
            ));
        }
        Ok(WaveletTree::from_root(root))
    }

    fn rec_load(
        input: &mut dyn Read,
        shape: &[u64],
        nbits: usize,
        curr: &mut usize,
    ) -> Result<Option<WaveletNode>> {
        if *curr >= nbits {
            return Err(Error::InvalidEncoding(
                "tree shape exhausted mid-traversal".to_string(),
            ));
        }
        let present = (shape[*curr / W] >> (*curr % W)) & 1 == 1;
        *curr += 1;
        if !present {
            return Ok(None);
        }
        let mut node = WaveletNode::new(load_bit_sequence(input)?);
        node.children[0] = Self::rec_load(input, shape, nbits, curr)?.map(Box::new);
        node.children[1] = Self::rec_load(input, shape, nbits, curr)?.map(Box::new);
        Ok(Some(node))
    }

    /// Deserialize a structure previously written by
    /// [`save`](CompressedPermutation::save).
    pub fn load(input: &mut dyn Read) -> Result<Self> {
        check_magic(input, RUNS_MAGIC, "runs permutation")?;
        let wt = Self::read_tree(input)?;
        Ok(Self { len: wt.len(), wt })
    }

    /// Serialize to an owned byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.save(&mut out)?;
        Ok(out)
    }

    /// Deserialize from a byte slice, rejecting trailing bytes.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        let loaded = Self::load(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(Error::InvalidEncoding(
                "trailing bytes after runs permutation".to_string(),
            ));
        }
        Ok(loaded)
    }

    /// Write the structure to a file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.save(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Read a structure back from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut input = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::load(&mut input)
    }
}

impl CompressedPermutation for RunsPermutation {
    fn len(&self) -> usize {
        self.len
    }

    fn pi(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        Self::rec_pi(&self.wt.root, i + 1) - 1
    }

    fn pi_inv(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        Self::rec_pi_inv(Some(&self.wt.root), i, 0)
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.wt.size_bytes()
    }

    fn bits_required(&self) -> usize {
        self.wt.bits_required()
    }

    fn save(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(RUNS_MAGIC)?;
        self.write_tree(out)
    }
}

/// Permutation compressed by its strict-run decomposition.
///
/// Strict runs are finer than ascending runs but each is fully described
/// by its first element, so the inner structure only encodes one class per
/// run. `starts` marks strict-run first positions in the original domain;
/// `inv_starts` marks, in the inverse permutation's domain, the images of
/// those positions.
pub struct StrictRunsPermutation {
    len: usize,
    inner: RunsPermutation,
    starts: Box<dyn BitSequence>,
    inv_starts: Box<dyn BitSequence>,
}

impl StrictRunsPermutation {
    /// Encode `values`, which must be a permutation of `0..values.len()`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty; passing a non-permutation is a caller
    /// contract violation checked only under debug assertions.
    pub fn new(values: &[usize]) -> Self {
        assert!(!values.is_empty(), "cannot encode an empty permutation");
        debug_assert!(is_permutation(values), "input is not a permutation");
        let len = values.len();
        let sruns = strict_runs(values);
        debug!(
            "encoding strict-runs permutation: {} elements, {} strict runs",
            len,
            sruns.len()
        );

        let mut start_words = vec![0u64; len / W + 1];
        let mut pos = 0;
        start_words[0] |= 1;
        for &srun in &sruns[..sruns.len() - 1] {
            pos += srun;
            start_words[pos / W] |= 1 << (pos % W);
        }

        let mut inverse = vec![0usize; len];
        for (i, &v) in values.iter().enumerate() {
            inverse[v] = i;
        }
        let mut inv_words = vec![0u64; len / W + 1];
        for (i, &inv) in inverse.iter().enumerate() {
            if (start_words[inv / W] >> (inv % W)) & 1 == 1 {
                inv_words[i / W] |= 1 << (i % W);
            }
        }

        let starts: Box<dyn BitSequence> = Box::new(BitVector::new(&start_words, len));
        let inv_starts: Box<dyn BitSequence> = Box::new(BitVector::new(&inv_words, len));

        // Reduced permutation over strict-run classes: map each class
        // representative through the inverse-domain ranking.
        let reduced: Vec<usize> = (0..sruns.len())
            .map(|class| {
                let first = starts.select1(class + 1);
                inv_starts.rank1(values[first]) - 1
            })
            .collect();
        let inner = RunsPermutation::new(&reduced);

        Self {
            len,
            inner,
            starts,
            inv_starts,
        }
    }

    /// Deserialize a structure previously written by
    /// [`save`](CompressedPermutation::save).
    pub fn load(input: &mut dyn Read) -> Result<Self> {
        check_magic(input, STRICT_MAGIC, "strict-runs permutation")?;
        let wt = RunsPermutation::read_tree(input)?;
        let inner = RunsPermutation { len: wt.len(), wt };
        let starts = load_bit_sequence(input)?;
        let inv_starts = load_bit_sequence(input)?;
        Ok(Self {
            len: starts.len(),
            inner,
            starts,
            inv_starts,
        })
    }

    /// Serialize to an owned byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.save(&mut out)?;
        Ok(out)
    }

    /// Deserialize from a byte slice, rejecting trailing bytes.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        let loaded = Self::load(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(Error::InvalidEncoding(
                "trailing bytes after strict-runs permutation".to_string(),
            ));
        }
        Ok(loaded)
    }

    /// Write the structure to a file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.save(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Read a structure back from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut input = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::load(&mut input)
    }
}

impl CompressedPermutation for StrictRunsPermutation {
    fn len(&self) -> usize {
        self.len
    }

    fn pi(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        let class = self.starts.rank1(i) - 1;
        let class_pi = self.inner.pi(class);
        let run_start = self.starts.select1(class + 1);
        let image_start = self.inv_starts.select1(class_pi + 1);
        image_start + i - run_start
    }

    fn pi_inv(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        let class = self.inv_starts.rank1(i) - 1;
        let class_pos = self.inner.pi_inv(class);
        let image_start = self.inv_starts.select1(class + 1);
        let run_start = self.starts.select1(class_pos + 1);
        run_start + i - image_start
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.inner.size_bytes()
            + self.starts.size_bytes()
            + self.inv_starts.size_bytes()
    }

    fn bits_required(&self) -> usize {
        // The markers account for one extra length word each.
        self.inner.bits_required()
            + (self.starts.bits_required() + W)
            + (self.inv_starts.bits_required() + W)
    }

    fn save(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(STRICT_MAGIC)?;
        self.inner.write_tree(out)?;
        self.starts.save(out)?;
        self.inv_starts.save(out)
    }
}
