//! Succinct bit vector with sampled rank and four-stage select.
//!
//! Stores `N` bits packed into `u64` words plus a superblock rank table
//! sampled every `FACTOR` words. Rank is a table lookup followed by at most
//! `FACTOR` popcounts; select refines a binary search over the table down
//! through word, byte, and bit granularity.
//!
//! # Layout
//!
//! - Data: `N/64 + 1` words; bits at positions `>= N` are kept clear.
//! - Rank table: `N/S + 1` entries (`S = FACTOR * 64`); entry `j` is the
//!   number of set bits in the first `j` superblocks.
//!
//! A `FACTOR` of 20 keeps the table overhead at 5% of the data.
//!
//! # Conventions
//!
//! Unlike most Rust rank/select crates, rank here is *inclusive*:
//! `rank1(i)` counts set bits in `[0, i]`. Select takes a 1-based rank and
//! returns a 0-based position, with the bit length as a not-found sentinel
//! and `select0(0)` defined as 0. The permutation codecs in this crate are
//! written against exactly these conventions.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Bits per machine word.
pub const W: usize = 64;

/// Default rank-table sampling factor, in words per superblock.
///
/// Persisted records do not store the factor; loading assumes this value.
pub const FACTOR: usize = 20;

/// Backend tag of [`BitVector`] in persisted records.
pub const BACKEND_SAMPLED: u32 = 1;

/// Capability interface of a rank/select bit sequence.
///
/// All query methods follow the inclusive-rank / 1-based-select conventions
/// described in the [module documentation](self). Implementations are
/// immutable after construction; alternative compressed backends plug in
/// here and are dispatched on their persisted tag by [`load_bit_sequence`].
pub trait BitSequence {
    /// Total number of bits.
    fn len(&self) -> usize;

    /// Returns true if the sequence has length 0.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bit at position `i`. Precondition: `i < len()`.
    fn access(&self, i: usize) -> bool;

    /// Number of set bits in positions `[0, i]`. Precondition: `i < len()`.
    fn rank1(&self, i: usize) -> usize;

    /// Number of clear bits in positions `[0, i]`. Precondition: `i < len()`.
    fn rank0(&self, i: usize) -> usize {
        i + 1 - self.rank1(i)
    }

    /// Position of the `x`-th set bit (1-based), or `len()` if there is no
    /// such bit.
    fn select1(&self, x: usize) -> usize;

    /// Position of the `x`-th clear bit (1-based), or `len()` if there is
    /// no such bit. `select0(0)` is defined as 0.
    fn select0(&self, x: usize) -> usize;

    /// Heap and struct bytes used by this sequence.
    fn size_bytes(&self) -> usize;

    /// Bits this sequence accounts for in space reports: packed data words
    /// plus rank-table words, in bits.
    fn bits_required(&self) -> usize;

    /// Serialize this sequence as a tagged record.
    fn save(&self, out: &mut dyn Write) -> Result<()>;
}

/// Reads one tagged bit-sequence record, dispatching on the backend tag.
///
/// Unrecognized tags are rejected as [`Error::UnknownBackend`]; they mean
/// the stream was produced by a backend this build does not carry.
pub fn load_bit_sequence(input: &mut dyn Read) -> Result<Box<dyn BitSequence>> {
    let tag = read_u32(input)?;
    match tag {
        BACKEND_SAMPLED => Ok(Box::new(BitVector::load_body(input)?)),
        other => Err(Error::UnknownBackend(other)),
    }
}

/// Succinct bit vector with a sampled superblock rank table.
pub struct BitVector {
    /// Packed bits, `len/64 + 1` words; positions `>= len` are clear.
    data: Vec<u64>,
    /// Cumulative rank at superblock boundaries, `len/S + 1` entries.
    table: Vec<u64>,
    len: usize,
    factor: usize,
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("ones", &self.rank1(self.len - 1))
            .finish()
    }
}

impl BitVector {
    /// Create a bit vector over `len` bits of `bits` with the default
    /// sampling factor.
    pub fn new(bits: &[u64], len: usize) -> Self {
        Self::with_factor(bits, len, FACTOR)
    }

    /// Create a bit vector with an explicit sampling factor.
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0 or `factor` is 0; both are caller contract
    /// violations. Bits of `bits` at positions `>= len` are ignored.
    pub fn with_factor(bits: &[u64], len: usize, factor: usize) -> Self {
        assert!(len > 0, "bit vector length must be positive");
        assert!(factor > 0, "sampling factor must be positive");

        let words = len / W + 1;
        let mut data = vec![0u64; words];
        for (i, w) in data.iter_mut().enumerate().take(len.div_ceil(W)) {
            *w = bits.get(i).copied().unwrap_or(0);
        }
        if len % W != 0 {
            data[len / W] &= (1u64 << (len % W)) - 1;
        }

        let mut bv = Self {
            data,
            table: Vec::new(),
            len,
            factor,
        };
        bv.build_rank();
        bv
    }

    fn build_rank(&mut self) {
        let blocks = self.len / (self.factor * W);
        let mut table = vec![0u64; blocks + 1];
        for j in 1..=blocks {
            let start = (j - 1) * self.factor;
            let end = (j * self.factor).min(self.data.len());
            let ones: u64 = self.data[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum();
            table[j] = table[j - 1] + ones;
        }
        self.table = table;
    }

    /// Nearest set bit at or before `i`, or `len()` if none exists.
    /// Precondition: `i < len()`.
    pub fn predecessor(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        let word = i / W;
        let masked = self.data[word] & (!0u64 >> (W - 1 - i % W));
        if masked != 0 {
            return word * W + (W - 1 - masked.leading_zeros() as usize);
        }
        for k in (0..word).rev() {
            if self.data[k] != 0 {
                return k * W + (W - 1 - self.data[k].leading_zeros() as usize);
            }
        }
        self.len
    }

    /// Nearest set bit at or after `i`, or `len()` if none exists.
    /// Precondition: `i < len()`.
    pub fn successor(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        let shifted = self.data[i / W] >> (i % W);
        if shifted != 0 {
            return i + shifted.trailing_zeros() as usize;
        }
        for k in i / W + 1..self.data.len() {
            if self.data[k] != 0 {
                return k * W + self.data[k].trailing_zeros() as usize;
            }
        }
        self.len
    }

    /// Record body after the backend tag: `[u32 len][u32 reserved]`, then
    /// `len/64 + 1` data words and `len/S + 1` table words, little-endian.
    ///
    /// The word counts are recomputed from `len` with the same formulas the
    /// constructor uses; the sampling factor is [`FACTOR`], never stored.
    pub(crate) fn load_body(input: &mut dyn Read) -> Result<Self> {
        let len = read_u32(input)? as usize;
        let _reserved = read_u32(input)?;
        if len == 0 {
            return Err(Error::InvalidEncoding(
                "zero-length bit sequence record".to_string(),
            ));
        }

        let words = len / W + 1;
        let mut data = Vec::with_capacity(words);
        for _ in 0..words {
            data.push(read_u64(input)?);
        }

        let table_len = len / (FACTOR * W) + 1;
        let mut table = Vec::with_capacity(table_len);
        for _ in 0..table_len {
            table.push(read_u64(input)?);
        }

        Ok(Self {
            data,
            table,
            len,
            factor: FACTOR,
        })
    }

    /// Read one record, checking the backend tag.
    pub fn load(input: &mut dyn Read) -> Result<Self> {
        let tag = read_u32(input)?;
        if tag != BACKEND_SAMPLED {
            return Err(Error::UnknownBackend(tag));
        }
        Self::load_body(input)
    }
}

impl BitSequence for BitVector {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        (self.data[i / W] >> (i % W)) & 1 == 1
    }

    fn rank1(&self, i: usize) -> usize {
        debug_assert!(i < self.len);
        let i = i + 1;
        let s = self.factor * W;
        let mut rank = self.table[i / s] as usize;
        for a in (i / s) * self.factor..i / W {
            rank += self.data[a].count_ones() as usize;
        }
        rank += (self.data[i / W] & ((1u64 << (i % W)) - 1)).count_ones() as usize;
        rank
    }

    fn select1(&self, x: usize) -> usize {
        if x == 0 {
            return 0;
        }

        // Stage 1: binary search over the superblock rank table.
        let mut l: isize = 0;
        let mut r: isize = (self.len / (self.factor * W)) as isize;
        let mut mid = (l + r) / 2;
        let mut rankmid = self.table[mid as usize] as usize;
        while l <= r {
            if rankmid < x {
                l = mid + 1;
            } else {
                r = mid - 1;
            }
            mid = (l + r) / 2;
            rankmid = self.table[mid as usize] as usize;
        }

        // Stage 2: word scan from the superblock start.
        let mut left = mid as usize * self.factor;
        let mut x = x - rankmid;
        let mut word = self.data[left];
        let mut ones = word.count_ones() as usize;
        while ones < x {
            x -= ones;
            left += 1;
            if left >= self.data.len() {
                return self.len;
            }
            word = self.data[left];
            ones = word.count_ones() as usize;
        }

        // Stage 3: byte scan within the word.
        let mut left = left * W;
        let mut rankmid = (word & 0xff).count_ones() as usize;
        while rankmid < x {
            word >>= 8;
            x -= rankmid;
            left += 8;
            rankmid = (word & 0xff).count_ones() as usize;
        }

        // Stage 4: bit scan within the byte.
        while x > 0 {
            if word & 1 == 1 {
                x -= 1;
            }
            word >>= 1;
            left += 1;
        }
        left - 1
    }

    fn select0(&self, x: usize) -> usize {
        if x == 0 {
            return 0;
        }

        let s = self.factor * W;
        let mut l: isize = 0;
        let mut r: isize = (self.len / s) as isize;
        let mut mid = (l + r) / 2;
        let mut rankmid = mid as usize * s - self.table[mid as usize] as usize;
        while l <= r {
            if rankmid < x {
                l = mid + 1;
            } else {
                r = mid - 1;
            }
            mid = (l + r) / 2;
            rankmid = mid as usize * s - self.table[mid as usize] as usize;
        }

        let mut left = mid as usize * self.factor;
        let mut x = x - rankmid;
        let mut word = self.data[left];
        let mut zeros = W - word.count_ones() as usize;
        while zeros < x {
            x -= zeros;
            left += 1;
            if left >= self.data.len() {
                return self.len;
            }
            word = self.data[left];
            zeros = W - word.count_ones() as usize;
        }

        let mut left = left * W;
        let mut rankmid = 8 - (word & 0xff).count_ones() as usize;
        while rankmid < x {
            word >>= 8;
            x -= rankmid;
            left += 8;
            rankmid = 8 - (word & 0xff).count_ones() as usize;
        }

        while x > 0 {
            if word & 1 == 0 {
                x -= 1;
            }
            word >>= 1;
            left += 1;
        }
        let left = left - 1;
        if left > self.len {
            self.len
        } else {
            left
        }
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.len() * 8 + self.table.len() * 8
    }

    fn bits_required(&self) -> usize {
        (self.len / W + 1 + self.len / (W * self.factor) + 1) * W
    }

    fn save(&self, out: &mut dyn Write) -> Result<()> {
        write_u32(out, BACKEND_SAMPLED)?;
        write_u32(out, self.len as u32)?;
        write_u32(out, 0)?; // reserved
        for &w in &self.data {
            out.write_all(&w.to_le_bytes())?;
        }
        for &w in &self.table {
            out.write_all(&w.to_le_bytes())?;
        }
        Ok(())
    }
}

pub(crate) fn write_u32(out: &mut dyn Write, v: u32) -> Result<()> {
    out.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_u32(input: &mut dyn Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn write_u64(out: &mut dyn Write, v: u64) -> Result<()> {
    out.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_u64(input: &mut dyn Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_positions(len: usize, ones: &[usize]) -> BitVector {
        let mut words = vec![0u64; len / W + 1];
        for &p in ones {
            words[p / W] |= 1 << (p % W);
        }
        BitVector::new(&words, len)
    }

    #[test]
    fn rank_basic() {
        let bv = from_positions(128, &[0, 1, 3, 64, 127]);
        assert_eq!(bv.rank1(0), 1);
        assert_eq!(bv.rank1(1), 2);
        assert_eq!(bv.rank1(2), 2);
        assert_eq!(bv.rank1(3), 3);
        assert_eq!(bv.rank1(63), 3);
        assert_eq!(bv.rank1(64), 4);
        assert_eq!(bv.rank1(127), 5);
        assert_eq!(bv.rank0(127), 123);
        assert!(bv.access(64));
        assert!(!bv.access(2));
    }

    #[test]
    fn select_basic() {
        let bv = from_positions(64, &[0, 1, 3]);
        assert_eq!(bv.select1(1), 0);
        assert_eq!(bv.select1(2), 1);
        assert_eq!(bv.select1(3), 3);
        assert_eq!(bv.select1(4), 64); // sentinel
        assert_eq!(bv.select0(0), 0); // defined sentinel
        assert_eq!(bv.select0(1), 2);
        assert_eq!(bv.select0(2), 4);
    }

    #[test]
    fn select_stage_boundaries() {
        // factor 2 gives a 128-bit superblock; place set bits exactly at
        // superblock, word, and byte boundaries so every select stage is
        // exercised.
        let positions = [7, 8, 63, 64, 127, 128, 255, 256, 300];
        let mut words = vec![0u64; 301 / W + 1];
        for &p in &positions {
            words[p / W] |= 1 << (p % W);
        }
        let bv = BitVector::with_factor(&words, 301, 2);
        for (k, &p) in positions.iter().enumerate() {
            assert_eq!(bv.select1(k + 1), p, "select1({})", k + 1);
            assert_eq!(bv.rank1(p), k + 1);
            assert!(bv.access(p));
        }
        assert_eq!(bv.select1(positions.len() + 1), 301);

        // select0 across the same boundaries: zeros are everything else.
        let mut zero_rank = 0;
        for i in 0..301 {
            if !bv.access(i) {
                zero_rank += 1;
                assert_eq!(bv.select0(zero_rank), i, "select0({zero_rank})");
            }
        }
    }

    #[test]
    fn dense_and_sparse_ranks_agree_with_popcount() {
        let words: Vec<u64> = (0..40u64)
            .map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15))
            .collect();
        let len = 40 * W - 11;
        let bv = BitVector::with_factor(&words, len, 3);
        let mut expected = 0;
        for i in 0..len {
            if (words[i / W] >> (i % W)) & 1 == 1 {
                expected += 1;
                assert_eq!(bv.select1(expected), i);
            }
            assert_eq!(bv.rank1(i), expected, "rank1({i})");
        }
        assert_eq!(bv.select1(expected + 1), len);
    }

    #[test]
    fn predecessor_successor() {
        let bv = from_positions(200, &[5, 70, 130]);
        assert_eq!(bv.successor(0), 5);
        assert_eq!(bv.successor(5), 5);
        assert_eq!(bv.successor(6), 70);
        assert_eq!(bv.successor(131), 200); // sentinel
        assert_eq!(bv.predecessor(199), 130);
        assert_eq!(bv.predecessor(130), 130);
        assert_eq!(bv.predecessor(129), 70);
        assert_eq!(bv.predecessor(4), 200); // sentinel
    }

    #[test]
    fn save_load_round_trip() {
        let bv = from_positions(1500, &[0, 3, 700, 1280, 1499]);
        let mut bytes = Vec::new();
        bv.save(&mut bytes).unwrap();

        let loaded = BitVector::load(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.len(), bv.len());
        for i in 0..bv.len() {
            assert_eq!(loaded.access(i), bv.access(i));
            assert_eq!(loaded.rank1(i), bv.rank1(i));
        }
        assert_eq!(loaded.size_bytes(), bv.size_bytes());
        assert_eq!(loaded.bits_required(), bv.bits_required());
    }

    #[test]
    fn load_rejects_unknown_backend() {
        let bv = from_positions(64, &[1]);
        let mut bytes = Vec::new();
        bv.save(&mut bytes).unwrap();
        bytes[0] = 0xfe; // corrupt the backend tag
        match BitVector::load(&mut bytes.as_slice()) {
            Err(Error::UnknownBackend(_)) => {}
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_zero_length_record() {
        let bv = from_positions(64, &[1]);
        let mut bytes = Vec::new();
        bv.save(&mut bytes).unwrap();
        // Zero the bit-length field following the backend tag.
        bytes[4..8].fill(0);
        assert!(matches!(
            BitVector::load(&mut bytes.as_slice()),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn load_rejects_short_stream() {
        let bv = from_positions(2000, &[1999]);
        let mut bytes = Vec::new();
        bv.save(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            BitVector::load(&mut bytes.as_slice()),
            Err(Error::Io(_))
        ));
    }
}
