//! Error types for compressed permutation structures.
//!
//! Only I/O-class failures are recoverable: a failed load leaves no usable
//! object and is reported through [`Error`]. Construction preconditions
//! (zero sampling factor, empty or non-positive weight sequences, inputs
//! that are not permutations) are caller contract violations and panic.
//!
//! Select queries for an out-of-range rank are *not* errors: they return
//! the bit length of the sequence as a sentinel (see
//! [`BitSequence`](crate::bitvec::BitSequence)).

use thiserror::Error;

/// Error variants for persistence of compressed permutations.
#[derive(Debug, Error)]
pub enum Error {
    /// A serialized stream was malformed: bad magic, zero-sized tree
    /// shape, or trailing bytes.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A bit-sequence record carried a backend tag this build does not
    /// recognize.
    #[error("unknown bit-sequence backend tag: {0}")]
    UnknownBackend(u32),

    /// An I/O error occurred during serialization or deserialization,
    /// including short reads and writes.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for load/save operations.
pub type Result<T> = std::result::Result<T, Error>;
