//! Run decomposition of permutations.
//!
//! A *run* is a maximal ascending contiguous subsequence; a *strict run*
//! additionally requires consecutive values (each element is its
//! predecessor plus one). Compressible permutations have few runs relative
//! to their length, and the codecs in this crate spend space proportional
//! to the run structure rather than the permutation size.

/// Lengths of the maximal ascending runs of `values`, left to right.
///
/// A new run starts wherever `values[i] < values[i - 1]`. The lengths sum
/// to `values.len()`.
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn ascending_runs(values: &[usize]) -> Vec<usize> {
    runs_by(values, |prev, curr| curr < prev)
}

/// Lengths of the maximal strict runs of `values`, left to right.
///
/// A new strict run starts wherever `values[i] != values[i - 1] + 1`.
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn strict_runs(values: &[usize]) -> Vec<usize> {
    runs_by(values, |prev, curr| curr != prev + 1)
}

fn runs_by(values: &[usize], breaks: impl Fn(usize, usize) -> bool) -> Vec<usize> {
    assert!(!values.is_empty(), "run decomposition of an empty sequence");
    let mut lengths = Vec::new();
    let mut current = 1;
    for pair in values.windows(2) {
        if breaks(pair[0], pair[1]) {
            lengths.push(current);
            current = 1;
        } else {
            current += 1;
        }
    }
    lengths.push(current);
    lengths
}
