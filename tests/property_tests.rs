use proptest::prelude::*;
use runperm::bitvec::{BitSequence, BitVector};
use runperm::{ascending_runs, strict_runs, CompressedPermutation};
use runperm::{RunsPermutation, StrictRunsPermutation};

/// An arbitrary permutation of `0..n` for `n` in the given range.
fn permutation(n: impl Strategy<Value = usize>) -> impl Strategy<Value = Vec<usize>> {
    n.prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
}

/// A run-rich permutation: shuffled blocks of consecutive values.
fn blocky_permutation() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1..12usize, 1..12)
        .prop_flat_map(|blocks| {
            let mut start = 0;
            let ranges: Vec<Vec<usize>> = blocks
                .iter()
                .map(|&b| {
                    let block: Vec<usize> = (start..start + b).collect();
                    start += b;
                    block
                })
                .collect();
            Just(ranges).prop_shuffle()
        })
        .prop_map(|ranges| ranges.into_iter().flatten().collect())
}

proptest! {
    #[test]
    fn test_bitvector_rank_select_property(
        bits in prop::collection::vec(any::<u64>(), 1..100),
        trimmed in 0..64usize,
    ) {
        let len = (bits.len() * 64 - trimmed).max(1);
        let bv = BitVector::new(&bits, len);

        let bit = |i: usize| (bits[i / 64] >> (i % 64)) & 1 == 1;

        // Inclusive rank at sampled positions, both polarities.
        let mut expected = 0;
        for i in 0..len {
            if bit(i) {
                expected += 1;
            }
            if i % 13 == 0 || i == len - 1 {
                prop_assert_eq!(bv.rank1(i), expected);
                prop_assert_eq!(bv.rank0(i), i + 1 - expected);
            }
        }

        // select1 is the inverse of rank1 on set bits; one past the last
        // rank yields the length sentinel.
        let mut count = 0;
        for i in 0..len {
            if bit(i) {
                count += 1;
                prop_assert_eq!(bv.select1(count), i);
                prop_assert_eq!(bv.rank1(bv.select1(count)), count);
            }
        }
        prop_assert_eq!(bv.select1(count + 1), len);

        // Same contract for the zero side.
        let mut count0 = 0;
        for i in 0..len {
            if !bit(i) {
                count0 += 1;
                prop_assert_eq!(bv.select0(count0), i);
            }
        }
        prop_assert_eq!(bv.select0(count0 + 1), len);
        prop_assert_eq!(bv.select0(0), 0);
    }

    #[test]
    fn test_bitvector_neighbor_property(
        bits in prop::collection::vec(any::<u64>(), 1..40),
    ) {
        let len = bits.len() * 64;
        let bv = BitVector::new(&bits, len);
        let bit = |i: usize| (bits[i / 64] >> (i % 64)) & 1 == 1;

        for i in (0..len).step_by(17) {
            let pred = (0..=i).rev().find(|&j| bit(j)).unwrap_or(len);
            let succ = (i..len).find(|&j| bit(j)).unwrap_or(len);
            prop_assert_eq!(bv.predecessor(i), pred);
            prop_assert_eq!(bv.successor(i), succ);
        }
    }

    #[test]
    fn test_bitvector_save_load_property(
        bits in prop::collection::vec(any::<u64>(), 1..40),
        trimmed in 0..64usize,
    ) {
        let len = (bits.len() * 64 - trimmed).max(1);
        let bv = BitVector::new(&bits, len);
        let mut bytes = Vec::new();
        bv.save(&mut bytes).unwrap();
        let loaded = BitVector::load(&mut bytes.as_slice()).unwrap();

        prop_assert_eq!(loaded.len(), bv.len());
        for i in 0..len {
            prop_assert_eq!(loaded.access(i), bv.access(i));
            prop_assert_eq!(loaded.rank1(i), bv.rank1(i));
        }
    }
}

proptest! {
    #[test]
    fn test_runs_codec_property(values in permutation(1..200usize)) {
        let codec = RunsPermutation::new(&values);
        prop_assert_eq!(codec.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            prop_assert_eq!(codec.pi(i), v);
            prop_assert_eq!(codec.pi_inv(v), i);
        }
    }

    #[test]
    fn test_strict_codec_property(values in permutation(1..200usize)) {
        let codec = StrictRunsPermutation::new(&values);
        prop_assert_eq!(codec.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            prop_assert_eq!(codec.pi(i), v);
            prop_assert_eq!(codec.pi_inv(v), i);
        }
    }

    #[test]
    fn test_codecs_agree_on_blocky_inputs(values in blocky_permutation()) {
        // Blocky inputs have few strict runs, so the strict codec takes its
        // class-reduction path rather than degenerating to singletons.
        let runs = RunsPermutation::new(&values);
        let strict = StrictRunsPermutation::new(&values);
        for i in 0..values.len() {
            prop_assert_eq!(runs.pi(i), strict.pi(i));
            prop_assert_eq!(runs.pi_inv(i), strict.pi_inv(i));
        }
    }

    #[test]
    fn test_runs_round_trip_property(values in permutation(1..120usize)) {
        let codec = RunsPermutation::new(&values);
        let loaded = RunsPermutation::from_bytes(&codec.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(loaded.len(), codec.len());
        for i in 0..values.len() {
            prop_assert_eq!(loaded.pi(i), codec.pi(i));
            prop_assert_eq!(loaded.pi_inv(i), codec.pi_inv(i));
        }
        prop_assert_eq!(loaded.bits_required(), codec.bits_required());
    }

    #[test]
    fn test_strict_round_trip_property(values in blocky_permutation()) {
        let codec = StrictRunsPermutation::new(&values);
        let loaded = StrictRunsPermutation::from_bytes(&codec.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(loaded.len(), codec.len());
        for i in 0..values.len() {
            prop_assert_eq!(loaded.pi(i), codec.pi(i));
            prop_assert_eq!(loaded.pi_inv(i), codec.pi_inv(i));
        }
        prop_assert_eq!(loaded.bits_required(), codec.bits_required());
    }

    #[test]
    fn test_run_lengths_partition_the_input(values in permutation(1..200usize)) {
        let runs = ascending_runs(&values);
        let sruns = strict_runs(&values);
        prop_assert_eq!(runs.iter().sum::<usize>(), values.len());
        prop_assert_eq!(sruns.iter().sum::<usize>(), values.len());
        // Every strict-run boundary is also at an ascending-run boundary
        // or inside a run, so strict runs are at least as numerous.
        prop_assert!(sruns.len() >= runs.len());
    }
}
