#![no_main]
use libfuzzer_sys::fuzz_target;
use runperm::{CompressedPermutation, RunsPermutation, StrictRunsPermutation};

fuzz_target!(|data: Vec<u16>| {
    if data.is_empty() || data.len() > 4096 {
        return;
    }

    // Turn arbitrary input into a permutation: sort positions by key,
    // breaking ties by position.
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by_key(|&i| (data[i], i));
    let mut values = vec![0usize; data.len()];
    for (v, &i) in order.iter().enumerate() {
        values[i] = v;
    }

    let runs = RunsPermutation::new(&values);
    let strict = StrictRunsPermutation::new(&values);
    for (i, &v) in values.iter().enumerate() {
        assert_eq!(runs.pi(i), v);
        assert_eq!(runs.pi_inv(v), i);
        assert_eq!(strict.pi(i), v);
        assert_eq!(strict.pi_inv(v), i);
    }

    let loaded = RunsPermutation::from_bytes(&runs.to_bytes().unwrap()).unwrap();
    for i in 0..values.len() {
        assert_eq!(loaded.pi(i), values[i]);
    }
});
