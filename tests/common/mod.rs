//! Shared fixtures for integration tests

#![allow(dead_code)]

use topicspace::VectorSet;

/// Deterministic pseudo-random unit vectors (xorshift32).
pub fn unit_vectors(n: usize, dim: usize, seed: u32) -> VectorSet {
    let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453) | 1;
    let data: Vec<f32> = (0..n * dim)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 20_001) as f32 / 10_000.0 - 1.0 + 1e-4
        })
        .collect();
    VectorSet::from_flat(data, dim)
        .expect("valid shape")
        .normalized()
        .expect("non-zero rows")
}

/// Unit vectors where every row appears `copies` times in a row, forcing ties.
pub fn duplicated_unit_vectors(n: usize, dim: usize, copies: usize, seed: u32) -> VectorSet {
    let base = unit_vectors(n, dim, seed);
    let indices: Vec<usize> = (0..n).flat_map(|i| std::iter::repeat(i).take(copies)).collect();
    base.select(&indices).expect("indices in range")
}

/// Bit patterns of a score slice, for exact comparisons.
pub fn bits(scores: &[f32]) -> Vec<u32> {
    scores.iter().map(|s| s.to_bits()).collect()
}
