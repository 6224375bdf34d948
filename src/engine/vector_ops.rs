//! Vector math and input validation for the ranking engine.
//!
//! Loops are written for auto-vectorization: sequential access, a fixed
//! 4-wide unroll and a single accumulator. The accumulation order never
//! depends on the caller, so the same pair of rows always produces the same
//! bits regardless of which worker computes it.
//!
//! For best SIMD performance, compile with `RUSTFLAGS="-C target-cpu=native"`.

use crate::error::{SimError, SimResult};
use crate::types::VectorSet;

/// Compute the dot product of two vectors.
///
/// For unit-norm inputs this is their cosine similarity. Products are added
/// into one accumulator in index order, four components per step.
///
/// # Arguments
/// * `a` - First vector
/// * `b` - Second vector, same length as `a`
///
/// # Returns
/// `sum(a[i] * b[i])`
///
/// # Panics
/// Panics if vectors have different lengths.
///
/// # Example
/// ```
/// use topicspace::engine::vector_ops::dot_product;
///
/// let a = vec![1.0_f32, 2.0, 3.0];
/// let b = vec![4.0_f32, 5.0, 6.0];
/// let result = dot_product(&a, &b);
/// assert!((result - 32.0).abs() < 1e-6); // 1*4 + 2*5 + 3*6 = 32
/// ```
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let mut a_blocks = a.chunks_exact(4);
    let mut b_blocks = b.chunks_exact(4);
    let mut acc = 0.0f32;

    for (x, y) in a_blocks.by_ref().zip(b_blocks.by_ref()) {
        acc += x[0] * y[0];
        acc += x[1] * y[1];
        acc += x[2] * y[2];
        acc += x[3] * y[3];
    }
    for (x, y) in a_blocks.remainder().iter().zip(b_blocks.remainder()) {
        acc += x * y;
    }

    acc
}

/// Squared L2 norm of a vector (no square root).
///
/// # Returns
/// `dot_product(v, v)`, so a row's self-similarity and its squared norm are
/// the same bits.
#[inline]
pub fn l2_norm_squared(v: &[f32]) -> f32 {
    dot_product(v, v)
}

/// Compute the L2 norm (magnitude) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_squared(v).sqrt()
}

/// Normalize a vector in-place to unit length.
///
/// A zero vector is left unchanged.
///
/// # Example
/// ```
/// use topicspace::engine::vector_ops::normalize_inplace;
///
/// let mut v = vec![3.0_f32, 4.0];
/// normalize_inplace(&mut v);
/// assert!((v[0] - 0.6).abs() < 1e-6);
/// assert!((v[1] - 0.8).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_inplace(v: &mut [f32]) {
    let norm_sq = l2_norm_squared(v);

    if norm_sq == 0.0 {
        return;
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    for x in v.iter_mut() {
        *x *= inv_norm;
    }
}

/// Check if a vector is normalized (L2 norm within `tolerance` of 1.0).
#[inline]
pub fn is_normalized(v: &[f32], tolerance: f32) -> bool {
    let norm = l2_norm(v);
    (norm - 1.0).abs() < tolerance
}

/// Reject a vector whose cosine similarity with anything would be undefined.
///
/// Rejected: a NaN or infinite component, an all-zero vector, and a non-zero
/// vector whose squared magnitude underflows to `0.0` or overflows `f32`.
pub fn check_vector(v: &[f32], set: &'static str, index: usize) -> SimResult<()> {
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(SimError::similarity_undefined(
            set,
            index,
            format!("non-finite component {} at position {}", v[pos], pos),
        ));
    }

    if v.iter().all(|x| *x == 0.0) {
        return Err(SimError::similarity_undefined(set, index, "zero magnitude"));
    }

    let norm_sq = l2_norm_squared(v);
    if norm_sq == 0.0 {
        return Err(SimError::similarity_undefined(
            set,
            index,
            "magnitude underflows f32",
        ));
    }
    if !norm_sq.is_finite() {
        return Err(SimError::similarity_undefined(
            set,
            index,
            "magnitude overflows f32",
        ));
    }

    Ok(())
}

/// Check every row of a set, reporting the lowest offending index.
pub fn check_vector_set(vectors: &VectorSet, set: &'static str) -> SimResult<()> {
    for (i, row) in vectors.rows().enumerate() {
        check_vector(row, set, i)?;
    }
    Ok(())
}
