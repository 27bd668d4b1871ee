//! Cosine similarity between appearance embeddings.

use ndarray::{Array1, ArrayView1};

/// Fixed-length appearance vector produced by an external embedding model.
pub type Embedding = Array1<f32>;

/// Added to each norm so zero vectors do not divide by zero.
const NORM_EPS: f32 = 1e-6;

/// Cosine similarity of two equal-length vectors.
///
/// Both inputs are L2-normalized (with a small epsilon on the norm) before
/// the dot product, so the result is roughly in `[-1, 1]` and a zero vector
/// scores `0.0` against anything.
///
/// # Panics
/// Panics if the vectors differ in length. The store checks lengths before
/// calling this.
pub fn cosine_similarity(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let norm_a = a.dot(&a).sqrt() + NORM_EPS;
    let norm_b = b.dot(&b).sqrt() + NORM_EPS;
    a.dot(&b) / (norm_a * norm_b)
}
