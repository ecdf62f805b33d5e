use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FaceGroupError, Result};

/// A face identity signature. All embeddings compared in one run share a dimension.
pub type Embedding = Vec<f32>;

/// Distance metric over embeddings.
///
/// Clustering and matching are configured independently: clustering defaults
/// to [`Metric::Cosine`], matching to [`Metric::Euclidean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 - cosine_similarity`, in `[0, 2]`.
    Cosine,
    /// L2 distance.
    Euclidean,
}

impl Metric {
    /// Distance between two vectors of equal length, in f64.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => euclidean(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Cosine similarity between two vectors.
/// Accumulates in f64; a zero vector has similarity 0 with everything.
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    cosine_sim_f64(a, b) as f32
}

fn cosine_sim_f64(a: &[f32], b: &[f32]) -> f64 {
    let mut dot: f64 = 0.0;
    let mut na: f64 = 0.0;
    let mut nb: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let ai = x as f64;
        let bi = y as f64;
        dot += ai * bi;
        na += ai * ai;
        nb += bi * bi;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

/// Cosine distance: 1 - cosine_similarity, clamped to `[0, 2]`.
/// The similarity is not rounded to f32 before subtracting.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    (1.0 - cosine_sim_f64(a, b)).clamp(0.0, 2.0)
}

/// Euclidean (L2) distance.
pub fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    sum.sqrt()
}

/// Arithmetic mean of a set of embeddings.
///
/// Returns `Ok(None)` for an empty set so callers never mistake a missing
/// centroid for the zero vector.
pub fn mean(embeddings: &[Embedding]) -> Result<Option<Embedding>> {
    let Some(first) = embeddings.first() else {
        return Ok(None);
    };
    let dim = first.len();
    let mut acc = vec![0.0f64; dim];
    for emb in embeddings {
        if emb.len() != dim {
            return Err(FaceGroupError::DimensionMismatch {
                expected: dim,
                got: emb.len(),
            });
        }
        for (s, &x) in acc.iter_mut().zip(emb.iter()) {
            *s += x as f64;
        }
    }
    let n = embeddings.len() as f64;
    Ok(Some(acc.into_iter().map(|s| (s / n) as f32).collect()))
}
