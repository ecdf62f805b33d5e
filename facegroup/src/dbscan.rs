//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! Labels follow the canonical formulation (Ester et al., 1996, as implemented
//! by scikit-learn):
//!
//! - The neighborhood of a point includes the point itself.
//! - A point is core when its neighborhood holds at least `min_samples` points.
//! - Points are scanned in input order. Each unlabeled core point opens the
//!   next label (0, 1, 2, ...) and expands depth-first. A border point keeps
//!   the label of the first core point that reaches it.
//! - Points reached by no core point are noise (`None`).
//!
//! With `min_samples = 1` every point is core, so each isolated point forms a
//! cluster of its own and no noise is emitted.
//!
//! Neighborhood queries run on the rayon pool and are collected in index
//! order. Label assignment is sequential, so the output does not depend on
//! the worker count.

use rayon::prelude::*;

use crate::embedding::{Embedding, Metric};
use crate::error::{FaceGroupError, Result};

/// DBSCAN clustering over embeddings.
#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f32,
    min_samples: usize,
    metric: Metric,
    workers: usize,
}

impl Dbscan {
    /// Creates a DBSCAN clusterer using cosine distance.
    ///
    /// * `eps` - maximum distance between two points to be neighbors.
    /// * `min_samples` - neighborhood size (self included) for a core point.
    pub fn new(eps: f32, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            metric: Metric::Cosine,
            workers: 0,
        }
    }

    /// Sets the distance metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the number of neighborhood worker threads. 0 uses the global rayon pool.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Returns one label per point; `None` marks noise.
    pub fn fit_predict(&self, points: &[Embedding]) -> Result<Vec<Option<usize>>> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(FaceGroupError::InvalidParameter {
                name: "eps",
                message: "must be a positive finite number",
            });
        }
        if self.min_samples == 0 {
            return Err(FaceGroupError::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        let Some(first) = points.first() else {
            return Err(FaceGroupError::EmptyInput);
        };
        let dim = first.len();
        if let Some(bad) = points.iter().find(|p| p.len() != dim) {
            return Err(FaceGroupError::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }

        let n = points.len();
        let neighborhoods = self.neighborhoods(points)?;
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|nb| nb.len() >= self.min_samples)
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut next_label = 0usize;
        let mut stack: Vec<usize> = Vec::new();

        for start in 0..n {
            if labels[start].is_some() || !is_core[start] {
                continue;
            }

            // Depth-first expansion; the first label a point receives is final.
            let mut i = start;
            loop {
                if labels[i].is_none() {
                    labels[i] = Some(next_label);
                    if is_core[i] {
                        for &j in &neighborhoods[i] {
                            if labels[j].is_none() {
                                stack.push(j);
                            }
                        }
                    }
                }
                match stack.pop() {
                    Some(j) => i = j,
                    None => break,
                }
            }
            next_label += 1;
        }

        Ok(labels)
    }

    /// Indices within `eps` of each point, ascending, self included.
    ///
    /// Distances are compared in f64 against `eps` widened to f64.
    fn neighborhoods(&self, points: &[Embedding]) -> Result<Vec<Vec<usize>>> {
        let (eps, metric) = (self.eps as f64, self.metric);
        let range_query = |i: usize| -> Vec<usize> {
            let q = &points[i];
            points
                .iter()
                .enumerate()
                .filter(|(_, p)| metric.distance(q, p) <= eps)
                .map(|(j, _)| j)
                .collect()
        };

        let n = points.len();
        if self.workers == 0 {
            return Ok((0..n).into_par_iter().map(range_query).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        Ok(pool.install(|| (0..n).into_par_iter().map(range_query).collect()))
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.06, 1)
    }
}
