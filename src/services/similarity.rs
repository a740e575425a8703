use std::collections::HashSet;
use std::hash::Hash;

use crate::services::matrix::{BitRow, IncidenceMatrix};

/// Jaccard index of two binary rows: |a AND b| / |a OR b|, 0 for an empty union
pub fn jaccard(a: &BitRow, b: &BitRow) -> f64 {
    let union = a.or_count(b);
    if union == 0 {
        return 0.0;
    }
    a.and_count(b) as f64 / union as f64
}

/// Jaccard index of two sets, 0 for an empty union
pub fn set_jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Scores a query vector against every row of an incidence matrix
pub struct SimilarityEngine<'a> {
    matrix: &'a IncidenceMatrix,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(matrix: &'a IncidenceMatrix) -> Self {
        Self { matrix }
    }

    /// One similarity per corpus deck, in matrix row order
    pub fn scores(&self, query: &BitRow) -> Vec<f64> {
        self.matrix
            .rows()
            .iter()
            .map(|row| jaccard(query, row))
            .collect()
    }
}
