use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::TermId;

/// Term-weight vector stored as parallel arrays, columns strictly ascending.
/// The empty vector is the all-zero vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    columns: Vec<TermId>,
    weights: Vec<f32>,
}

/// Borrowed view over a sparse vector or a corpus matrix row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseView<'a> {
    pub columns: &'a [TermId],
    pub weights: &'a [f32],
}

impl SparseVector {
    /// Builds a vector from `(column, weight)` pairs in any order. Duplicate
    /// columns are summed; zero weights are dropped.
    pub fn from_pairs(mut pairs: Vec<(TermId, f32)>) -> Self {
        pairs.sort_by_key(|(c, _)| *c);
        let mut columns: Vec<TermId> = Vec::with_capacity(pairs.len());
        let mut weights: Vec<f32> = Vec::with_capacity(pairs.len());
        for (col, w) in pairs {
            if columns.last() == Some(&col) {
                if let Some(last) = weights.last_mut() { *last += w; }
            } else {
                columns.push(col);
                weights.push(w);
            }
        }
        let (columns, weights): (Vec<TermId>, Vec<f32>) = columns.into_iter().zip(weights).filter(|(_, w)| *w != 0.0).unzip();
        Self { columns, weights }
    }

    pub fn view(&self) -> SparseView<'_> {
        SparseView { columns: &self.columns, weights: &self.weights }
    }

    pub fn nnz(&self) -> usize { self.columns.len() }

    pub fn is_zero(&self) -> bool { self.columns.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.view().iter()
    }

    /// Scales to unit L2 norm. The zero vector stays zero.
    pub fn l2_normalize(&mut self) {
        let norm = self.view().norm();
        if norm > 0.0 {
            for w in self.weights.iter_mut() { *w /= norm; }
        }
    }
}

impl<'a> SparseView<'a> {
    pub fn iter(self) -> impl Iterator<Item = (TermId, f32)> + 'a {
        self.columns.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn norm(self) -> f32 {
        self.weights.iter().map(|w| w * w).sum::<f32>().sqrt()
    }

    /// Merge join over the two sorted column lists.
    pub fn dot(self, other: SparseView<'_>) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0f32;
        while i < self.columns.len() && j < other.columns.len() {
            match self.columns[i].cmp(&other.columns[j]) {
                Ordering::Equal => {
                    dot += self.weights[i] * other.weights[j];
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        dot
    }
}

/// Cosine similarity of two non-negative vectors, in `[0, 1]`. Zero
/// magnitude on either side yields 0.0.
pub fn cosine(a: SparseView<'_>, b: SparseView<'_>) -> f32 {
    let (na, nb) = (a.norm(), b.norm());
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(0.0, 1.0)
}
