use anyhow::{ensure, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::normalizer::normalize;
use crate::sparse::{SparseVector, SparseView};
use crate::vectorizer::TfidfModel;
use crate::{CorpusDocument, RowId, ScoredResult, TermId};

/// Pre-computed document vectors in compressed-row form: row `i` occupies
/// `columns[row_offsets[i]..row_offsets[i + 1]]` and the matching `weights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusMatrix {
    n_cols: usize,
    row_offsets: Vec<usize>,
    columns: Vec<TermId>,
    weights: Vec<f32>,
}

impl CorpusMatrix {
    pub fn from_rows(rows: &[SparseVector], n_cols: usize) -> Self {
        let nnz = rows.iter().map(SparseVector::nnz).sum();
        let mut row_offsets = Vec::with_capacity(rows.len() + 1);
        let mut columns = Vec::with_capacity(nnz);
        let mut weights = Vec::with_capacity(nnz);
        row_offsets.push(0);
        for row in rows {
            for (col, w) in row.iter() {
                columns.push(col);
                weights.push(w);
            }
            row_offsets.push(columns.len());
        }
        Self { n_cols, row_offsets, columns, weights }
    }

    pub fn num_rows(&self) -> usize { self.row_offsets.len().saturating_sub(1) }
    pub fn num_cols(&self) -> usize { self.n_cols }
    pub fn nnz(&self) -> usize { self.columns.len() }

    pub fn row(&self, row: RowId) -> SparseView<'_> {
        let (start, end) = (self.row_offsets[row], self.row_offsets[row + 1]);
        SparseView { columns: &self.columns[start..end], weights: &self.weights[start..end] }
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseView<'_>> + '_ {
        (0..self.num_rows()).map(move |r| self.row(r))
    }

    /// Structural checks run after deserializing untrusted artifacts.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.row_offsets.is_empty() && self.row_offsets[0] == 0, "matrix row offsets must start at 0");
        ensure!(self.row_offsets.windows(2).all(|w| w[0] <= w[1]), "matrix row offsets must be non-decreasing");
        ensure!(self.row_offsets.last() == Some(&self.columns.len()), "matrix row offsets do not cover all entries");
        ensure!(self.columns.len() == self.weights.len(), "matrix columns and weights differ in length");
        ensure!(
            self.columns.iter().all(|&c| (c as usize) < self.n_cols),
            "matrix references a column outside the vocabulary"
        );
        Ok(())
    }
}

/// Corpus documents aligned row-for-row with their vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    documents: Vec<CorpusDocument>,
    matrix: CorpusMatrix,
}

impl Corpus {
    /// Vectorizes every document's `combined_text` with the fitted model.
    pub fn build(documents: Vec<CorpusDocument>, model: &TfidfModel) -> Self {
        let rows: Vec<SparseVector> = documents
            .par_iter()
            .map(|doc| model.vectorize(&normalize(&doc.combined_text)))
            .collect();
        let matrix = CorpusMatrix::from_rows(&rows, model.num_features());
        Self { documents, matrix }
    }

    pub fn from_parts(documents: Vec<CorpusDocument>, matrix: CorpusMatrix) -> Result<Self> {
        matrix.validate()?;
        ensure!(
            matrix.num_rows() == documents.len(),
            "corpus matrix has {} rows but {} documents were loaded",
            matrix.num_rows(),
            documents.len()
        );
        Ok(Self { documents, matrix })
    }

    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
    pub fn documents(&self) -> &[CorpusDocument] { &self.documents }
    pub fn matrix(&self) -> &CorpusMatrix { &self.matrix }

    /// Stored id, or `post_<row>` when the document carries none.
    pub fn document_id(&self, row: RowId) -> String {
        match &self.documents[row].id {
            Some(id) => id.clone(),
            None => format!("post_{row}"),
        }
    }

    /// Rows whose document id (stored or synthesized) is in `ids`.
    pub fn rows_matching(&self, ids: &[String]) -> HashSet<RowId> {
        if ids.is_empty() {
            return HashSet::new();
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        (0..self.len()).filter(|&row| wanted.contains(self.document_id(row).as_str())).collect()
    }

    pub fn materialize(&self, row: RowId, similarity_score: f32) -> ScoredResult {
        let doc = &self.documents[row];
        ScoredResult {
            id: self.document_id(row),
            title: doc.title.clone(),
            text: doc.combined_text.clone(),
            url: doc.url.clone(),
            subreddit: doc.subreddit.clone(),
            score: doc.score,
            similarity_score,
            created_utc: doc.created_utc,
        }
    }
}
