//! Sparse term vectors and the row-compressed corpus matrix.
//!
//! Column indices are vocabulary positions. Both representations keep
//! indices strictly ascending, which is what lets `dot` run as a merge.

use crate::error::IntegrityError;
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<TermId>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self { dim, indices: Vec::new(), values: Vec::new() }
    }

    /// Builds a vector from `(column, value)` pairs. Pairs may arrive in any
    /// order; zero values are dropped. Columns must be unique and `< dim`.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(TermId, f32)>) -> Self {
        pairs.retain(|&(_, v)| v != 0.0);
        pairs.sort_unstable_by_key(|&(col, _)| col);
        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0), "duplicate column");
        debug_assert!(pairs.last().map_or(true, |&(col, _)| (col as usize) < dim));
        let (indices, values) = pairs.into_iter().unzip();
        Self { dim, indices, values }
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn nnz(&self) -> usize { self.indices.len() }
    pub fn is_empty(&self) -> bool { self.indices.is_empty() }
    pub fn indices(&self) -> &[TermId] { &self.indices }
    pub fn values(&self) -> &[f32] { &self.values }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        l2_norm(&self.values)
    }

    pub fn dot(&self, row: &RowView<'_>) -> f32 {
        merge_dot(&self.indices, &self.values, row.indices, row.values)
    }

    /// Unit-length copy; the zero vector stays zero.
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self.clone();
        }
        Self {
            dim: self.dim,
            indices: self.indices.clone(),
            values: self.values.iter().map(|v| v / norm).collect(),
        }
    }

    pub fn as_row(&self) -> RowView<'_> {
        RowView { indices: &self.indices, values: &self.values }
    }
}

/// Borrowed view of one corpus matrix row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub indices: &'a [TermId],
    pub values: &'a [f32],
}

impl RowView<'_> {
    pub fn norm(&self) -> f32 { l2_norm(self.values) }
    pub fn nnz(&self) -> usize { self.indices.len() }
}

/// Documents x vocabulary, stored in compressed sparse row form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<TermId>,
    data: Vec<f32>,
}

impl CorpusMatrix {
    pub fn new(n_cols: usize) -> Self {
        Self { n_cols, indptr: vec![0], indices: Vec::new(), data: Vec::new() }
    }

    pub fn push_row(&mut self, row: &SparseVector) {
        debug_assert_eq!(row.dim(), self.n_cols);
        self.indices.extend_from_slice(row.indices());
        self.data.extend_from_slice(row.values());
        self.indptr.push(self.indices.len());
    }

    pub fn rows(&self) -> usize { self.indptr.len().saturating_sub(1) }
    pub fn cols(&self) -> usize { self.n_cols }
    pub fn nnz(&self) -> usize { self.data.len() }

    pub fn row(&self, i: usize) -> RowView<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        RowView { indices: &self.indices[start..end], values: &self.data[start..end] }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.rows()).map(move |i| self.row(i))
    }

    /// Checks the CSR invariants. Deserialized matrices must pass this before
    /// `row` is called on them.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let malformed = |msg: String| Err(IntegrityError::MalformedMatrix(msg));
        if self.indptr.first() != Some(&0) {
            return malformed("row pointer must start at 0".into());
        }
        if self.indices.len() != self.data.len() {
            return malformed(format!("{} column indices but {} values", self.indices.len(), self.data.len()));
        }
        if self.indptr.last() != Some(&self.data.len()) {
            return malformed("row pointer does not end at the value count".into());
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return malformed("row pointer is not monotonic".into());
        }
        for (i, row) in self.iter_rows().enumerate() {
            if row.indices.windows(2).any(|w| w[0] >= w[1]) {
                return malformed(format!("row {i} has unsorted or repeated columns"));
            }
            if row.indices.last().map_or(false, |&c| c as usize >= self.n_cols) {
                return malformed(format!("row {i} has a column outside 0..{}", self.n_cols));
            }
            if row.values.iter().any(|v| *v < 0.0 || !v.is_finite()) {
                return malformed(format!("row {i} has a negative or non-finite entry"));
            }
        }
        Ok(())
    }
}

fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn merge_dot(ai: &[TermId], av: &[f32], bi: &[TermId], bv: &[f32]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut acc = 0.0f32;
    while i < ai.len() && j < bi.len() {
        match ai[i].cmp(&bi[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                acc += av[i] * bv[j];
                i += 1;
                j += 1;
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_sorts_and_drops_zeros() {
        let v = SparseVector::from_pairs(6, vec![(4, 1.0), (1, 2.0), (3, 0.0)]);
        assert_eq!(v.indices(), &[1, 4]);
        assert_eq!(v.values(), &[2.0, 1.0]);
    }

    #[test]
    fn dot_only_counts_shared_columns() {
        let a = SparseVector::from_pairs(5, vec![(0, 1.0), (2, 2.0), (4, 3.0)]);
        let b = SparseVector::from_pairs(5, vec![(2, 5.0), (3, 7.0), (4, 1.0)]);
        assert_eq!(a.dot(&b.as_row()), 13.0);
    }

    #[test]
    fn zero_vector_normalizes_to_itself() {
        let z = SparseVector::zeros(3);
        assert_eq!(z.normalized(), z);
        assert_eq!(z.norm(), 0.0);
    }

    #[test]
    fn matrix_rows_round_trip() {
        let mut m = CorpusMatrix::new(4);
        m.push_row(&SparseVector::from_pairs(4, vec![(1, 0.5), (3, 0.5)]));
        m.push_row(&SparseVector::zeros(4));
        m.push_row(&SparseVector::from_pairs(4, vec![(0, 1.0)]));
        assert_eq!(m.rows(), 3);
        assert_eq!(m.row(0).indices, &[1, 3]);
        assert_eq!(m.row(1).nnz(), 0);
        assert_eq!(m.row(2).values, &[1.0]);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_column() {
        let m = CorpusMatrix { n_cols: 2, indptr: vec![0, 1], indices: vec![5], data: vec![1.0] };
        assert!(matches!(m.validate(), Err(IntegrityError::MalformedMatrix(_))));
    }

    #[test]
    fn validate_rejects_negative_entries() {
        let m = CorpusMatrix { n_cols: 2, indptr: vec![0, 1], indices: vec![1], data: vec![-0.1] };
        assert!(m.validate().is_err());
    }
}
