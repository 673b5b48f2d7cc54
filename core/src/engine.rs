use crate::corpus::{CorpusBundle, SchemeDocument};
use crate::error::Result;
use crate::model::TermWeightingModel;
use crate::persist::{load_corpus, load_model};
use crate::summary::summarize;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

pub const DEFAULT_TOP_K: usize = 5;
pub const UNKNOWN_SCHEME: &str = "Unknown Scheme";

/// One ranked hit, carrying every document field plus summary and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub scheme_name: String,
    pub slug: String,
    pub details: String,
    pub benefits: String,
    pub eligibility: String,
    pub application: String,
    pub documents: String,
    pub level: String,
    #[serde(rename = "schemeCategory")]
    pub scheme_category: String,
    pub tags: String,
    pub summary: String,
    /// Cosine similarity rounded to three decimals.
    pub score: f64,
}

impl ResultRecord {
    fn assemble(doc: &SchemeDocument, similarity: f32) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            scheme_name: doc.scheme_name.clone().unwrap_or_else(|| UNKNOWN_SCHEME.to_string()),
            slug: text(&doc.slug),
            details: text(&doc.details),
            benefits: text(&doc.benefits),
            eligibility: text(&doc.eligibility),
            application: text(&doc.application),
            documents: text(&doc.documents),
            level: text(&doc.level),
            scheme_category: text(&doc.scheme_category),
            tags: text(&doc.tags),
            summary: summarize(doc.details.as_deref()),
            score: round3(similarity),
        }
    }
}

fn round3(x: f32) -> f64 {
    (x as f64 * 1000.0).round() / 1000.0
}

/// Read-only retrieval engine. Safe to share across threads; `search` takes
/// `&self` and touches no mutable state.
#[derive(Debug)]
pub struct Engine {
    model: TermWeightingModel,
    corpus: CorpusBundle,
    row_norms: Vec<f32>,
    by_slug: HashMap<String, usize>,
}

impl Engine {
    /// Loads both artifacts and refuses to start on any shape or identity mismatch.
    pub fn initialize<P: AsRef<Path>, Q: AsRef<Path>>(model_path: P, matrix_path: Q) -> Result<Self> {
        let model = load_model(model_path.as_ref())?;
        let corpus = load_corpus(matrix_path.as_ref())?;
        let engine = Self::from_parts(model, corpus)?;
        tracing::info!(
            num_docs = engine.len(),
            num_terms = engine.model.vocabulary_len(),
            fingerprint = engine.model.fingerprint(),
            "engine initialized"
        );
        Ok(engine)
    }

    pub fn from_parts(model: TermWeightingModel, corpus: CorpusBundle) -> Result<Self> {
        corpus.check_against(&model)?;
        let row_norms = corpus.matrix.iter_rows().map(|r| r.norm()).collect();
        let mut by_slug = HashMap::new();
        for (i, doc) in corpus.documents.iter().enumerate() {
            if let Some(slug) = doc.slug.as_deref().filter(|s| !s.is_empty()) {
                by_slug.entry(slug.to_string()).or_insert(i);
            }
        }
        Ok(Self { model, corpus, row_norms, by_slug })
    }

    pub fn model(&self) -> &TermWeightingModel { &self.model }
    pub fn documents(&self) -> &[SchemeDocument] { &self.corpus.documents }
    pub fn len(&self) -> usize { self.corpus.documents.len() }
    pub fn is_empty(&self) -> bool { self.corpus.documents.is_empty() }

    pub fn document_by_slug(&self, slug: &str) -> Option<&SchemeDocument> {
        self.by_slug.get(slug).map(|&i| &self.corpus.documents[i])
    }

    /// Cosine similarity of the query against every document, in document order.
    /// Zero wherever the query or the row has no weight.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let qv = self.model.transform(&query.to_lowercase());
        let q_norm = qv.norm();
        if q_norm == 0.0 {
            return vec![0.0; self.len()];
        }
        self.corpus
            .matrix
            .iter_rows()
            .zip(&self.row_norms)
            .map(|(row, &r_norm)| {
                if r_norm == 0.0 {
                    0.0
                } else {
                    (qv.dot(&row) / (q_norm * r_norm)).clamp(0.0, 1.0)
                }
            })
            .collect()
    }

    /// Top `top_k` documents by similarity, ties going to the lower document index.
    /// A `top_k` of zero is treated as one.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ResultRecord> {
        let start = Instant::now();
        let scores = self.scores(query);
        let ranked = rank(&scores, top_k.max(1));
        let results: Vec<ResultRecord> = ranked
            .into_iter()
            .map(|i| ResultRecord::assemble(&self.corpus.documents[i], scores[i]))
            .collect();
        tracing::debug!(
            query_len = query.len(),
            top_k,
            hits = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "search"
        );
        results
    }
}

/// Indices of the `k` best scores: descending score, then ascending index.
pub fn rank(scores: &[f32], k: usize) -> Vec<usize> {
    let by_rank = |a: &usize, b: &usize| -> Ordering {
        scores[*b].total_cmp(&scores[*a]).then(a.cmp(b))
    };
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    let k = k.min(idx.len());
    if k == 0 {
        return Vec::new();
    }
    if k < idx.len() {
        idx.select_nth_unstable_by(k - 1, by_rank);
        idx.truncate(k);
    }
    idx.sort_unstable_by(by_rank);
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_breaks_ties_by_index() {
        let scores = [0.5, 0.9, 0.5, 0.9, 0.1];
        assert_eq!(rank(&scores, 5), vec![1, 3, 0, 2, 4]);
        assert_eq!(rank(&scores, 3), vec![1, 3, 0]);
    }

    #[test]
    fn rank_caps_at_corpus_size() {
        assert_eq!(rank(&[0.2, 0.3], 10), vec![1, 0]);
        assert!(rank(&[], 3).is_empty());
    }

    #[test]
    fn rank_with_all_zero_scores_is_index_order() {
        assert_eq!(rank(&[0.0; 6], 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn round3_rounds_to_three_places() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(round3(0.0), 0.0);
    }

    #[test]
    fn absent_fields_use_defaults() {
        let record = ResultRecord::assemble(&SchemeDocument::default(), 0.25);
        assert_eq!(record.scheme_name, UNKNOWN_SCHEME);
        assert_eq!(record.slug, "");
        assert_eq!(record.summary, "");
        assert_eq!(record.score, 0.25);
    }
}
