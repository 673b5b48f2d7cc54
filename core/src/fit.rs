//! Offline fitting: builds the term-weighting model and the corpus matrix
//! from scheme records. Runs once at index build time, never at query time.

use crate::corpus::{CorpusBundle, SchemeDocument, FIELD_NAMES};
use crate::error::{Error, Result};
use crate::model::{TermWeightingModel, Vocabulary, WeightingConfig};
use crate::sparse::CorpusMatrix;
use crate::tokenizer::{tokenize, TokenizerConfig};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone)]
pub struct FitOptions {
    pub tokenizer: TokenizerConfig,
    pub weighting: WeightingConfig,
    /// Terms found in fewer documents than this are left out of the vocabulary.
    pub min_df: u32,
    /// Record fields concatenated into the indexed text.
    pub fields: Vec<String>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            weighting: WeightingConfig::default(),
            min_df: 1,
            fields: FIELD_NAMES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

pub fn fit(documents: Vec<SchemeDocument>, options: &FitOptions) -> Result<(TermWeightingModel, CorpusBundle)> {
    if documents.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    let texts: Vec<String> = documents
        .iter()
        .map(|d| d.indexed_text(&options.fields).to_lowercase())
        .collect();

    // Document frequency per term; BTreeMap so column order is lexicographic.
    let mut df: BTreeMap<String, u32> = BTreeMap::new();
    for text in &texts {
        let mut seen_in_doc: HashSet<String> = HashSet::new();
        for term in tokenize(text, &options.tokenizer) {
            if seen_in_doc.insert(term.clone()) {
                *df.entry(term).or_insert(0) += 1;
            }
        }
    }

    let num_docs = documents.len() as u32;
    let (terms, idf): (Vec<String>, Vec<f32>) = df
        .into_iter()
        .filter(|(_, count)| *count >= options.min_df)
        .map(|(term, count)| {
            let w = options.weighting.idf.weight(num_docs, count);
            (term, w)
        })
        .unzip();
    tracing::info!(num_docs, num_terms = terms.len(), "fitted vocabulary");

    let vocabulary = Vocabulary::new(terms)?;
    let model = TermWeightingModel::new(vocabulary, idf, options.tokenizer, options.weighting)?;

    let mut matrix = CorpusMatrix::new(model.vocabulary_len());
    for text in &texts {
        matrix.push_row(&model.document_vector(text));
    }
    tracing::info!(nnz = matrix.nnz(), fingerprint = model.fingerprint(), "built corpus matrix");

    let bundle = CorpusBundle {
        model_fingerprint: model.fingerprint().to_string(),
        matrix,
        documents,
    };
    Ok((model, bundle))
}
