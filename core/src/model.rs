use crate::error::IntegrityError;
use crate::sparse::SparseVector;
use crate::tokenizer::{tokenize, TokenizerConfig};
use crate::TermId;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TfScheme {
    /// Raw occurrence count.
    #[default]
    Raw,
    /// `1 + ln(count)`
    Sublinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdfScheme {
    /// `ln((1 + N) / (1 + df)) + 1`, never zero.
    #[default]
    Smooth,
    /// `ln(N / df)`, zero for terms present in every document.
    Plain,
}

impl IdfScheme {
    pub fn weight(self, num_docs: u32, df: u32) -> f32 {
        let n = num_docs as f32;
        let df = df.max(1) as f32;
        match self {
            IdfScheme::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfScheme::Plain => (n / df).ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub tf: TfScheme,
    pub idf: IdfScheme,
    /// L2-normalize corpus rows when the matrix is built.
    pub normalize_rows: bool,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self { tf: TfScheme::Raw, idf: IdfScheme::Smooth, normalize_rows: true }
    }
}

/// Immutable term -> column mapping. Column `i` holds `terms[i]`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn new(terms: Vec<String>) -> Result<Self, IntegrityError> {
        let mut index = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if index.insert(term.clone(), i as TermId).is_some() {
                return Err(IntegrityError::DuplicateTerm(term.clone()));
            }
        }
        Ok(Self { terms, index })
    }

    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
    pub fn index_of(&self, term: &str) -> Option<TermId> { self.index.get(term).copied() }
    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }
    pub fn terms(&self) -> &[String] { &self.terms }
}

/// Frozen vocabulary plus per-term IDF weights, shared by the offline
/// builder and the query path.
#[derive(Debug, Clone)]
pub struct TermWeightingModel {
    vocabulary: Vocabulary,
    idf: Vec<f32>,
    tokenizer: TokenizerConfig,
    weighting: WeightingConfig,
    fingerprint: String,
}

impl TermWeightingModel {
    pub fn new(
        vocabulary: Vocabulary,
        idf: Vec<f32>,
        tokenizer: TokenizerConfig,
        weighting: WeightingConfig,
    ) -> Result<Self, IntegrityError> {
        if idf.len() != vocabulary.len() {
            return Err(IntegrityError::WeightCountMismatch { terms: vocabulary.len(), weights: idf.len() });
        }
        if let Some(i) = idf.iter().position(|w| *w < 0.0 || !w.is_finite()) {
            return Err(IntegrityError::InvalidWeight {
                term: vocabulary.terms()[i].clone(),
                weight: idf[i].to_string(),
            });
        }
        let fingerprint = fingerprint(&vocabulary, &idf, &tokenizer, &weighting);
        Ok(Self { vocabulary, idf, tokenizer, weighting, fingerprint })
    }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    pub fn vocabulary_len(&self) -> usize { self.vocabulary.len() }
    pub fn idf(&self, id: TermId) -> Option<f32> { self.idf.get(id as usize).copied() }
    pub fn idf_weights(&self) -> &[f32] { &self.idf }
    pub fn tokenizer(&self) -> &TokenizerConfig { &self.tokenizer }
    pub fn weighting(&self) -> &WeightingConfig { &self.weighting }

    /// Identity of this fitted model; a corpus matrix is only comparable to
    /// query vectors from the model with the same fingerprint.
    pub fn fingerprint(&self) -> &str { &self.fingerprint }

    /// Maps text onto the vocabulary as `tf * idf` per column. Unknown terms
    /// are skipped; blank text gives the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let dim = self.vocabulary.len();
        let lowered = text.to_lowercase();
        let mut tf_raw: HashMap<TermId, u32> = HashMap::new();
        for term in tokenize(&lowered, &self.tokenizer) {
            if let Some(tid) = self.vocabulary.index_of(&term) {
                *tf_raw.entry(tid).or_insert(0) += 1;
            }
        }
        if tf_raw.is_empty() {
            return SparseVector::zeros(dim);
        }
        let pairs = tf_raw
            .into_iter()
            .map(|(tid, count)| {
                let tf = match self.weighting.tf {
                    TfScheme::Raw => count as f32,
                    TfScheme::Sublinear => 1.0 + (count as f32).ln(),
                };
                (tid, tf * self.idf[tid as usize])
            })
            .collect();
        SparseVector::from_pairs(dim, pairs)
    }

    /// Row vector for the corpus matrix, normalized when the model says so.
    pub fn document_vector(&self, text: &str) -> SparseVector {
        let v = self.transform(text);
        if self.weighting.normalize_rows { v.normalized() } else { v }
    }
}

fn fingerprint(vocabulary: &Vocabulary, idf: &[f32], tokenizer: &TokenizerConfig, weighting: &WeightingConfig) -> String {
    let mut hasher = Sha1::new();
    for term in vocabulary.terms() {
        hasher.update(term.as_bytes());
        hasher.update([0u8]);
    }
    for w in idf {
        hasher.update(w.to_bits().to_le_bytes());
    }
    hasher.update(format!("{tokenizer:?}{weighting:?}").as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
