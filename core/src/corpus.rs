use crate::error::IntegrityError;
use crate::model::TermWeightingModel;
use crate::sparse::CorpusMatrix;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One government scheme as stored in the document table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeDocument {
    pub scheme_name: Option<String>,
    pub slug: Option<String>,
    pub details: Option<String>,
    pub benefits: Option<String>,
    pub eligibility: Option<String>,
    pub application: Option<String>,
    pub documents: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "schemeCategory")]
    pub scheme_category: Option<String>,
    pub tags: Option<String>,
}

/// Field names as they appear in source records and in search results.
pub const FIELD_NAMES: [&str; 10] = [
    "scheme_name",
    "slug",
    "details",
    "benefits",
    "eligibility",
    "application",
    "documents",
    "level",
    "schemeCategory",
    "tags",
];

impl SchemeDocument {
    /// Reads a source record. Strings are kept, arrays of strings are joined
    /// with ", ", anything else counts as absent.
    pub fn from_json(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(text_of);
        Self {
            scheme_name: field("scheme_name"),
            slug: field("slug"),
            details: field("details"),
            benefits: field("benefits"),
            eligibility: field("eligibility"),
            application: field("application"),
            documents: field("documents"),
            level: field("level"),
            scheme_category: field("schemeCategory"),
            tags: field("tags"),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        let v = match name {
            "scheme_name" => &self.scheme_name,
            "slug" => &self.slug,
            "details" => &self.details,
            "benefits" => &self.benefits,
            "eligibility" => &self.eligibility,
            "application" => &self.application,
            "documents" => &self.documents,
            "level" => &self.level,
            "schemeCategory" | "scheme_category" => &self.scheme_category,
            "tags" => &self.tags,
            _ => return None,
        };
        v.as_deref()
    }

    /// Text the model is fitted on: the chosen fields joined by spaces.
    pub fn indexed_text(&self, fields: &[String]) -> String {
        fields
            .iter()
            .filter_map(|f| self.field(f))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        _ => None,
    }
}

/// The corpus matrix and its row-aligned document table, persisted and
/// loaded as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusBundle {
    pub model_fingerprint: String,
    pub matrix: CorpusMatrix,
    pub documents: Vec<SchemeDocument>,
}

impl CorpusBundle {
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    /// Shape and identity checks that must hold before any query is served.
    pub fn check_against(&self, model: &TermWeightingModel) -> Result<(), IntegrityError> {
        self.matrix.validate()?;
        if self.matrix.rows() != self.documents.len() {
            return Err(IntegrityError::RowCountMismatch {
                rows: self.matrix.rows(),
                documents: self.documents.len(),
            });
        }
        if self.matrix.cols() != model.vocabulary_len() {
            return Err(IntegrityError::DimensionMismatch {
                vocabulary: model.vocabulary_len(),
                columns: self.matrix.cols(),
            });
        }
        if self.model_fingerprint != model.fingerprint() {
            return Err(IntegrityError::FingerprintMismatch {
                model: model.fingerprint().to_string(),
                corpus: self.model_fingerprint.clone(),
            });
        }
        Ok(())
    }
}
