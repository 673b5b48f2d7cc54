use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read artifact {}: {source}", path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode artifact {}: {source}", path.display())]
    ArtifactDecode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("cannot parse artifact {}: {source}", path.display())]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("artifact {} has format version {found}, expected {expected}", path.display())]
    ArtifactVersion { path: PathBuf, found: u32, expected: u32 },

    #[error("cannot write artifact {}: {source}", path.display())]
    ArtifactEncode {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("cannot fit a model on an empty corpus")]
    EmptyCorpus,
}

impl Error {
    /// True when an artifact could not be read or parsed at load time.
    pub fn is_missing_artifact(&self) -> bool {
        matches!(
            self,
            Error::ArtifactIo { .. }
                | Error::ArtifactDecode { .. }
                | Error::ArtifactParse { .. }
                | Error::ArtifactVersion { .. }
        )
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity(_))
    }
}

/// Structural mismatches between the model, the corpus matrix and the document table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("corpus matrix has {rows} rows but the document table has {documents} entries")]
    RowCountMismatch { rows: usize, documents: usize },

    #[error("model vocabulary has {vocabulary} terms but the corpus matrix has {columns} columns")]
    DimensionMismatch { vocabulary: usize, columns: usize },

    #[error("corpus was built with model {corpus}, loaded model is {model}")]
    FingerprintMismatch { model: String, corpus: String },

    #[error("model has {terms} terms but {weights} idf weights")]
    WeightCountMismatch { terms: usize, weights: usize },

    #[error("term {term:?} has idf weight {weight}; weights must be finite and non-negative")]
    InvalidWeight { term: String, weight: String },

    #[error("term {0:?} appears more than once in the vocabulary")]
    DuplicateTerm(String),

    #[error("malformed corpus matrix: {0}")]
    MalformedMatrix(String),
}
