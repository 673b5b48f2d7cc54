//! TF-IDF retrieval over a fixed corpus of government scheme documents.
//!
//! The model and the corpus matrix are fitted offline ([`fit`]), persisted
//! ([`persist`]) and loaded read-only into an [`Engine`], which ranks every
//! document against a query by cosine similarity.

pub mod cache;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod fit;
pub mod model;
pub mod persist;
pub mod sparse;
pub mod summary;
pub mod tokenizer;

pub type TermId = u32;

pub use cache::{Generation, QueryCache};
pub use corpus::{CorpusBundle, SchemeDocument};
pub use engine::{Engine, ResultRecord, DEFAULT_TOP_K, UNKNOWN_SCHEME};
pub use error::{Error, IntegrityError, Result};
pub use fit::{fit, FitOptions};
pub use model::{IdfScheme, TermWeightingModel, TfScheme, Vocabulary, WeightingConfig};
pub use sparse::{CorpusMatrix, SparseVector};
pub use tokenizer::TokenizerConfig;
