use crate::corpus::CorpusBundle;
use crate::error::{Error, Result};
use crate::model::{TermWeightingModel, Vocabulary, WeightingConfig};
use crate::tokenizer::TokenizerConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub fingerprint: String,
    pub created_at: String,
    pub version: u32,
}

pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn model(&self) -> PathBuf { self.root.join("policy_vectorizer.bin") }
    pub fn corpus(&self) -> PathBuf { self.root.join("policy_tfidf_matrix.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    tokenizer: TokenizerConfig,
    weighting: WeightingConfig,
    terms: Vec<String>,
    idf: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct CorpusArtifact {
    format_version: u32,
    bundle: CorpusBundle,
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| Error::ArtifactIo { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(io_err)?;
    }
    let mut f = File::create(path).map_err(io_err)?;
    f.write_all(bytes).map_err(io_err)?;
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let io_err = |source| Error::ArtifactIo { path: path.to_path_buf(), source };
    let mut f = File::open(path).map_err(io_err)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(io_err)?;
    bincode::deserialize(&buf).map_err(|source| Error::ArtifactDecode { path: path.to_path_buf(), source })
}

fn encode<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| Error::ArtifactEncode { path: path.to_path_buf(), source: e })
}

fn check_version(path: &Path, found: u32) -> Result<()> {
    if found != FORMAT_VERSION {
        return Err(Error::ArtifactVersion { path: path.to_path_buf(), found, expected: FORMAT_VERSION });
    }
    Ok(())
}

pub fn save_model(path: &Path, model: &TermWeightingModel) -> Result<()> {
    let artifact = ModelArtifact {
        format_version: FORMAT_VERSION,
        tokenizer: *model.tokenizer(),
        weighting: *model.weighting(),
        terms: model.vocabulary().terms().to_vec(),
        idf: model.idf_weights().to_vec(),
    };
    write_bytes(path, &encode(path, &artifact)?)
}

/// Loads the fitted model. Duplicate terms or a weight/term count mismatch
/// are integrity errors.
pub fn load_model(path: &Path) -> Result<TermWeightingModel> {
    let artifact: ModelArtifact = read_artifact(path)?;
    check_version(path, artifact.format_version)?;
    let vocabulary = Vocabulary::new(artifact.terms)?;
    let model = TermWeightingModel::new(vocabulary, artifact.idf, artifact.tokenizer, artifact.weighting)?;
    tracing::debug!(path = %path.display(), num_terms = model.vocabulary_len(), "loaded model artifact");
    Ok(model)
}

pub fn save_corpus(path: &Path, bundle: &CorpusBundle) -> Result<()> {
    #[derive(Serialize)]
    struct CorpusArtifactRef<'a> {
        format_version: u32,
        bundle: &'a CorpusBundle,
    }
    let artifact = CorpusArtifactRef { format_version: FORMAT_VERSION, bundle };
    write_bytes(path, &encode(path, &artifact)?)
}

/// Loads the matrix and document table together. Alignment against the model
/// is checked by the engine, which has both in hand.
pub fn load_corpus(path: &Path) -> Result<CorpusBundle> {
    let artifact: CorpusArtifact = read_artifact(path)?;
    check_version(path, artifact.format_version)?;
    tracing::debug!(path = %path.display(), num_docs = artifact.bundle.len(), "loaded corpus artifact");
    Ok(artifact.bundle)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    let path = paths.meta();
    let json = serde_json::to_string_pretty(meta)
        .map_err(|e| Error::ArtifactEncode { path: path.clone(), source: Box::new(e) })?;
    write_bytes(&path, json.as_bytes())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let io_err = |source| Error::ArtifactIo { path: path.clone(), source };
    let mut f = File::open(&path).map_err(io_err)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf).map_err(io_err)?;
    serde_json::from_str(&buf).map_err(|e| Error::ArtifactParse { path: path.clone(), source: Box::new(e) })
}

/// Writes both artifacts for a freshly fitted model.
pub fn save_artifacts(paths: &ArtifactPaths, model: &TermWeightingModel, bundle: &CorpusBundle) -> Result<()> {
    save_model(&paths.model(), model)?;
    save_corpus(&paths.corpus(), bundle)?;
    Ok(())
}
