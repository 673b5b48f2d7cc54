use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use policy_core::persist::{save_artifacts, save_meta, ArtifactPaths, MetaFile, FORMAT_VERSION};
use policy_core::{fit, FitOptions, IdfScheme, SchemeDocument, TfScheme, TokenizerConfig, WeightingConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Fit the TF-IDF model and corpus matrix for scheme search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both artifacts from input JSON/JSONL files or a directory
    Build(BuildArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// Output artifact directory
    #[arg(long)]
    output: String,
    /// Use the smoothed IDF ln((1+N)/(1+df)) + 1 (the default)
    #[arg(long, default_value_t = false, conflicts_with = "plain_idf")]
    smoothed_idf: bool,
    /// Use IDF = ln(N/df) instead of the smoothed ln((1+N)/(1+df)) + 1
    #[arg(long, default_value_t = false)]
    plain_idf: bool,
    /// Use 1 + ln(tf) instead of the raw term count
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Drop terms that occur in fewer documents than this
    #[arg(long, default_value_t = 1)]
    min_df: u32,
    /// Keep inflected word forms
    #[arg(long, default_value_t = false)]
    no_stem: bool,
    /// Keep English stopwords in the vocabulary
    #[arg(long, default_value_t = false)]
    keep_stopwords: bool,
    /// Comma-separated record fields to index (default: all)
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,
}

impl BuildArgs {
    fn fit_options(&self) -> FitOptions {
        let mut options = FitOptions {
            tokenizer: TokenizerConfig {
                stem: !self.no_stem,
                remove_stopwords: !self.keep_stopwords,
                ..TokenizerConfig::default()
            },
            weighting: WeightingConfig {
                tf: if self.sublinear_tf { TfScheme::Sublinear } else { TfScheme::Raw },
                idf: if self.plain_idf && !self.smoothed_idf { IdfScheme::Plain } else { IdfScheme::Smooth },
                ..WeightingConfig::default()
            },
            min_df: self.min_df,
            ..FitOptions::default()
        };
        if let Some(fields) = &self.fields {
            options.fields = fields.clone();
        }
        options
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            build_index(Path::new(&args.input), Path::new(&args.output), &args.fit_options())
        }
    }
}

fn build_index(input: &Path, output: &Path, options: &FitOptions) -> Result<()> {
    let files = input_files(input);
    if files.is_empty() {
        bail!("no .json or .jsonl input found at {}", input.display());
    }

    let mut documents: Vec<SchemeDocument> = Vec::new();
    for file in files {
        let before = documents.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut documents)?;
        } else {
            read_json(&file, &mut documents)?;
        }
        tracing::debug!(file = %file.display(), records = documents.len() - before, "read input");
    }
    tracing::info!(num_docs = documents.len(), "ingested documents");

    let (model, bundle) = fit(documents, options)?;

    let paths = ArtifactPaths::new(output);
    save_artifacts(&paths, &model, &bundle)?;
    let meta = MetaFile {
        num_docs: bundle.len() as u32,
        num_terms: model.vocabulary_len() as u32,
        fingerprint: model.fingerprint().to_string(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output = %output.display(), fingerprint = model.fingerprint(), "index build complete");
    Ok(())
}

/// Input files in a stable order so document indices are reproducible.
fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn read_jsonl(file: &Path, documents: &mut Vec<SchemeDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        documents.push(SchemeDocument::from_json(&value));
    }
    Ok(())
}

fn read_json(file: &Path, documents: &mut Vec<SchemeDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            documents.extend(arr.iter().map(SchemeDocument::from_json));
        }
        serde_json::Value::Object(_) => {
            documents.push(SchemeDocument::from_json(&json));
        }
        _ => tracing::warn!(file = %file.display(), "skipping input that is neither an object nor an array"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_core::Engine;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builds_loadable_artifacts_from_mixed_inputs() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::write(
            input.path().join("a.json"),
            r#"[{"scheme_name": "Awas", "slug": "awas", "details": "housing subsidy for families"}]"#,
        )
        .unwrap();
        fs::write(
            input.path().join("b.jsonl"),
            "{\"scheme_name\": \"Vidya\", \"slug\": \"vidya\", \"details\": \"scholarship for students\"}\n\n",
        )
        .unwrap();
        fs::write(input.path().join("notes.txt"), "ignored").unwrap();

        build_index(input.path(), output.path(), &FitOptions::default()).unwrap();

        let paths = ArtifactPaths::new(output.path());
        assert!(paths.meta().exists());
        let engine = Engine::initialize(paths.model(), paths.corpus()).unwrap();
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.search("scholarship", 1)[0].slug, "vidya");
    }

    #[test]
    fn empty_input_directory_is_an_error() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        assert!(build_index(input.path(), output.path(), &FitOptions::default()).is_err());
    }

    fn build_args(extra: &[&str]) -> BuildArgs {
        let mut argv = vec!["indexer", "build", "--input", "in", "--output", "out"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Build(args) => args,
        }
    }

    #[test]
    fn idf_flags_select_the_scheme() {
        assert_eq!(build_args(&[]).fit_options().weighting.idf, IdfScheme::Smooth);
        assert_eq!(build_args(&["--smoothed-idf"]).fit_options().weighting.idf, IdfScheme::Smooth);
        assert_eq!(build_args(&["--plain-idf"]).fit_options().weighting.idf, IdfScheme::Plain);
        let argv = ["indexer", "build", "--input", "in", "--output", "out", "--smoothed-idf", "--plain-idf"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn build_flags_reach_fit_options() {
        let options = build_args(&["--sublinear-tf", "--min-df", "2", "--no-stem", "--fields", "details,tags"])
            .fit_options();
        assert_eq!(options.weighting.tf, TfScheme::Sublinear);
        assert_eq!(options.min_df, 2);
        assert!(!options.tokenizer.stem);
        assert!(options.tokenizer.remove_stopwords);
        assert_eq!(options.fields, vec!["details".to_string(), "tags".to_string()]);
    }
}
