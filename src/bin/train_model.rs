//! Trains the case-type classifier and writes the artifact.
//!
//! ## Usage
//!
//! ```sh
//! train-model                                   # defaults (see config module)
//! train-model --config train.toml
//! train-model --input export.jsonl --schema portuguese --output model.bin
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `case_classifier=info`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use case_classifier::config::{JobConfig, SourceConfig};
use case_classifier::extract::RecordSchema;
use case_classifier::{job, logging};
use clap::{Parser, ValueEnum};
use tracing::error;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Schema {
    /// `victim.age`, `victim.ethnicity`, `location`, `case_type`
    Default,
    /// `vitima.idade`, `vitima.etnia`, `localizacao`, `tipo_do_caso`
    Portuguese,
}

impl From<Schema> for RecordSchema {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Default => RecordSchema::default(),
            Schema::Portuguese => RecordSchema::portuguese(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train the case-type classifier and save it as an artifact")]
struct Args {
    /// TOML job configuration; every setting has a default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read records from a JSON lines export instead of the configured source.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Field layout of the records.
    #[arg(long, value_enum)]
    schema: Option<Schema>,

    /// Where to write the artifact.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn job_config(args: &Args) -> anyhow::Result<JobConfig> {
    let mut config = match &args.config {
        Some(path) => JobConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => JobConfig::default(),
    };
    if let Some(path) = &args.input {
        config.source = SourceConfig::JsonLines { path: path.clone() };
    }
    if let Some(schema) = args.schema {
        config.schema = schema.into();
    }
    if let Some(path) = &args.output {
        config.artifact_path = path.clone();
    }
    Ok(config)
}

fn train(args: &Args) -> anyhow::Result<PathBuf> {
    let config = job_config(args)?;
    let report = job::run_with_config(&config).context("training job failed")?;
    Ok(report.artifact_path)
}

fn main() -> ExitCode {
    logging::init_logging();
    let args = Args::parse();

    match train(&args) {
        Ok(path) => {
            println!("artifact written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("train-model").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_uses_defaults() {
        let config = job_config(&parse(&[])).unwrap();
        assert_eq!(config, JobConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(
            &path,
            r#"
            artifact_path = "from-file.bin"

            [source]
            kind = "mongo"
            database = "casos"

            [trainer]
            n_rounds = 7
            "#,
        )
        .unwrap();
        let config_arg = path.to_string_lossy().into_owned();

        let config = job_config(&parse(&[
            "--config",
            &config_arg,
            "--input",
            "export.jsonl",
            "--schema",
            "default",
            "--output",
            "out/model.bin",
        ]))
        .unwrap();

        assert_eq!(
            config.source,
            SourceConfig::JsonLines {
                path: PathBuf::from("export.jsonl")
            }
        );
        assert_eq!(config.schema, RecordSchema::default());
        assert_eq!(config.artifact_path, PathBuf::from("out/model.bin"));
        assert_eq!(config.trainer.n_rounds, 7);
    }

    #[test]
    fn test_config_file_applies_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(&path, "artifact_path = \"from-file.bin\"\n").unwrap();
        let config_arg = path.to_string_lossy().into_owned();

        let config = job_config(&parse(&["--config", &config_arg])).unwrap();

        assert_eq!(config.artifact_path, PathBuf::from("from-file.bin"));
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_schema_flag_alone() {
        let config = job_config(&parse(&["--schema", "portuguese"])).unwrap();
        assert_eq!(config.schema, RecordSchema::portuguese());
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let missing = missing.to_string_lossy().into_owned();

        let err = job_config(&parse(&["--config", &missing])).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }

    #[test]
    fn test_unknown_schema_rejected() {
        let result = Args::try_parse_from(["train-model", "--schema", "klingon"]);
        assert!(result.is_err());
    }
}
