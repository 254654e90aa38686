//! Job configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives a
//! runnable job. Example:
//!
//! ```toml
//! artifact_path = "model.bin"
//!
//! [source]
//! kind = "mongo"
//! uri = "mongodb://localhost:27017/"
//! database = "meu_banco"
//! collection = "meus_dados"
//!
//! [trainer]
//! n_rounds = 100
//! max_depth = 6
//! ```

use crate::extract::RecordSchema;
use crate::source::{JsonLinesSource, RecordSource, SourceError};
use crate::trainer::TrainerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the exported collection.
pub const DEFAULT_EXPORT_PATH: &str = "data/records.jsonl";

/// Default artifact location.
pub const DEFAULT_ARTIFACT_PATH: &str = "model.bin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for the MongoDB record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/".to_string(),
            database: "meu_banco".to_string(),
            collection: "meus_dados".to_string(),
        }
    }
}

/// Where the raw records come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A collection export, one JSON document per line or a JSON array.
    JsonLines { path: PathBuf },
    /// A live MongoDB collection (requires the `mongodb` feature).
    Mongo(MongoConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        if cfg!(feature = "mongodb") {
            SourceConfig::Mongo(MongoConfig::default())
        } else {
            SourceConfig::JsonLines {
                path: PathBuf::from(DEFAULT_EXPORT_PATH),
            }
        }
    }
}

impl SourceConfig {
    /// Record layout of the records this source yields by default.
    pub fn default_schema(&self) -> RecordSchema {
        match self {
            SourceConfig::JsonLines { .. } => RecordSchema::default(),
            SourceConfig::Mongo(_) => RecordSchema::portuguese(),
        }
    }

    /// Opens the configured source.
    ///
    /// For MongoDB this connects and pings the server, so an unreachable
    /// store fails here rather than during extraction.
    pub fn open(&self) -> Result<Box<dyn RecordSource>, SourceError> {
        match self {
            SourceConfig::JsonLines { path } => Ok(Box::new(JsonLinesSource::new(path.clone()))),
            #[cfg(feature = "mongodb")]
            SourceConfig::Mongo(config) => Ok(Box::new(crate::source::MongoSource::connect(
                config.clone(),
            )?)),
            #[cfg(not(feature = "mongodb"))]
            SourceConfig::Mongo(config) => Err(SourceError::Unavailable(format!(
                "{}: built without the `mongodb` feature",
                config.uri
            ))),
        }
    }
}

/// Settings of one training run.
///
/// When the file has no `[schema]` table the schema follows the source:
/// the MongoDB collection uses Portuguese keys, exports use the default
/// layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "JobConfigFile")]
pub struct JobConfig {
    pub source: SourceConfig,
    pub schema: RecordSchema,
    pub artifact_path: PathBuf,
    pub trainer: TrainerConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        let source = SourceConfig::default();
        Self {
            schema: source.default_schema(),
            source,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            trainer: TrainerConfig::default(),
        }
    }
}

/// On-disk form of [`JobConfig`]; every table is optional.
#[derive(Deserialize)]
struct JobConfigFile {
    #[serde(default)]
    source: SourceConfig,
    schema: Option<RecordSchema>,
    #[serde(default = "default_artifact_path")]
    artifact_path: PathBuf,
    #[serde(default)]
    trainer: TrainerConfig,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_PATH)
}

impl From<JobConfigFile> for JobConfig {
    fn from(file: JobConfigFile) -> Self {
        let schema = file
            .schema
            .unwrap_or_else(|| file.source.default_schema());
        Self {
            source: file.source,
            schema,
            artifact_path: file.artifact_path,
            trainer: file.trainer,
        }
    }
}

impl JobConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extraction, FeatureExtractor};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = JobConfig::from_toml_str("").unwrap();
        assert_eq!(config, JobConfig::default());
        assert_eq!(config.artifact_path, PathBuf::from("model.bin"));
        assert_eq!(config.trainer.n_rounds, 100);
    }

    #[test]
    fn test_mongo_defaults() {
        let mongo = MongoConfig::default();
        assert_eq!(mongo.uri, "mongodb://localhost:27017/");
        assert_eq!(mongo.database, "meu_banco");
        assert_eq!(mongo.collection, "meus_dados");
    }

    #[test]
    fn test_parse_json_lines_source() {
        let config = JobConfig::from_toml_str(
            r#"
            artifact_path = "out/classifier.bin"

            [source]
            kind = "json_lines"
            path = "exports/cases.jsonl"

            [schema]
            age = "/vitima/idade"

            [trainer]
            n_rounds = 25
            learning_rate = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(
            config.source,
            SourceConfig::JsonLines {
                path: PathBuf::from("exports/cases.jsonl")
            }
        );
        assert_eq!(config.artifact_path, PathBuf::from("out/classifier.bin"));
        assert_eq!(config.schema.age, "/vitima/idade");
        assert_eq!(config.schema.location, RecordSchema::default().location);
        assert_eq!(config.trainer.n_rounds, 25);
        assert_eq!(config.trainer.learning_rate, 0.1);
        assert_eq!(config.trainer.max_depth, 6);
    }

    #[test]
    fn test_parse_mongo_source_with_partial_fields() {
        let config = JobConfig::from_toml_str(
            r#"
            [source]
            kind = "mongo"
            database = "casos"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.source,
            SourceConfig::Mongo(MongoConfig {
                database: "casos".to_string(),
                ..MongoConfig::default()
            })
        );
    }

    #[test]
    fn test_mongo_source_defaults_to_portuguese_schema() {
        let config = JobConfig::from_toml_str(
            r#"
            [source]
            kind = "mongo"
            "#,
        )
        .unwrap();
        assert_eq!(config.schema, RecordSchema::portuguese());

        let record = serde_json::json!({
            "vitima": { "idade": 30, "etnia": "parda" },
            "localizacao": "Bairro A",
            "tipo_do_caso": "Homicídio",
        });
        let extraction = FeatureExtractor::new(config.schema).extract(&record);
        assert!(matches!(extraction, Extraction::Row { .. }));
    }

    #[test]
    fn test_explicit_schema_overrides_source_default() {
        let config = JobConfig::from_toml_str(
            r#"
            [source]
            kind = "mongo"

            [schema]
            location = "/place"
            "#,
        )
        .unwrap();
        assert_eq!(config.schema.location, "/place");
        assert_eq!(config.schema.age, RecordSchema::default().age);
    }

    #[test]
    fn test_default_schema_matches_default_source() {
        let config = JobConfig::default();
        assert_eq!(config.schema, config.source.default_schema());
        if cfg!(feature = "mongodb") {
            assert_eq!(config.schema, RecordSchema::portuguese());
        } else {
            assert_eq!(config.schema, RecordSchema::default());
        }
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let result = JobConfig::from_toml_str(
            r#"
            [source]
            kind = "postgres"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(&path, "artifact_path = \"x.bin\"\n").unwrap();

        let config = JobConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.artifact_path, PathBuf::from("x.bin"));

        let missing = JobConfig::from_toml_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_mongo_source_unavailable_without_feature() {
        let result = SourceConfig::Mongo(MongoConfig::default()).open();
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
