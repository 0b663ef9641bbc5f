//! YAML configuration loading and validation

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{PipelineError, Result};

/// Seed used wherever the pipeline draws random numbers, unless configured otherwise
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Read a YAML document into an untyped mapping that mirrors the file exactly.
///
/// Fails with `ConfigNotFound` when the path does not exist and with
/// `ConfigParse` when the document is not valid YAML.
pub fn read_config(path: &Path) -> Result<serde_yaml::Value> {
    let text = read_config_text(path)?;
    let value = serde_yaml::from_str(&text).map_err(|source| {
        error!("Error parsing YAML file {}: {}", path.display(), source);
        PipelineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!("YAML file {} read successfully", path.display());
    Ok(value)
}

fn read_config_text(path: &Path) -> Result<String> {
    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(PipelineError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| {
        error!("Error reading YAML file {}: {}", path.display(), e);
        PipelineError::ConfigParse {
            path: path.to_path_buf(),
            source: serde::de::Error::custom(e),
        }
    })
}

/// Typed view of the configuration file, validated once at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_ingestion: IngestionConfig,
    pub data_processing: ProcessingConfig,
    #[serde(default)]
    pub model_training: ForestParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub bucket_name: String,
    pub bucket_file_name: String,
    /// Fraction of rows assigned to the training split, in (0, 1)
    pub train_ratio: f64,
    /// Required key; `null` means the storage client's default project
    #[serde(deserialize_with = "required_nullable")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub categorical_columns: Vec<String>,
    pub numerical_columns: Vec<String>,
    pub skewness_threshold: f64,
    pub number_of_features: usize,
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    /// Oversample the test table as well as the training table
    #[serde(default = "default_true")]
    pub balance_test: bool,
    #[serde(default)]
    pub encoding: EncodingStrategy,
    #[serde(default)]
    pub unseen_labels: UnseenLabelPolicy,
    #[serde(default)]
    pub feature_selection: ForestParams,
}

/// How label encoders are fitted across the train and test tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Fit on the training table, reuse the same codes for the test table
    #[default]
    FitOnTrain,
    /// Fit a fresh encoder on each table
    Independent,
}

/// What to do with a test-table label the training encoder never saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenLabelPolicy {
    /// Map to a reserved code equal to the vocabulary size
    #[default]
    Reserve,
    Error,
}

/// Random forest hyperparameters, shared by feature selection and model training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

/// An `Option` field whose key must still be present in the document
fn required_nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

fn default_target_column() -> String {
    "booking_status".to_string()
}

fn default_drop_columns() -> Vec<String> {
    vec!["Unnamed: 0".to_string(), "Booking_ID".to_string()]
}

fn default_random_state() -> u64 {
    DEFAULT_RANDOM_STATE
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load and validate the configuration file at `path`.
    ///
    /// Missing required keys are reported as `ConfigParse`; values outside
    /// their allowed range as `ConfigInvalid`. No defaults are substituted for
    /// required keys.
    pub fn load(path: &Path) -> Result<Self> {
        let value = read_config(path)?;
        let config: AppConfig = serde_yaml::from_value(value).map_err(|source| {
            error!("Configuration {} is missing required fields: {}", path.display(), source);
            PipelineError::ConfigParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Check value ranges that the YAML types alone cannot express
    pub fn validate(&self) -> Result<()> {
        let ingestion = &self.data_ingestion;
        if ingestion.bucket_name.trim().is_empty() {
            return Err(invalid("data_ingestion.bucket_name", "must not be empty"));
        }
        if ingestion.bucket_file_name.trim().is_empty() {
            return Err(invalid("data_ingestion.bucket_file_name", "must not be empty"));
        }
        validate_train_ratio(ingestion.train_ratio)?;

        let processing = &self.data_processing;
        if !processing.skewness_threshold.is_finite() {
            return Err(invalid(
                "data_processing.skewness_threshold",
                "must be a finite number",
            ));
        }
        if processing.number_of_features == 0 {
            return Err(invalid(
                "data_processing.number_of_features",
                "must be at least 1",
            ));
        }
        if processing.target_column.trim().is_empty() {
            return Err(invalid("data_processing.target_column", "must not be empty"));
        }

        validate_forest("data_processing.feature_selection", &processing.feature_selection)?;
        validate_forest("model_training", &self.model_training)?;
        Ok(())
    }
}

/// Validate a train ratio, which must lie strictly between 0 and 1
pub fn validate_train_ratio(ratio: f64) -> Result<()> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(invalid(
            "data_ingestion.train_ratio",
            &format!("must be between 0 and 1 (exclusive), got {}", ratio),
        ))
    }
}

fn validate_forest(section: &str, params: &ForestParams) -> Result<()> {
    if params.n_estimators == 0 {
        return Err(invalid(&format!("{}.n_estimators", section), "must be at least 1"));
    }
    if params.min_samples_split < 2 {
        return Err(invalid(
            &format!("{}.min_samples_split", section),
            "must be at least 2",
        ));
    }
    if params.max_depth == Some(0) {
        return Err(invalid(&format!("{}.max_depth", section), "must be at least 1"));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> PipelineError {
    PipelineError::ConfigInvalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
data_ingestion:
  bucket_name: hotel-data
  bucket_file_name: Hotel_Reservations.csv
  train_ratio: 0.8
  project_id: null
data_processing:
  categorical_columns: [type_of_meal_plan, booking_status]
  numerical_columns: [lead_time, avg_price_per_room]
  skewness_threshold: 5
  number_of_features: 10
"#;

    fn write_config(dir: &TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&write_config(&dir, MINIMAL)).unwrap();

        let processing = &config.data_processing;
        assert_eq!(processing.target_column, "booking_status");
        assert_eq!(processing.drop_columns, vec!["Unnamed: 0", "Booking_ID"]);
        assert_eq!(processing.random_state, 42);
        assert!(processing.balance_test);
        assert_eq!(processing.encoding, EncodingStrategy::FitOnTrain);
        assert_eq!(processing.unseen_labels, UnseenLabelPolicy::Reserve);
        assert_eq!(config.model_training, ForestParams::default());
        assert!(config.data_ingestion.project_id.is_none());
    }

    #[test]
    fn test_missing_required_key_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let text = MINIMAL.replace("  number_of_features: 10\n", "");
        let err = AppConfig::load(&write_config(&dir, &text)).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse { .. }), "got {:?}", err);
        assert!(err.to_string().contains("number_of_features"), "got: {}", err);
    }

    #[test]
    fn test_missing_project_id_key_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let text = MINIMAL.replace("  project_id: null\n", "");
        let err = AppConfig::load(&write_config(&dir, &text)).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse { .. }));
    }

    #[test]
    fn test_train_ratio_out_of_range() {
        let dir = TempDir::new().unwrap();
        let text = MINIMAL.replace("train_ratio: 0.8", "train_ratio: 1.5");
        let err = AppConfig::load(&write_config(&dir, &text)).unwrap_err();
        match err {
            PipelineError::ConfigInvalid { field, .. } => {
                assert_eq!(field, "data_ingestion.train_ratio")
            }
            other => panic!("Expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_features_rejected() {
        let dir = TempDir::new().unwrap();
        let text = MINIMAL.replace("number_of_features: 10", "number_of_features: 0");
        let err = AppConfig::load(&write_config(&dir, &text)).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_enum_options_parse() {
        let dir = TempDir::new().unwrap();
        let text = format!(
            "{}  encoding: independent\n  unseen_labels: error\n  balance_test: false\n",
            MINIMAL
        );
        let config = AppConfig::load(&write_config(&dir, &text)).unwrap();
        assert_eq!(config.data_processing.encoding, EncodingStrategy::Independent);
        assert_eq!(config.data_processing.unseen_labels, UnseenLabelPolicy::Error);
        assert!(!config.data_processing.balance_test);
    }

    #[test]
    fn test_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "data_ingestion: [unclosed\n");
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse { .. }));
    }
}
