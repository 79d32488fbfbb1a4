use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrichment::EnrichmentConfig;
use crate::errors::DomainError;
use crate::frequency::ScoringConfig;

pub const CONFIG_FILE_NAME: &str = "pantree.toml";
pub const NESTED_CONFIG_FILE: &str = "config/pantree.toml";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub enrichment: EnrichmentConfig,
    pub dataset: DatasetConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub min_confidence: Option<f64>,
    pub min_purchases: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<DomainError> for ConfigError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidInput(message) => ConfigError::Validation(message),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            enrichment: EnrichmentConfig::default(),
            dataset: DatasetConfig { path: PathBuf::from("large_dataset") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(scoring) = patch.scoring {
            if let Some(value) = scoring.recency_half_life_days {
                self.scoring.recency_half_life_days = value;
            }
            if let Some(value) = scoring.trend_window_min_points {
                self.scoring.trend_window_min_points = value;
            }
            if let Some(value) = scoring.trend_slope_threshold_days {
                self.scoring.trend_slope_threshold_days = value;
            }
            if let Some(value) = scoring.count_saturation {
                self.scoring.count_saturation = value;
            }
            if let Some(value) = scoring.single_purchase_cap {
                self.scoring.single_purchase_cap = value;
            }
            if let Some(weights) = scoring.weights {
                if let Some(value) = weights.consistency {
                    self.scoring.weights.consistency = value;
                }
                if let Some(value) = weights.recency {
                    self.scoring.weights.recency = value;
                }
                if let Some(value) = weights.count {
                    self.scoring.weights.count = value;
                }
                if let Some(value) = weights.trend_stability {
                    self.scoring.weights.trend_stability = value;
                }
            }
        }

        if let Some(enrichment) = patch.enrichment {
            if let Some(value) = enrichment.min_confidence {
                self.enrichment.min_confidence = value;
            }
            if let Some(value) = enrichment.min_purchases {
                self.enrichment.min_purchases = value;
            }
            if let Some(value) = enrichment.cadence_tolerance_days {
                self.enrichment.cadence_tolerance_days = value;
            }
            if let Some(value) = enrichment.discount_rate {
                self.enrichment.discount_rate = value;
            }
            if let Some(value) = enrichment.max_recommendations {
                self.enrichment.max_recommendations = value;
            }
        }

        if let Some(dataset) = patch.dataset {
            if let Some(path) = dataset.path {
                self.dataset.path = path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PANTREE_SCORING_RECENCY_HALF_LIFE_DAYS") {
            self.scoring.recency_half_life_days =
                parse_env("PANTREE_SCORING_RECENCY_HALF_LIFE_DAYS", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_TREND_WINDOW_MIN_POINTS") {
            self.scoring.trend_window_min_points =
                parse_env("PANTREE_SCORING_TREND_WINDOW_MIN_POINTS", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_TREND_SLOPE_THRESHOLD_DAYS") {
            self.scoring.trend_slope_threshold_days =
                parse_env("PANTREE_SCORING_TREND_SLOPE_THRESHOLD_DAYS", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_COUNT_SATURATION") {
            self.scoring.count_saturation = parse_env("PANTREE_SCORING_COUNT_SATURATION", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_SINGLE_PURCHASE_CAP") {
            self.scoring.single_purchase_cap =
                parse_env("PANTREE_SCORING_SINGLE_PURCHASE_CAP", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_WEIGHT_CONSISTENCY") {
            self.scoring.weights.consistency =
                parse_env("PANTREE_SCORING_WEIGHT_CONSISTENCY", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_WEIGHT_RECENCY") {
            self.scoring.weights.recency = parse_env("PANTREE_SCORING_WEIGHT_RECENCY", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_WEIGHT_COUNT") {
            self.scoring.weights.count = parse_env("PANTREE_SCORING_WEIGHT_COUNT", &value)?;
        }
        if let Some(value) = read_env("PANTREE_SCORING_WEIGHT_TREND_STABILITY") {
            self.scoring.weights.trend_stability =
                parse_env("PANTREE_SCORING_WEIGHT_TREND_STABILITY", &value)?;
        }

        if let Some(value) = read_env("PANTREE_ENRICHMENT_MIN_CONFIDENCE") {
            self.enrichment.min_confidence =
                parse_env("PANTREE_ENRICHMENT_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("PANTREE_ENRICHMENT_MIN_PURCHASES") {
            self.enrichment.min_purchases = parse_env("PANTREE_ENRICHMENT_MIN_PURCHASES", &value)?;
        }
        if let Some(value) = read_env("PANTREE_ENRICHMENT_CADENCE_TOLERANCE_DAYS") {
            self.enrichment.cadence_tolerance_days =
                parse_env("PANTREE_ENRICHMENT_CADENCE_TOLERANCE_DAYS", &value)?;
        }
        if let Some(value) = read_env("PANTREE_ENRICHMENT_DISCOUNT_RATE") {
            self.enrichment.discount_rate =
                parse_env::<Decimal>("PANTREE_ENRICHMENT_DISCOUNT_RATE", &value)?;
        }
        if let Some(value) = read_env("PANTREE_ENRICHMENT_MAX_RECOMMENDATIONS") {
            self.enrichment.max_recommendations =
                parse_env("PANTREE_ENRICHMENT_MAX_RECOMMENDATIONS", &value)?;
        }

        if let Some(value) = read_env("PANTREE_DATASET_PATH") {
            self.dataset.path = PathBuf::from(value);
        }

        let log_level =
            read_env("PANTREE_LOGGING_LEVEL").or_else(|| read_env("PANTREE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PANTREE_LOGGING_FORMAT").or_else(|| read_env("PANTREE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset.path = dataset_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.enrichment.min_confidence = min_confidence;
        }
        if let Some(min_purchases) = overrides.min_purchases {
            self.enrichment.min_purchases = min_purchases;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.enrichment.validate()?;
        validate_dataset(&self.dataset)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_dataset(dataset: &DatasetConfig) -> Result<(), ConfigError> {
    if dataset.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("dataset.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    scoring: Option<ScoringPatch>,
    enrichment: Option<EnrichmentPatch>,
    dataset: Option<DatasetPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    recency_half_life_days: Option<f64>,
    trend_window_min_points: Option<usize>,
    trend_slope_threshold_days: Option<f64>,
    count_saturation: Option<u32>,
    single_purchase_cap: Option<f64>,
    weights: Option<WeightsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    consistency: Option<f64>,
    recency: Option<f64>,
    count: Option<f64>,
    trend_stability: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnrichmentPatch {
    min_confidence: Option<f64>,
    min_purchases: Option<usize>,
    cadence_tolerance_days: Option<f64>,
    discount_rate: Option<Decimal>,
    max_recommendations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DatasetPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_without_file_or_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.enrichment.min_confidence == 50.0, "default min_confidence is 50")?;
        ensure(config.enrichment.min_purchases == 3, "default min_purchases is 3")?;
        ensure(config.scoring.recency_half_life_days == 30.0, "default half-life is 30 days")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PANTREE_DATA_DIR", "/data/from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("pantree.toml");
            fs::write(
                &path,
                r#"
[dataset]
path = "${TEST_PANTREE_DATA_DIR}/batches"

[enrichment]
discount_rate = 0.1
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.dataset.path == PathBuf::from("/data/from-env/batches"),
                "dataset path should be interpolated from environment",
            )?;
            ensure(
                config.enrichment.discount_rate == Decimal::new(1, 1),
                "discount rate should be read from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PANTREE_DATA_DIR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PANTREE_LOG_LEVEL", "warn");
        env::set_var("PANTREE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PANTREE_LOG_LEVEL", "PANTREE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PANTREE_ENRICHMENT_MIN_CONFIDENCE", "65");
        env::set_var("PANTREE_SCORING_RECENCY_HALF_LIFE_DAYS", "45");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("pantree.toml");
            fs::write(
                &path,
                r#"
[scoring]
recency_half_life_days = 14.0

[enrichment]
min_confidence = 40.0
min_purchases = 5

[dataset]
path = "from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    dataset_path: Some(PathBuf::from("from-override")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.dataset.path == PathBuf::from("from-override"),
                "override dataset path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.enrichment.min_confidence == 65.0, "env should win over file")?;
            ensure(config.enrichment.min_purchases == 5, "file should win over defaults")?;
            ensure(
                config.scoring.recency_half_life_days == 45.0,
                "env half-life should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "PANTREE_ENRICHMENT_MIN_CONFIDENCE",
            "PANTREE_SCORING_RECENCY_HALF_LIFE_DAYS",
        ]);
        result
    }

    #[test]
    fn weights_that_do_not_sum_to_one_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PANTREE_SCORING_WEIGHT_CONSISTENCY", "0.9");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("scoring.weights")
            );
            ensure(has_message, "validation failure should mention scoring.weights")
        })();

        clear_vars(&["PANTREE_SCORING_WEIGHT_CONSISTENCY"]);
        result
    }

    #[test]
    fn malformed_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PANTREE_ENRICHMENT_MIN_PURCHASES", "three");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "PANTREE_ENRICHMENT_MIN_PURCHASES"
                ),
                "non-numeric min_purchases should be rejected",
            )
        })();

        clear_vars(&["PANTREE_ENRICHMENT_MIN_PURCHASES"]);
        result
    }

    #[test]
    fn out_of_range_override_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { min_confidence: Some(-5.0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(
                error,
                Some(ConfigError::Validation(ref message))
                    if message.contains("enrichment.min_confidence")
            ),
            "negative min_confidence should fail validation",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here/pantree.toml")),
            require_file: true,
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(error, Some(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
