use std::env;
use std::fs;
use std::path::Path;

use pantree_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let scoring = &config.scoring;
    let weights = &scoring.weights;
    let enrichment = &config.enrichment;
    let fields: [(&str, String, &[&str]); 17] = [
        (
            "scoring.recency_half_life_days",
            scoring.recency_half_life_days.to_string(),
            &["PANTREE_SCORING_RECENCY_HALF_LIFE_DAYS"],
        ),
        (
            "scoring.trend_window_min_points",
            scoring.trend_window_min_points.to_string(),
            &["PANTREE_SCORING_TREND_WINDOW_MIN_POINTS"],
        ),
        (
            "scoring.trend_slope_threshold_days",
            scoring.trend_slope_threshold_days.to_string(),
            &["PANTREE_SCORING_TREND_SLOPE_THRESHOLD_DAYS"],
        ),
        (
            "scoring.count_saturation",
            scoring.count_saturation.to_string(),
            &["PANTREE_SCORING_COUNT_SATURATION"],
        ),
        (
            "scoring.single_purchase_cap",
            scoring.single_purchase_cap.to_string(),
            &["PANTREE_SCORING_SINGLE_PURCHASE_CAP"],
        ),
        (
            "scoring.weights.consistency",
            weights.consistency.to_string(),
            &["PANTREE_SCORING_WEIGHT_CONSISTENCY"],
        ),
        (
            "scoring.weights.recency",
            weights.recency.to_string(),
            &["PANTREE_SCORING_WEIGHT_RECENCY"],
        ),
        ("scoring.weights.count", weights.count.to_string(), &["PANTREE_SCORING_WEIGHT_COUNT"]),
        (
            "scoring.weights.trend_stability",
            weights.trend_stability.to_string(),
            &["PANTREE_SCORING_WEIGHT_TREND_STABILITY"],
        ),
        (
            "enrichment.min_confidence",
            enrichment.min_confidence.to_string(),
            &["PANTREE_ENRICHMENT_MIN_CONFIDENCE"],
        ),
        (
            "enrichment.min_purchases",
            enrichment.min_purchases.to_string(),
            &["PANTREE_ENRICHMENT_MIN_PURCHASES"],
        ),
        (
            "enrichment.cadence_tolerance_days",
            enrichment.cadence_tolerance_days.to_string(),
            &["PANTREE_ENRICHMENT_CADENCE_TOLERANCE_DAYS"],
        ),
        (
            "enrichment.discount_rate",
            enrichment.discount_rate.to_string(),
            &["PANTREE_ENRICHMENT_DISCOUNT_RATE"],
        ),
        (
            "enrichment.max_recommendations",
            enrichment.max_recommendations.to_string(),
            &["PANTREE_ENRICHMENT_MAX_RECOMMENDATIONS"],
        ),
        ("dataset.path", config.dataset.path.display().to_string(), &["PANTREE_DATASET_PATH"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["PANTREE_LOGGING_LEVEL", "PANTREE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["PANTREE_LOGGING_FORMAT", "PANTREE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in fields {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
