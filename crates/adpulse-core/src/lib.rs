use thiserror::Error;

mod app_config;
mod config;
pub mod normalize;
mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{normalize_metric, parse_metric_date, ValidationError};
pub use types::{
    ActionType, AnalysisThresholds, CanonicalMetric, InsightType, Priority, RunStatus, Severity,
    COMPARED_METRICS, METRIC_NEW_CAMPAIGN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
