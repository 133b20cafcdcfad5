pub mod app_config;
pub mod config;
pub mod eateries;

pub use app_config::{AppConfig, Environment, PageRounding};
pub use config::{load_app_config, load_app_config_from_env};
pub use eateries::NormalizedEatery;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
