use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvotraderError {
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EvotraderError {
    pub fn shape(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvotraderError>;
