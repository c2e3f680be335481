use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
