//! Error types for Tether

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TetherError>;

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Action not found: {0}")]
    NotFound(String),

    #[error("Action already has a handler: {0}")]
    AlreadyRegistered(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}
