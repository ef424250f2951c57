use std::path::PathBuf;
use thiserror::Error;

use crate::data::store::StoreError;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("unable to load session signing keys from '{0}'")]
    MissingKeys(PathBuf),
    #[error("session signing keys are invalid: {0}")]
    InvalidKeys(#[from] jsonwebtoken::errors::Error),
    #[cfg(feature = "generate-security")]
    #[error("unable to generate session signing keys: {0}")]
    Generation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Security(#[from] SecurityError),
    #[error(transparent)]
    Store(#[from] StoreError),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Cors(#[from] rocket_cors::Error),
}

/// Client supplied values that can't be accepted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("'{field}' must be a non-negative number of hours, got {value}")]
    Hours { field: &'static str, value: f64 },
    #[error("'isActive' must be either \"true\" or \"false\", got '{0}'")]
    IsActive(String),
}
