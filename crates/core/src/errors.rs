use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::DatasetError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApplicationError {
    /// Stable machine-readable class used in command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidInput(_)) => "invalid_input",
            Self::Dataset(_) => "dataset",
            Self::Config(_) => "config_validation",
            Self::Serialization(_) => "serialization",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Dataset(_) => 3,
            Self::Domain(_) => 4,
            Self::Serialization(_) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The request could not be processed. Check inputs and try again.",
            Self::Dataset(_) => "The purchase dataset could not be read.",
            Self::Config(_) => "Configuration is invalid. Fix the reported value and retry.",
            Self::Serialization(_) => "The analysis report could not be rendered.",
        }
    }
}
