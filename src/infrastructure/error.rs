use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline error taxonomy
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    #[error("network error: {message}")]
    Network {
        message: String,
        url: Option<String>,
    },

    #[error("parse error: {message}")]
    Parsing { message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("worker error: {message}")]
    Worker { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl PipelineError {
    pub fn network(message: impl Into<String>, url: Option<String>) -> Self {
        PipelineError::Network {
            message: message.into(),
            url,
        }
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        PipelineError::Parsing {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation {
            message: message.into(),
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        PipelineError::Worker {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        PipelineError::Network {
            message: error.to_string(),
            url: error.url().map(|u| u.to_string()),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Parsing {
            message: error.to_string(),
        }
    }
}
