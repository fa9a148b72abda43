//! Error handling for the resume ranker

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text extraction failed for '{}': {cause}", path.display())]
    Extraction { path: PathBuf, cause: String },

    #[error("No valid input: {0}")]
    NoValidInput(String),

    #[error("Model provisioning failed: {0}")]
    ModelProvision(String),

    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),

    #[error("Run interrupted: {0}")]
    Interrupted(String),
}

pub type Result<T> = std::result::Result<T, RankerError>;

/// Errors surfaced by the embedding backend are model provisioning failures
impl From<anyhow::Error> for RankerError {
    fn from(err: anyhow::Error) -> Self {
        // alternate form keeps the whole context chain
        RankerError::ModelProvision(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stage() {
        let err = RankerError::ModelProvision("connection reset".to_string());
        assert_eq!(err.to_string(), "Model provisioning failed: connection reset");

        let err = RankerError::Extraction {
            path: PathBuf::from("/tmp/cv.pdf"),
            cause: "broken xref table".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Text extraction failed for '/tmp/cv.pdf': broken xref table"
        );
    }

    #[test]
    fn test_backend_errors_become_provisioning_failures() {
        let backend = anyhow::anyhow!("missing tokenizer.json").context("Failed to load model");
        let err: RankerError = backend.into();

        assert!(matches!(err, RankerError::ModelProvision(_)));
        assert_eq!(
            err.to_string(),
            "Model provisioning failed: Failed to load model: missing tokenizer.json"
        );
    }
}
