//! Error types shared by every stage of the answer pipeline.

use std::{fmt, time::Duration};

use thiserror::Error;

/// The pipeline stage an error or timeout is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    Fusion,
    Rerank,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Retrieval => write!(f, "retrieval"),
            Stage::Fusion => write!(f, "fusion"),
            Stage::Rerank => write!(f, "rerank"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Lexical retrieval failed: {0}")]
    LexicalRetrieval(String),

    #[error("Vector retrieval failed: {0}")]
    VectorRetrieval(String),

    #[error("Reranker error: {0}")]
    Reranker(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Error while embedding text: {0}")]
    Embedding(String),

    #[error("Pipeline deadline of {timeout:?} exceeded during {stage}")]
    Timeout { stage: Stage, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl RagError {
    /// True when the error was raised by an external collaborator
    /// (retriever, reranker, generator or one of their model backends).
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            RagError::LexicalRetrieval(_)
                | RagError::VectorRetrieval(_)
                | RagError::Reranker(_)
                | RagError::Generation(_)
                | RagError::Embedding(_)
        )
    }

    /// True when the caller handed the core something it must reject.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            RagError::InvalidCandidate(_) | RagError::InvalidParameter(_)
        )
    }
}

impl From<sonic_rs::Error> for RagError {
    fn from(error: sonic_rs::Error) -> Self {
        RagError::Conversion(format!("sonic error: {error}"))
    }
}

impl From<toml::de::Error> for RagError {
    fn from(error: toml::de::Error) -> Self {
        RagError::InvalidConfiguration(error.to_string())
    }
}

pub type RagResult<T> = Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_stage() {
        let err = RagError::Timeout {
            stage: Stage::Rerank,
            timeout: Duration::from_millis(250),
        };
        let msg = err.to_string();
        assert!(msg.contains("rerank"));
        assert!(msg.contains("250ms"));
    }

    #[test]
    fn test_collaborator_failure_classification() {
        assert!(RagError::LexicalRetrieval("down".into()).is_collaborator_failure());
        assert!(RagError::VectorRetrieval("down".into()).is_collaborator_failure());
        assert!(RagError::Reranker("down".into()).is_collaborator_failure());
        assert!(RagError::Generation("down".into()).is_collaborator_failure());
        assert!(RagError::Embedding("down".into()).is_collaborator_failure());
        assert!(!RagError::InvalidCandidate("nan".into()).is_collaborator_failure());
        assert!(!RagError::Conversion("bad".into()).is_collaborator_failure());
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(RagError::InvalidCandidate("nan".into()).is_contract_violation());
        assert!(RagError::InvalidParameter("k".into()).is_contract_violation());
        assert!(!RagError::Generation("down".into()).is_contract_violation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing corpus");
        let err = RagError::from(io);
        assert!(matches!(err, RagError::Io(_)));
        assert!(err.to_string().contains("missing corpus"));
    }

    #[test]
    fn test_toml_error_is_configuration_error() {
        let parsed: Result<toml::Value, _> = toml::from_str("retrieve_k = = 3");
        let err = RagError::from(parsed.unwrap_err());
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }
}
