use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::header::CONTENT_TYPE;
use sonic_rs::json;
use thiserror::Error;

use crate::rag_engine::types::RagError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Pipeline(#[from] RagError),
}

impl QueryError {
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::Pipeline(RagError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            QueryError::Pipeline(RagError::InvalidCandidate(_)) => StatusCode::BAD_GATEWAY,
            QueryError::Pipeline(e) if e.is_contract_violation() => StatusCode::BAD_REQUEST,
            QueryError::Pipeline(e) if e.is_collaborator_failure() => StatusCode::BAD_GATEWAY,
            QueryError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = sonic_rs::to_string(&json!({ "error": self.to_string() }))
            .unwrap_or_else(|_| self.to_string());

        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| status.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag_engine::types::Stage;
    use std::time::Duration;

    // ============================================================================
    // QueryError Variant Tests
    // ============================================================================

    #[test]
    fn test_bad_request_message() {
        let error = QueryError::BadRequest("question must not be empty".to_string());
        assert_eq!(error.to_string(), "question must not be empty");
    }

    #[test]
    fn test_from_rag_error() {
        let error = QueryError::from(RagError::Reranker("model offline".to_string()));
        assert!(matches!(error, QueryError::Pipeline(RagError::Reranker(_))));
        assert!(error.to_string().contains("model offline"));
    }

    // ============================================================================
    // IntoResponse Tests (HTTP Status Codes)
    // ============================================================================

    #[test]
    fn test_bad_request_status() {
        let response = QueryError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), 400);
    }

    #[test]
    fn test_invalid_parameter_status() {
        let error = QueryError::from(RagError::InvalidParameter("rerank_k must be greater than 0".to_string()));
        assert_eq!(error.into_response().status(), 400);
    }

    #[test]
    fn test_invalid_candidate_status() {
        let error = QueryError::from(RagError::InvalidCandidate("NaN score".to_string()));
        assert_eq!(error.into_response().status(), 502);
    }

    #[test]
    fn test_timeout_status() {
        let error = QueryError::from(RagError::Timeout {
            stage: Stage::Generation,
            timeout: Duration::from_secs(2),
        });
        assert_eq!(error.into_response().status(), 504);
    }

    #[test]
    fn test_collaborator_failure_status() {
        for err in [
            RagError::LexicalRetrieval("down".to_string()),
            RagError::VectorRetrieval("down".to_string()),
            RagError::Reranker("down".to_string()),
            RagError::Generation("down".to_string()),
            RagError::Embedding("down".to_string()),
        ] {
            assert_eq!(QueryError::from(err).into_response().status(), 502);
        }
    }

    #[test]
    fn test_internal_error_status() {
        let error = QueryError::from(RagError::Conversion("bad json".to_string()));
        assert_eq!(error.into_response().status(), 500);
    }

    #[test]
    fn test_error_response_is_json() {
        let response = QueryError::BadRequest("nope".to_string()).into_response();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
