use axum::{body::Bytes, extract::FromRequest};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::protocol::QueryError;

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

impl QueryRequest {
    /// Decode and check a request body. The question must contain
    /// something other than whitespace.
    pub fn from_body(body: &[u8]) -> Result<Self, QueryError> {
        let request: QueryRequest = sonic_rs::from_slice(body)
            .map_err(|e| QueryError::BadRequest(format!("Invalid request body: {e}")))?;

        if request.question.trim().is_empty() {
            return Err(QueryError::BadRequest(
                "question must not be empty".to_string(),
            ));
        }
        Ok(request)
    }
}

impl<S> FromRequest<S> for QueryRequest
where
    S: Send + Sync,
{
    type Rejection = QueryError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match Bytes::from_request(req, state).await {
            Ok(b) => b,
            Err(e) => {
                error!(?e, "Error getting bytes");
                return Err(QueryError::BadRequest(e.body_text()));
            }
        };
        QueryRequest::from_body(&body)
    }
}
