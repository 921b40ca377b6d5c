use axum::response::IntoResponse;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::rag_engine::items::{PipelineResult, SourceCitation};

/// Body returned by `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

impl From<PipelineResult> for QueryResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            answer: result.answer,
            sources: result.sources,
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub retrieve_k: usize,
    pub rerank_k: usize,
}

fn json_response<T: Serialize>(value: &T) -> axum::response::Response {
    match sonic_rs::to_vec(value) {
        Ok(body) => axum::response::Response::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

impl IntoResponse for QueryResponse {
    fn into_response(self) -> axum::response::Response {
        json_response(&self)
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> axum::response::Response {
        json_response(&self)
    }
}
