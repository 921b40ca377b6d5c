use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value};
use tower::ServiceExt;

use crate::{
    rag_engine::{
        generation::GroundedAnswerGenerator,
        items::Candidate,
        pipeline::{Pipeline, PipelineConfig},
        reranker::Reranker,
        retrieval::{VectorRetriever, bm25::Bm25Retriever},
        types::{RagError, RagResult},
    },
    rag_gateway::{gateway::router, llm_providers::LanguageModel},
};

struct NoVectors;

#[async_trait]
impl VectorRetriever for NoVectors {
    async fn search(&self, _query: &str, _k: usize) -> RagResult<Vec<Candidate>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

struct BrokenVectors;

#[async_trait]
impl VectorRetriever for BrokenVectors {
    async fn search(&self, _query: &str, _k: usize) -> RagResult<Vec<Candidate>> {
        Err(RagError::VectorRetrieval("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

struct NanVectors;

#[async_trait]
impl VectorRetriever for NanVectors {
    async fn search(&self, _query: &str, _k: usize) -> RagResult<Vec<Candidate>> {
        Ok(vec![Candidate::new("nan-1", "degenerate embedding", f64::NAN)])
    }

    fn name(&self) -> &str {
        "nan"
    }
}

struct KeepOrder;

#[async_trait]
impl Reranker for KeepOrder {
    async fn rerank(
        &self,
        _query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> RagResult<Vec<Candidate>> {
        Ok(candidates.into_iter().take(top_k).collect())
    }

    fn name(&self) -> &str {
        "keep-order"
    }
}

struct CannedModel;

#[async_trait]
impl LanguageModel for CannedModel {
    async fn complete(&self, _prompt: &str) -> RagResult<String> {
        Ok("Rust prevents data races through borrowing [Source 0]".to_string())
    }
}

fn corpus() -> Bm25Retriever {
    Bm25Retriever::new([
        ("rust-1", "Rust borrowing rules prevent data races"),
        ("bread-1", "Sourdough bread needs a starter"),
    ])
}

fn app() -> axum::Router {
    let pipeline = Pipeline::builder(PipelineConfig::new(20, 5))
        .lexical(corpus())
        .vector(NoVectors)
        .reranker(KeepOrder)
        .generator(GroundedAnswerGenerator::new(CannedModel))
        .build()
        .unwrap();
    router(Arc::new(pipeline))
}

fn query(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    sonic_rs::from_slice(&bytes).unwrap()
}

// ============================================================================
// POST /query
// ============================================================================

#[tokio::test]
async fn test_query_returns_answer_and_sources() {
    let response = app()
        .oneshot(query(r#"{"question": "How does Rust prevent data races?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json["answer"].as_str(),
        Some("Rust prevents data races through borrowing [Source 0]")
    );
    assert_eq!(json["sources"].as_array().unwrap().len(), 1);
    assert_eq!(json["sources"][0]["source_id"].as_str(), Some("rust-1"));
    assert_eq!(
        json["sources"][0]["snippet"].as_str(),
        Some("Rust borrowing rules prevent data races")
    );
    assert_eq!(json["sources"][0]["score"].as_f64(), Some(1.0));
}

#[tokio::test]
async fn test_query_without_evidence() {
    let response = app()
        .oneshot(query(r#"{"question": "quantum chromodynamics"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json["answer"].as_str(),
        Some("I could not find sufficient evidence to answer this question.")
    );
    assert!(json["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_question_is_bad_request() {
    let response = app().oneshot(query(r#"{"question": "  "}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let response = app().oneshot(query("{\"question\":")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_collaborator_failure_is_bad_gateway() {
    let pipeline = Pipeline::builder(PipelineConfig::default())
        .lexical(corpus())
        .vector(BrokenVectors)
        .reranker(KeepOrder)
        .generator(GroundedAnswerGenerator::new(CannedModel))
        .build()
        .unwrap();

    let response = router(Arc::new(pipeline))
        .oneshot(query(r#"{"question": "rust"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_invalid_candidate_is_bad_gateway() {
    let pipeline = Pipeline::builder(PipelineConfig::default())
        .lexical(corpus())
        .vector(NanVectors)
        .reranker(KeepOrder)
        .generator(GroundedAnswerGenerator::new(CannedModel))
        .build()
        .unwrap();

    let response = router(Arc::new(pipeline))
        .oneshot(query(r#"{"question": "rust"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"].as_str(), Some("ok"));
    assert_eq!(json["retrieve_k"].as_u64(), Some(20));
    assert_eq!(json["rerank_k"].as_u64(), Some(5));
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
