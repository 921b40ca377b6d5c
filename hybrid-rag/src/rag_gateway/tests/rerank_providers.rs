use crate::rag_engine::types::RagError;
use crate::rag_gateway::rerank_providers::{
    RelevanceModel, RelevanceModelImpl, RerankProvider, get_relevance_model, scores_by_index,
};

#[tokio::test]
#[ignore] // Requires API key and network
async fn test_cohere_rerank_success() {
    let model = get_relevance_model(None, Some("cohere:rerank-english-v3.0"), None).unwrap();
    let scores = model
        .score_pairs("capital of France", &["Paris is in France", "Bread recipe"])
        .await
        .unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores[0] > scores[1]);
}

#[tokio::test]
async fn test_empty_documents_skip_the_request() {
    // unroutable URL: any request would fail
    let model = get_relevance_model(None, Some("local"), Some("http://127.0.0.1:1/rerank")).unwrap();
    assert!(model.score_pairs("q", &[]).await.unwrap().is_empty());
}

#[test]
fn test_parse_providers() {
    let (provider, model) =
        RelevanceModelImpl::parse_provider_and_model(Some("cohere:rerank-v3.5")).unwrap();
    assert_eq!(provider, RerankProvider::Cohere);
    assert_eq!(model, "rerank-v3.5");

    let (provider, _) = RelevanceModelImpl::parse_provider_and_model(Some("local")).unwrap();
    assert_eq!(provider, RerankProvider::Local);

    assert!(RelevanceModelImpl::parse_provider_and_model(Some("jina:reranker")).is_err());
    assert!(RelevanceModelImpl::parse_provider_and_model(Some("cohere:")).is_err());
    assert!(RelevanceModelImpl::parse_provider_and_model(None).is_err());
}

#[test]
fn test_local_default_url() {
    let model = get_relevance_model(None, Some("local"), None).unwrap();
    assert_eq!(model.url, RelevanceModelImpl::DEFAULT_LOCAL_URL);
}

#[test]
fn test_scores_by_index_restores_input_order() {
    let results: sonic_rs::Value = sonic_rs::from_str(
        r#"[{"index": 2, "relevance_score": 0.9}, {"index": 0, "relevance_score": 0.5}, {"index": 1, "relevance_score": 0.1}]"#,
    )
    .unwrap();

    let scores = scores_by_index(&results, "relevance_score", 3).unwrap();
    assert_eq!(scores, vec![0.5, 0.1, 0.9]);
}

#[test]
fn test_scores_by_index_missing_document() {
    let results: sonic_rs::Value = sonic_rs::from_str(r#"[{"index": 0, "score": 0.5}]"#).unwrap();
    assert!(matches!(
        scores_by_index(&results, "score", 2),
        Err(RagError::Reranker(_))
    ));
}

#[test]
fn test_scores_by_index_rejects_duplicates_and_out_of_range() {
    let duplicate: sonic_rs::Value =
        sonic_rs::from_str(r#"[{"index": 0, "score": 0.5}, {"index": 0, "score": 0.4}]"#).unwrap();
    assert!(scores_by_index(&duplicate, "score", 2).is_err());

    let out_of_range: sonic_rs::Value = sonic_rs::from_str(r#"[{"index": 5, "score": 0.5}]"#).unwrap();
    assert!(scores_by_index(&out_of_range, "score", 1).is_err());
}
