use crate::rag_gateway::llm_providers::{
    LanguageModel, LlmModelImpl, LlmProvider, completion_text, get_language_model,
};

#[tokio::test]
#[ignore] // Requires API key and network
async fn test_openai_completion_success() {
    let model = get_language_model(None, Some("openai:gpt-4o-mini"), None).unwrap();
    let answer = model.complete("Say hello.").await.unwrap();
    assert!(!answer.is_empty());
}

#[test]
fn test_local_defaults() {
    let model = get_language_model(None, Some("local"), None).unwrap();
    assert_eq!(model.provider, LlmProvider::Local);
    assert_eq!(model.url, LlmModelImpl::DEFAULT_LOCAL_URL);
    assert_eq!(model.max_tokens, 512);
    assert_eq!(model.temperature, 0.0);
}

#[test]
fn test_local_with_model_name() {
    let model = get_language_model(None, Some("local:llama3"), Some("http://127.0.0.1:11434/v1/chat/completions"))
        .unwrap()
        .with_max_tokens(128)
        .with_temperature(0.2);
    assert_eq!(model.model, "llama3");
    assert_eq!(model.max_tokens, 128);
    assert_eq!(model.temperature, 0.2);
}

#[test]
fn test_local_invalid_url() {
    assert!(get_language_model(None, Some("local"), Some("not a url")).is_err());
}

#[test]
fn test_parse_openai() {
    let (provider, model) = LlmModelImpl::parse_provider_and_model(Some("openai:gpt-4o")).unwrap();
    assert_eq!(provider, LlmProvider::OpenAI);
    assert_eq!(model, "gpt-4o");
}

#[test]
fn test_parse_rejects_bare_and_unknown() {
    assert!(LlmModelImpl::parse_provider_and_model(Some("gpt-4o")).is_err());
    assert!(LlmModelImpl::parse_provider_and_model(Some("anthropic:model")).is_err());
    assert!(LlmModelImpl::parse_provider_and_model(Some("openai:")).is_err());
    assert!(LlmModelImpl::parse_provider_and_model(None).is_err());
}

#[test]
fn test_completion_text() {
    let response: sonic_rs::Value = sonic_rs::from_str(
        r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "  Paris [Source 0]\n"}}]}"#,
    )
    .unwrap();
    assert_eq!(completion_text(&response).unwrap(), "Paris [Source 0]");
}

#[test]
fn test_completion_text_missing_choice() {
    let response: sonic_rs::Value = sonic_rs::from_str(r#"{"choices": []}"#).unwrap();
    assert!(completion_text(&response).is_err());
}
