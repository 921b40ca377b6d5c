pub mod gateway_tests;
pub mod llm_providers;
pub mod rerank_providers;
