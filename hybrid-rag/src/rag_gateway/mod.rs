pub(crate) mod api;
pub mod bootstrap;
pub mod embedding_providers;
pub mod gateway;
pub mod llm_providers;
pub mod rerank_providers;

#[cfg(test)]
pub mod tests;
