//! Wires configured providers into a [`Pipeline`].

use std::{env, path::Path};

use tracing::info;

use crate::{
    rag_engine::{
        config::{LexicalConfig, RagConfig},
        generation::GroundedAnswerGenerator,
        pipeline::{Pipeline, PipelineBuilder},
        reranker::{CrossEncoderConfig, CrossEncoderReranker},
        retrieval::{bm25::Bm25Retriever, opensearch::OpenSearchRetriever, vector::EmbeddingVectorRetriever},
        types::{RagError, RagResult},
    },
    rag_gateway::{
        embedding_providers::EmbeddingModelImpl, llm_providers::LlmModelImpl,
        rerank_providers::RelevanceModelImpl,
    },
};

fn with_lexical(builder: PipelineBuilder, config: &LexicalConfig) -> RagResult<PipelineBuilder> {
    Ok(match config {
        LexicalConfig::Bm25 { corpus_path } => {
            builder.lexical(Bm25Retriever::from_corpus_file(Path::new(corpus_path))?)
        }
        LexicalConfig::OpenSearch {
            url,
            index,
            username,
        } => {
            let mut retriever = OpenSearchRetriever::new(url, index)?;
            if let Some(username) = username {
                let password = env::var("OPENSEARCH_PASSWORD").map_err(|_| {
                    RagError::InvalidConfiguration("OPENSEARCH_PASSWORD not set".to_string())
                })?;
                retriever = retriever.with_basic_auth(username.as_str(), password);
            }
            builder.lexical(retriever)
        }
    })
}

/// Construct every collaborator named in `config` and assemble the pipeline.
///
/// File-level checks belong to [`RagConfig::from_file`]; the pipeline
/// section is validated once, by [`PipelineBuilder::build`].
pub fn build_pipeline(config: &RagConfig) -> RagResult<Pipeline> {
    let builder = with_lexical(Pipeline::builder(config.pipeline.clone()), &config.lexical)?;

    let embedder = EmbeddingModelImpl::new(
        None,
        Some(&config.vector.embedding_model),
        config.vector.embedding_url.as_deref(),
    )?;
    let vector = EmbeddingVectorRetriever::from_jsonl(embedder, Path::new(&config.vector.documents_path))?;

    let mut cross_encoder = CrossEncoderConfig::new(config.reranker.model.as_str())
        .with_batch_size(config.reranker.batch_size);
    if let Some(max_length) = config.reranker.max_length {
        cross_encoder = cross_encoder.with_max_length(max_length);
    }
    let relevance_model =
        RelevanceModelImpl::new(None, Some(&config.reranker.model), config.reranker.url.as_deref())?;
    let reranker = CrossEncoderReranker::new(cross_encoder, relevance_model)?;

    let mut llm = LlmModelImpl::new(None, Some(&config.generator.model), config.generator.url.as_deref())?;
    if let Some(max_tokens) = config.generator.max_tokens {
        llm = llm.with_max_tokens(max_tokens);
    }
    if let Some(temperature) = config.generator.temperature {
        llm = llm.with_temperature(temperature);
    }

    let pipeline = builder
        .vector(vector)
        .reranker(reranker)
        .generator(GroundedAnswerGenerator::new(llm))
        .build()?;

    info!(
        retrieve_k = config.pipeline.retrieve_k,
        rerank_k = config.pipeline.rerank_k,
        embedding_model = %config.vector.embedding_model,
        reranker_model = %config.reranker.model,
        generator_model = %config.generator.model,
        "Pipeline assembled"
    );
    Ok(pipeline)
}
