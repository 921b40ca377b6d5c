pub mod grounded;

use async_trait::async_trait;

use crate::rag_engine::{
    items::{Candidate, PipelineResult},
    types::RagResult,
};

pub use grounded::GroundedAnswerGenerator;

/// Produces an answer with one citation per evidence document.
///
/// Given no documents, implementations answer with an insufficient
/// evidence message and cite nothing. Otherwise `sources[i]` describes
/// `documents[i]`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, documents: &[Candidate]) -> RagResult<PipelineResult>;
}
