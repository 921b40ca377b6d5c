use async_trait::async_trait;
use tracing::{debug, trace};

use crate::{
    rag_engine::{
        generation::Generator,
        items::{Candidate, PipelineResult, SourceCitation},
        types::{RagError, RagResult},
    },
    rag_gateway::llm_providers::LanguageModel,
};

pub const INSUFFICIENT_EVIDENCE_ANSWER: &str =
    "I could not find sufficient evidence to answer this question.";

pub const SNIPPET_MAX_CHARS: usize = 300;

/// Answers strictly from the supplied documents through a language model.
pub struct GroundedAnswerGenerator<L: LanguageModel> {
    llm: L,
}

impl<L: LanguageModel> GroundedAnswerGenerator<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }
}

/// Source numbers in the prompt are the document positions, matching the
/// citation order.
pub fn build_prompt(question: &str, documents: &[Candidate]) -> String {
    let context = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Source {i}] {}", doc.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a question answering system.\n\
         Answer the question using ONLY the information in the sources below.\n\
         If the answer is not present, say you do not know.\n\
         \n\
         Sources:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer (include source numbers):\n"
    )
}

/// First `SNIPPET_MAX_CHARS` characters of `text`.
pub fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_MAX_CHARS).collect()
}

#[async_trait]
impl<L: LanguageModel> Generator for GroundedAnswerGenerator<L> {
    async fn generate(&self, question: &str, documents: &[Candidate]) -> RagResult<PipelineResult> {
        if documents.is_empty() {
            debug!("No evidence documents, skipping language model");
            return Ok(PipelineResult {
                answer: INSUFFICIENT_EVIDENCE_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let prompt = build_prompt(question, documents);
        trace!(prompt_chars = prompt.len(), "Built grounded prompt");

        let answer = self.llm.complete(&prompt).await.map_err(|e| match e {
            RagError::Generation(_) => e,
            other => RagError::Generation(other.to_string()),
        })?;

        let sources = documents
            .iter()
            .map(|doc| SourceCitation {
                source_id: doc.document_id.clone(),
                snippet: snippet(&doc.text),
                relevance_score: doc.score,
            })
            .collect();

        Ok(PipelineResult { answer, sources })
    }
}
