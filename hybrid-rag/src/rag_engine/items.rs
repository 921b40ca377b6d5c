//! Value records passed between pipeline stages.
//!
//! Every stage owns the list it produces until it hands it to the next
//! stage. Records are plain values; nothing here is shared or mutated in
//! place after being handed forward.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical document identifier used as the join key across retrieval
/// strategies.
///
/// Identifiers are always strings. Integer identifiers, such as positions
/// in a vector index, are canonicalised as their base-10 rendering so that
/// position `7` and lexical id `"7"` refer to the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId(id.to_string())
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        DocumentId(id.to_string())
    }
}

impl From<usize> for DocumentId {
    fn from(id: usize) -> Self {
        DocumentId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(id) => DocumentId(id),
            Repr::Integer(id) => DocumentId::from(id),
        })
    }
}

/// A retrieval result. `score` is only meaningful relative to other
/// candidates produced by the same strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub document_id: DocumentId,
    pub text: String,
    pub score: f64,
}

impl Candidate {
    pub fn new(document_id: impl Into<DocumentId>, text: impl Into<String>, score: f64) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
            score,
        }
    }
}

/// A document after fusion. `fused_score` is the sum of the per-strategy
/// contributions the document received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub document_id: DocumentId,
    pub text: String,
    pub fused_score: f64,
}

impl From<FusedCandidate> for Candidate {
    fn from(fused: FusedCandidate) -> Self {
        Candidate {
            document_id: fused.document_id,
            text: fused.text,
            score: fused.fused_score,
        }
    }
}

/// Evidence cited by a generated answer, aligned with the document passed
/// to the generator at the same position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub source_id: DocumentId,
    pub snippet: String,
    #[serde(rename = "score")]
    pub relevance_score: f64,
}

/// The result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}
