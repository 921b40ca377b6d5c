//! Hybrid fusion of a lexical and a vector candidate list.
//!
//! Each list is converted to per-document contributions independently,
//! contributions are summed per document id, and the merged list is ranked
//! by the summed score. Ties keep first-seen order: a document first
//! touched while walking list A precedes one first touched later, and list
//! A is walked before list B.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rag_engine::{
    fusion::score_normalizer::normalize,
    items::{Candidate, DocumentId, FusedCandidate},
    types::{RagError, RagResult},
};

/// How a single list's scores become fusion contributions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FusionMethod {
    /// Min-max normalize each list, then sum.
    #[default]
    MinMaxSum,
    /// Reciprocal Rank Fusion: each list contributes 1 / (k + rank), with
    /// rank starting at 1. Raw scores only matter through list order.
    ReciprocalRank { k: f64 },
}

impl FusionMethod {
    pub const DEFAULT_RRF_K: f64 = 60.0;

    /// Reciprocal rank fusion with a custom `k`.
    ///
    /// # Arguments
    /// * `k` - Smoothing constant. Higher values flatten the advantage of top ranks.
    pub fn reciprocal_rank(k: f64) -> RagResult<Self> {
        let method = FusionMethod::ReciprocalRank { k };
        method.validate()?;
        Ok(method)
    }

    pub fn validate(&self) -> RagResult<()> {
        match self {
            FusionMethod::MinMaxSum => Ok(()),
            FusionMethod::ReciprocalRank { k } if k.is_finite() && *k > 0.0 => Ok(()),
            FusionMethod::ReciprocalRank { k } => Err(RagError::InvalidParameter(format!(
                "reciprocal rank k must be positive and finite, got {k}"
            ))),
        }
    }

    fn contributions(&self, list: &[Candidate]) -> Vec<f64> {
        match self {
            FusionMethod::MinMaxSum => {
                let scores: Vec<f64> = list.iter().map(|c| c.score).collect();
                normalize(&scores)
            }
            FusionMethod::ReciprocalRank { k } => (0..list.len())
                .map(|rank| 1.0 / (k + rank as f64 + 1.0))
                .collect(),
        }
    }
}

/// Fuse two candidate lists by normalized-score summation and keep the top
/// `limit` documents.
pub fn fuse(
    list_a: &[Candidate],
    list_b: &[Candidate],
    limit: usize,
) -> RagResult<Vec<FusedCandidate>> {
    fuse_with(FusionMethod::MinMaxSum, list_a, list_b, limit)
}

/// Fuse two candidate lists with an explicit [`FusionMethod`].
///
/// A document present in only one list keeps that list's contribution
/// alone. Duplicate ids inside one list accumulate like cross-list
/// duplicates. The stored text is the last one seen for the document.
///
/// # Errors
/// `InvalidCandidate` when a candidate has an empty id or a non-finite
/// score, `InvalidParameter` for an invalid method.
pub fn fuse_with(
    method: FusionMethod,
    list_a: &[Candidate],
    list_b: &[Candidate],
    limit: usize,
) -> RagResult<Vec<FusedCandidate>> {
    method.validate()?;
    validate_candidates("A", list_a)?;
    validate_candidates("B", list_b)?;

    if limit == 0 {
        return Ok(Vec::new());
    }

    let contributions_a = method.contributions(list_a);
    let contributions_b = method.contributions(list_b);

    let mut fused: Vec<FusedCandidate> = Vec::with_capacity(list_a.len() + list_b.len());
    let mut slots: HashMap<&DocumentId, usize> = HashMap::with_capacity(fused.capacity());

    let contributions = list_a
        .iter()
        .zip(contributions_a)
        .chain(list_b.iter().zip(contributions_b));

    for (candidate, contribution) in contributions {
        match slots.get(&candidate.document_id) {
            Some(&slot) => {
                let entry = &mut fused[slot];
                entry.fused_score += contribution;
                entry.text.clone_from(&candidate.text);
            }
            None => {
                slots.insert(&candidate.document_id, fused.len());
                fused.push(FusedCandidate {
                    document_id: candidate.document_id.clone(),
                    text: candidate.text.clone(),
                    fused_score: contribution,
                });
            }
        }
    }

    // stable: equal scores stay in first-seen order
    fused.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));
    fused.truncate(limit);

    Ok(fused)
}

fn validate_candidates(list: &str, candidates: &[Candidate]) -> RagResult<()> {
    for (position, candidate) in candidates.iter().enumerate() {
        if candidate.document_id.is_empty() {
            return Err(RagError::InvalidCandidate(format!(
                "candidate at position {position} of list {list} has an empty document id"
            )));
        }
        if !candidate.score.is_finite() {
            return Err(RagError::InvalidCandidate(format!(
                "candidate `{}` in list {list} has non-finite score {}",
                candidate.document_id, candidate.score
            )));
        }
    }
    Ok(())
}
