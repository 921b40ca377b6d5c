use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use itertools::Itertools;
use tracing::debug;

use crate::rag_engine::{
    items::{Candidate, DocumentId},
    retrieval::{LexicalRetriever, load_documents},
    types::RagResult,
};

struct IndexedDocument {
    id: DocumentId,
    text: String,
    term_frequencies: HashMap<String, u32>,
    length: usize,
}

/// In-memory Okapi BM25 over a fixed document set.
pub struct Bm25Retriever {
    documents: Vec<IndexedDocument>,
    document_frequencies: HashMap<String, u32>,
    average_length: f64,
    k1: f64,
    b: f64,
}

impl Bm25Retriever {
    pub const DEFAULT_K1: f64 = 1.2;
    pub const DEFAULT_B: f64 = 0.75;

    pub fn new<I, D, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (D, T)>,
        D: Into<DocumentId>,
        T: Into<String>,
    {
        let mut document_frequencies: HashMap<String, u32> = HashMap::new();
        let documents: Vec<IndexedDocument> = documents
            .into_iter()
            .map(|(id, text)| {
                let text = text.into();
                let tokens = Self::tokenize::<true>(&text);
                let length = tokens.len();

                let mut term_frequencies: HashMap<String, u32> = HashMap::new();
                for token in tokens {
                    *term_frequencies.entry(token).or_insert(0) += 1;
                }
                for term in term_frequencies.keys() {
                    *document_frequencies.entry(term.clone()).or_insert(0) += 1;
                }

                IndexedDocument {
                    id: id.into(),
                    text,
                    term_frequencies,
                    length,
                }
            })
            .collect();

        let total_length: usize = documents.iter().map(|d| d.length).sum();
        let average_length = if documents.is_empty() {
            0.0
        } else {
            total_length as f64 / documents.len() as f64
        };

        Self {
            documents,
            document_frequencies,
            average_length,
            k1: Self::DEFAULT_K1,
            b: Self::DEFAULT_B,
        }
    }

    /// Index a list of texts, using each text's position as its id.
    pub fn from_texts(texts: Vec<String>) -> Self {
        Self::new(texts.into_iter().enumerate())
    }

    /// Index a one-document-per-line corpus file.
    pub fn from_corpus_file(path: impl AsRef<Path>) -> RagResult<Self> {
        let retriever = Self::from_texts(load_documents(path)?);
        debug!(documents = retriever.len(), "Loaded BM25 corpus");
        Ok(retriever)
    }

    pub fn with_parameters(mut self, k1: f64, b: f64) -> Self {
        self.k1 = k1;
        self.b = b;
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Lowercase and split on anything that isn't alphanumeric.
    /// With `SHOULD_FILTER`, tokens of two characters or fewer are dropped.
    pub fn tokenize<const SHOULD_FILTER: bool>(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .filter(|s| !SHOULD_FILTER || s.chars().count() > 2)
            .map(String::from)
            .collect()
    }

    pub fn calculate_bm25_score(
        &self,
        term_frequency: u32,
        doc_length: usize,
        document_frequency: u32,
        total_docs: usize,
        average_length: f64,
    ) -> f64 {
        let n = total_docs as f64;
        let df = document_frequency as f64;
        let tf = term_frequency as f64;

        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        let average_length = if average_length > 0.0 { average_length } else { 1.0 };
        let length_norm = 1.0 - self.b + self.b * (doc_length as f64 / average_length);

        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * length_norm)
    }

    fn score(&self, document: &IndexedDocument, terms: &[String]) -> f64 {
        terms
            .iter()
            .filter_map(|term| {
                let tf = *document.term_frequencies.get(term)?;
                let df = *self.document_frequencies.get(term)?;
                Some(self.calculate_bm25_score(
                    tf,
                    document.length,
                    df,
                    self.documents.len(),
                    self.average_length,
                ))
            })
            .sum()
    }
}

#[async_trait]
impl LexicalRetriever for Bm25Retriever {
    async fn search(&self, query: &str, k: usize) -> RagResult<Vec<Candidate>> {
        let terms: Vec<String> = Self::tokenize::<true>(query).into_iter().unique().collect();
        if terms.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        Ok(self
            .documents
            .iter()
            .map(|document| (document, self.score(document, &terms)))
            .filter(|(_, score)| *score > 0.0)
            // sorted_by is stable, so ties keep corpus order
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
            .take(k)
            .map(|(document, score)| Candidate {
                document_id: document.id.clone(),
                text: document.text.clone(),
                score,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "bm25"
    }
}
