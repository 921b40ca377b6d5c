//! First-stage retrieval collaborators.
//!
//! A lexical retriever ranks by term overlap; a vector retriever ranks by
//! embedding similarity. Both return at most `k` candidates ordered by
//! descending score, and scores are only comparable within one list.

pub mod bm25;
pub mod opensearch;
pub mod vector;

use std::{fs, path::Path};

use async_trait::async_trait;

use crate::rag_engine::{items::Candidate, types::RagResult};

#[async_trait]
pub trait LexicalRetriever: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> RagResult<Vec<Candidate>>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait VectorRetriever: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> RagResult<Vec<Candidate>>;

    fn name(&self) -> &str;
}

/// Read a corpus with one document per line. Blank lines are skipped and
/// do not consume an id; ids are the ordinal of the kept line.
pub fn load_documents(path: impl AsRef<Path>) -> RagResult<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_documents_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "first document").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "  second document  ").unwrap();

        let docs = load_documents(file.path()).unwrap();
        assert_eq!(docs, vec!["first document", "second document"]);
    }

    #[test]
    fn test_load_documents_missing_file() {
        let err = load_documents("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, crate::rag_engine::types::RagError::Io(_)));
    }
}
