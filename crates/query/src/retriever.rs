use std::collections::HashSet;

use anyhow::{Context, Result};
use index::{Embedder, VectorIndex};
use ingest::DocumentUnit;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Neighbours taken per query string.
    pub top_k: usize,
    /// Drop neighbours farther than this L2 distance.
    pub max_distance: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_distance: None,
        }
    }
}

/// The three strings the historical corpus is searched with.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalQueries<'a> {
    pub query: &'a str,
    pub risks: &'a str,
    pub target: &'a str,
}

/// Retrieved context as it enters the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievedContext {
    Found(String),
    Empty,
}

/// Deduplicated documents, in first-seen order across the query lists.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    documents: Vec<DocumentUnit>,
}

impl RetrievalResult {
    /// Union of `lists` in order, keeping the first document for each
    /// distinct content string.
    pub fn merge<I>(lists: I) -> Self
    where
        I: IntoIterator<Item = Vec<DocumentUnit>>,
    {
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for document in lists.into_iter().flatten() {
            if seen.insert(document.content().to_string()) {
                documents.push(document);
            }
        }

        Self { documents }
    }

    pub fn documents(&self) -> &[DocumentUnit] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Numbered "Document N: ..." entries separated by blank lines.
    pub fn render(&self) -> RetrievedContext {
        if self.documents.is_empty() {
            return RetrievedContext::Empty;
        }

        let entries: Vec<String> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("Document {}: {}", i + 1, doc.content()))
            .collect();
        RetrievedContext::Found(entries.join("\n\n"))
    }
}

pub struct MultiQueryRetriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
    config: RetrievalConfig,
}

impl<'a> MultiQueryRetriever<'a> {
    pub fn new(
        index: &'a VectorIndex,
        embedder: &'a dyn Embedder,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    pub async fn retrieve(&self, queries: RetrievalQueries<'_>) -> Result<RetrievalResult> {
        let by_query = self.search("query", queries.query).await?;
        let by_risks = self.search("risks", queries.risks).await?;
        let by_target = self.search("target", queries.target).await?;

        let result = RetrievalResult::merge([by_query, by_target, by_risks]);
        debug!(unique = result.len(), "Merged retrieval results");
        Ok(result)
    }

    async fn search(&self, label: &str, text: &str) -> Result<Vec<DocumentUnit>> {
        let embedding = self
            .embedder
            .embed(text)
            .await
            .with_context(|| format!("Failed to embed {} text", label))?;

        let hits = self.index.search_by_vector(&embedding, self.config.top_k)?;
        let documents: Vec<DocumentUnit> = hits
            .into_iter()
            .filter(|hit| {
                self.config
                    .max_distance
                    .is_none_or(|max| hit.distance <= max)
            })
            .map(|hit| hit.document)
            .collect();

        debug!(query = label, hits = documents.len(), "Similarity search");
        Ok(documents)
    }
}
