pub mod embeddings;
pub mod vector_index;

pub use embeddings::{Embedder, EmbeddingClient};
pub use vector_index::{ScoredDocument, VectorIndex};

use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt, stream};
use ingest::DocumentUnit;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Texts sent per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub concurrency: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            concurrency: 1,
        }
    }
}

/// Embed `documents` and build a searchable index over them.
pub async fn build_index(
    embedder: &dyn Embedder,
    documents: &[DocumentUnit],
    options: &IndexOptions,
) -> Result<VectorIndex> {
    anyhow::ensure!(!documents.is_empty(), "cannot build an index over zero documents");

    let texts: Vec<&str> = documents.iter().map(DocumentUnit::content).collect();
    let batch_size = options.batch_size.max(1);

    // Collect the requests before streaming them: a borrowing `map` closure
    // inside the stream makes this future non-`Send`.
    let requests: Vec<_> = texts
        .chunks(batch_size)
        .map(|batch| embedder.embed_batch(batch))
        .collect();

    // `buffered` yields batches in submission order, so vectors stay aligned
    // with `documents` whatever order the requests complete in.
    let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await
        .context("Failed to embed documents")?;

    let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
    let index = VectorIndex::from_embeddings(documents.to_vec(), vectors)?;

    info!(
        documents = index.len(),
        dimension = index.dimension(),
        "Built vector index"
    );
    Ok(index)
}
