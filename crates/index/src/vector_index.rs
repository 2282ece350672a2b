use anyhow::Result;
use ingest::DocumentUnit;

/// A document returned by a similarity search, with its L2 distance to the
/// query vector.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: DocumentUnit,
    pub distance: f32,
}

struct IndexEntry {
    document: DocumentUnit,
    vector: Vec<f32>,
}

/// Flat in-memory nearest-neighbour index over embedded documents.
///
/// Search is exact: every entry is compared against the query. Built once
/// per analysis and dropped with it.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
}

impl VectorIndex {
    pub fn from_embeddings(documents: Vec<DocumentUnit>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        anyhow::ensure!(!documents.is_empty(), "cannot build an index over zero documents");
        anyhow::ensure!(
            documents.len() == vectors.len(),
            "got {} vectors for {} documents",
            vectors.len(),
            documents.len()
        );

        let dimension = vectors[0].len();
        anyhow::ensure!(dimension > 0, "embedding vectors are empty");
        if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
            anyhow::bail!(
                "embedding {} has dimension {}, expected {}",
                position,
                vectors[position].len(),
                dimension
            );
        }

        let entries = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| IndexEntry { document, vector })
            .collect();

        Ok(Self { entries, dimension })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The `k` entries closest to `query`, nearest first. Entries at equal
    /// distance keep insertion order.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        anyhow::ensure!(
            query.len() == self.dimension,
            "query vector has dimension {}, index has {}",
            query.len(),
            self.dimension
        );

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, euclidean_distance(query, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, distance)| ScoredDocument {
                document: self.entries[i].document.clone(),
                distance,
            })
            .collect())
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
