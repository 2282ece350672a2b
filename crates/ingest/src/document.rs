use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One text-bearing unit produced by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUnit {
    content: String,
    source_path: String,
    metadata: BTreeMap<String, String>,
}

impl DocumentUnit {
    pub fn new(content: String, source_path: String, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content,
            source_path,
            metadata,
        }
    }

    /// Build a unit for block `block_index` of a file, stamping the
    /// `element_id` metadata entry.
    pub fn from_block(
        content: String,
        source_path: &str,
        block_index: Option<usize>,
        mut metadata: BTreeMap<String, String>,
    ) -> Self {
        let element_id = Self::generate_element_id(source_path, block_index, &content);
        metadata.insert("element_id".to_string(), element_id);
        if let Some(index) = block_index {
            metadata.insert("block_index".to_string(), index.to_string());
        }

        Self::new(content, source_path.to_string(), metadata)
    }

    fn generate_element_id(source_path: &str, block_index: Option<usize>, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_path.as_bytes());
        if let Some(index) = block_index {
            hasher.update(index.to_string().as_bytes());
        }
        hasher.update(content.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // First 16 bytes (32 hex chars)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// True when the content is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
