use std::fmt;
use std::path::{Path, PathBuf};

use index::IndexOptions;
use query::RetrievalConfig;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::generator::GenerationSettings;

pub const DEFAULT_QUERY: &str = "What are the risks associated with this procurement document?";

/// The three input folders of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFolders {
    pub historical: PathBuf,
    pub risks: PathBuf,
    pub target: PathBuf,
}

impl InputFolders {
    /// The conventional folder names under a workspace directory.
    pub fn under(workspace: &Path) -> Self {
        Self {
            historical: workspace.join("historical_documents"),
            risks: workspace.join("risks_document"),
            target: workspace.join("target_document"),
        }
    }
}

/// Everything one analysis run needs, built once by the caller.
#[derive(Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub query: String,
    pub folders: InputFolders,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub index: IndexOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_workspace(Path::new("."), String::new())
    }
}

impl AnalysisConfig {
    /// Default settings with the standard folder layout under `workspace`.
    pub fn for_workspace(workspace: &Path, api_key: String) -> Self {
        Self {
            api_key,
            query: DEFAULT_QUERY.to_string(),
            folders: InputFolders::under(workspace),
            output_dir: workspace.join("outputs"),
            retrieval: RetrievalConfig::default(),
            generation: GenerationSettings::default(),
            index: IndexOptions::default(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Checks that must pass before any loading or service call.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }
        Ok(())
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("AnalysisConfig")
            .field("api_key", &api_key)
            .field("query", &self.query)
            .field("folders", &self.folders)
            .field("output_dir", &self.output_dir)
            .field("retrieval", &self.retrieval)
            .field("generation", &self.generation)
            .field("index", &self.index)
            .finish()
    }
}
