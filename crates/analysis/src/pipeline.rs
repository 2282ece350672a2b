use std::path::PathBuf;
use std::sync::Arc;

use index::Embedder;
use ingest::{CorpusRole, SkippedFile, load_corpus};
use query::{MultiQueryRetriever, PromptInputs, RetrievalQueries, TextGenerator};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::generator::RiskAnalysisGenerator;
use crate::splitter::AnalysisResult;

/// What a successful run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub output_path: PathBuf,
    pub retrieved_documents: usize,
    pub skipped_files: Vec<SkippedFile>,
}

/// Load → index → retrieve → prompt → generate → split.
pub struct RiskAnalysisPipeline {
    config: AnalysisConfig,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
}

impl RiskAnalysisPipeline {
    pub fn new(
        config: AnalysisConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            embedder,
            generator,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run with the configured query.
    pub async fn run(&self) -> Result<AnalysisOutcome, AnalysisError> {
        self.analyze(&self.config.query).await
    }

    pub async fn analyze(&self, query: &str) -> Result<AnalysisOutcome, AnalysisError> {
        self.config.validate()?;
        let folders = &self.config.folders;
        info!(query, "Starting risk analysis");

        let (historical, mut skipped_files) =
            load_corpus(&folders.historical, CorpusRole::Historical).await;
        let (risks, skipped) = load_corpus(&folders.risks, CorpusRole::RiskTaxonomy).await;
        skipped_files.extend(skipped);
        let (target, skipped) = load_corpus(&folders.target, CorpusRole::Target).await;
        skipped_files.extend(skipped);

        // Every input check happens before the first embedding call.
        let historical_documents = historical.require_non_empty()?;
        risks.require_non_empty()?;
        target.require_non_empty()?;
        let inputs = PromptInputs::new(risks.primary_content()?, target.primary_content()?)?;

        let index = index::build_index(
            self.embedder.as_ref(),
            historical_documents,
            &self.config.index,
        )
        .await
        .map_err(AnalysisError::Embedding)?;

        let retriever = MultiQueryRetriever::new(
            &index,
            self.embedder.as_ref(),
            self.config.retrieval.clone(),
        );
        let retrieval = retriever
            .retrieve(RetrievalQueries {
                query,
                risks: inputs.risks(),
                target: inputs.target(),
            })
            .await
            .map_err(AnalysisError::Embedding)?;
        drop(index);

        if retrieval.is_empty() {
            warn!("No historical documents retrieved, using fallback context");
        } else {
            info!(documents = retrieval.len(), "Retrieved historical context");
        }

        let prompt = inputs.render(&retrieval.render());
        let generator = RiskAnalysisGenerator::new(
            self.generator.as_ref(),
            &self.config.generation,
            &self.config.output_dir,
        );
        let (raw, output_path) = generator.generate(&prompt).await?;

        let result = AnalysisResult::from_raw(raw);
        info!(
            mitigation_plan = result.has_mitigation_plan(),
            "Risk analysis complete"
        );

        Ok(AnalysisOutcome {
            result,
            output_path,
            retrieved_documents: retrieval.len(),
            skipped_files,
        })
    }
}
