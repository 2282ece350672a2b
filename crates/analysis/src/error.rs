use ingest::{CorpusError, CorpusRole};
use query::PromptError;

/// Why an analysis run stopped.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("could not load any content from the {0}")]
    EmptyCorpus(CorpusRole),
    #[error("the {0} has no text content")]
    EmptyContent(CorpusRole),
    #[error("embedding failed: {0:#}")]
    Embedding(#[source] anyhow::Error),
    #[error("generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
    #[error("failed to write analysis output: {0}")]
    Output(#[source] std::io::Error),
}

impl AnalysisError {
    /// Stable identifier for the failure, one per input and failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MissingApiKey => "missing_api_key",
            AnalysisError::EmptyCorpus(CorpusRole::Historical) => "historical_documents_empty",
            AnalysisError::EmptyCorpus(CorpusRole::RiskTaxonomy) => "risks_document_empty",
            AnalysisError::EmptyCorpus(CorpusRole::Target) => "target_document_empty",
            AnalysisError::EmptyContent(CorpusRole::Historical) => "historical_documents_blank",
            AnalysisError::EmptyContent(CorpusRole::RiskTaxonomy) => "risks_document_blank",
            AnalysisError::EmptyContent(CorpusRole::Target) => "target_document_blank",
            AnalysisError::Embedding(_) => "embedding_failed",
            AnalysisError::Generation(_) => "generation_failed",
            AnalysisError::Output(_) => "output_failed",
        }
    }

    /// True for failures caused by the inputs rather than a service.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingApiKey
                | AnalysisError::EmptyCorpus(_)
                | AnalysisError::EmptyContent(_)
        )
    }
}

impl From<CorpusError> for AnalysisError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::Empty(role) => AnalysisError::EmptyCorpus(role),
            CorpusError::EmptyContent(role) => AnalysisError::EmptyContent(role),
        }
    }
}

impl From<PromptError> for AnalysisError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::EmptyRisks => AnalysisError::EmptyContent(CorpusRole::RiskTaxonomy),
            PromptError::EmptyTarget => AnalysisError::EmptyContent(CorpusRole::Target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_input() {
        let err = AnalysisError::from(CorpusError::Empty(CorpusRole::Historical));
        assert_eq!(err.to_string(), "could not load any content from the historical documents");
        assert_eq!(err.kind(), "historical_documents_empty");
        assert!(err.is_precondition());

        let err = AnalysisError::from(PromptError::EmptyRisks);
        assert_eq!(err.to_string(), "the risks document has no text content");
        assert_eq!(err.kind(), "risks_document_blank");
    }

    #[test]
    fn test_service_errors_keep_cause() {
        let err = AnalysisError::Generation(
            anyhow::anyhow!("HTTP 503").context("Failed to send generation request"),
        );
        assert_eq!(
            err.to_string(),
            "generation failed: Failed to send generation request: HTTP 503"
        );
        assert!(!err.is_precondition());
    }
}
