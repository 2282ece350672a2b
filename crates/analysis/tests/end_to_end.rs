use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use analysis::{AnalysisConfig, AnalysisError, OUTPUT_FILE_NAME, RiskAnalysisPipeline};
use anyhow::Result;
use async_trait::async_trait;
use index::Embedder;
use ingest::CorpusRole;
use query::{NO_RETRIEVED_DOCUMENTS, TextGenerator};

const RESPONSE: &str =
    "Risk Assessment:\n- Schedule Risk: vendor delay\n\nMitigation Plan:\n- Qualify a second vendor";

/// Embeds text by keyword presence so related documents land close together.
#[derive(Default)]
struct KeywordEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(["delay", "cost", "vendor", "risk"]
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Puts historical documents and every other text on orthogonal axes.
#[derive(Default)]
struct DisjointEmbedder;

#[async_trait]
impl Embedder for DisjointEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.starts_with("archive") {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding service unavailable")
    }
}

struct RecordingGenerator {
    prompts: Mutex<Vec<(String, String, f32)>>,
    response: String,
}

impl RecordingGenerator {
    fn new(response: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            response: response.to_string(),
        }
    }

    fn calls(&self) -> Vec<(String, String, f32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, model: &str, temperature: f32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), model.to_string(), temperature));
        Ok(self.response.clone())
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

fn workspace(
    historical: &[(&str, &str)],
    risks: &str,
    target: &str,
) -> (tempfile::TempDir, AnalysisConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalysisConfig::for_workspace(dir.path(), "sk-test".to_string());

    fs::create_dir_all(&config.folders.historical).unwrap();
    for (name, content) in historical {
        write(&config.folders.historical, name, content);
    }
    write(&config.folders.risks, "risks.csv", risks);
    write(&config.folders.target, "target.csv", target);

    (dir, config)
}

#[tokio::test]
async fn test_full_run_generates_once_and_writes_output() {
    let (_dir, config) = workspace(
        &[
            ("dataset1.csv", "id,event\n1,vendor delay of 3 weeks"),
            ("dataset2.csv", "id,event\n2,cost overrun on steel"),
        ],
        "Schedule Risk: late delivery\nCost Risk: budget overrun",
        "Project X delayed by vendor, expected Q3",
    );
    let config = config.with_query("What are the risks?");
    let output_dir = config.output_dir.clone();

    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline = RiskAnalysisPipeline::new(config, embedder.clone(), generator.clone());

    let outcome = pipeline.run().await.unwrap();

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    let (prompt, model, temperature) = &calls[0];
    assert_eq!(model, "gpt-4o");
    assert_eq!(*temperature, 0.5);
    assert!(prompt.contains("### Target Document:\nProject X delayed by vendor, expected Q3\n"));
    assert!(prompt.contains(
        "### Risks Document:\nSchedule Risk: late delivery\nCost Risk: budget overrun\n"
    ));
    assert!(prompt.contains("### Retrieved Risk-Related Documents:\nDocument 1: "));
    assert!(prompt.contains("Document 2: "));
    assert!(!prompt.contains("Document 3: "));
    assert!(!prompt.contains(NO_RETRIEVED_DOCUMENTS));

    // two historical documents embedded plus three queries
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);

    let written = fs::read_to_string(output_dir.join(OUTPUT_FILE_NAME)).unwrap();
    assert_eq!(written, RESPONSE);
    assert_eq!(outcome.output_path, output_dir.join(OUTPUT_FILE_NAME));
    assert_eq!(outcome.retrieved_documents, 2);
    assert_eq!(outcome.result.risk_section(), "Risk Assessment:\n- Schedule Risk: vendor delay");
    assert_eq!(outcome.result.mitigation_section(), "- Qualify a second vendor");
    assert!(outcome.skipped_files.is_empty());
}

#[tokio::test]
async fn test_blank_risks_document_stops_before_services() {
    let (_dir, config) = workspace(
        &[("dataset1.csv", "id,event\n1,vendor delay")],
        "   \n\t",
        "Project X delayed by vendor",
    );
    let output_dir = config.output_dir.clone();

    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline = RiskAnalysisPipeline::new(config, embedder.clone(), generator.clone());

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, AnalysisError::EmptyContent(CorpusRole::RiskTaxonomy)));
    assert_eq!(err.kind(), "risks_document_blank");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(generator.calls().is_empty());
    assert!(!output_dir.join(OUTPUT_FILE_NAME).exists());
}

#[tokio::test]
async fn test_empty_historical_folder_stops_before_indexing() {
    let (_dir, config) = workspace(&[], "Cost Risk", "Project X");

    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline = RiskAnalysisPipeline::new(config, embedder.clone(), generator.clone());

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, AnalysisError::EmptyCorpus(CorpusRole::Historical)));
    assert_eq!(err.to_string(), "could not load any content from the historical documents");
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_missing_target_folder_is_named() {
    let (_dir, config) = workspace(&[("h.csv", "history")], "Cost Risk", "Project X");
    fs::remove_dir_all(&config.folders.target).unwrap();

    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline =
        RiskAnalysisPipeline::new(config, Arc::new(KeywordEmbedder::default()), generator);

    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.kind(), "target_document_empty");
}

#[tokio::test]
async fn test_empty_retrieval_uses_fallback_and_still_generates() {
    let (_dir, mut config) = workspace(
        &[("old.csv", "archive: office chairs 2019")],
        "Cost Risk: overrun",
        "Project X delayed",
    );
    config.retrieval.max_distance = Some(0.5);
    let output_dir = config.output_dir.clone();

    let generator = Arc::new(RecordingGenerator::new("No marker in this answer"));
    let pipeline = RiskAnalysisPipeline::new(config, Arc::new(DisjointEmbedder), generator.clone());

    let outcome = pipeline.run().await.unwrap();

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains(&format!(
        "### Retrieved Risk-Related Documents:\n{}\n",
        NO_RETRIEVED_DOCUMENTS
    )));
    assert_eq!(outcome.retrieved_documents, 0);
    assert_eq!(outcome.result.risk_section(), "No marker in this answer");
    assert!(!outcome.result.has_mitigation_plan());
    assert!(output_dir.join(OUTPUT_FILE_NAME).exists());
}

#[tokio::test]
async fn test_missing_api_key_checked_first() {
    let dir = tempfile::tempdir().unwrap();
    // No folders exist at all; the key check must win.
    let config = AnalysisConfig::for_workspace(dir.path(), String::new());

    let embedder = Arc::new(KeywordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline = RiskAnalysisPipeline::new(config, embedder.clone(), generator.clone());

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, AnalysisError::MissingApiKey));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_is_fatal() {
    let (_dir, config) = workspace(&[("h.csv", "history")], "Cost Risk", "Project X");
    let output_dir = config.output_dir.clone();

    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline = RiskAnalysisPipeline::new(config, Arc::new(FailingEmbedder), generator.clone());

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.kind(), "embedding_failed");
    assert!(err.to_string().contains("embedding service unavailable"));
    assert!(generator.calls().is_empty());
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_invalid_files_are_skipped_and_reported() {
    let (_dir, config) = workspace(
        &[("good.csv", "vendor delay history"), ("bad.pdf", "not really a pdf")],
        "Schedule Risk",
        "Project X delayed by vendor",
    );

    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline =
        RiskAnalysisPipeline::new(config, Arc::new(KeywordEmbedder::default()), generator);

    let outcome = pipeline.run().await.unwrap();

    assert_eq!(outcome.retrieved_documents, 1);
    assert_eq!(outcome.skipped_files.len(), 1);
    assert!(outcome.skipped_files[0].path.ends_with("bad.pdf"));
}

#[tokio::test]
async fn test_run_can_be_spawned_on_the_runtime() {
    let (_dir, config) = workspace(
        &[("h1.csv", "vendor delay"), ("h2.csv", "cost overrun")],
        "Schedule Risk",
        "Project X delayed by vendor",
    );
    let mut config = config;
    config.index.batch_size = 1;
    config.index.concurrency = 2;

    let generator = Arc::new(RecordingGenerator::new(RESPONSE));
    let pipeline =
        RiskAnalysisPipeline::new(config, Arc::new(KeywordEmbedder::default()), generator);

    let outcome = tokio::spawn(async move { pipeline.run().await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.retrieved_documents, 2);
    assert!(outcome.result.has_mitigation_plan());
}
