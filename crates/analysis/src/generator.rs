use std::path::{Path, PathBuf};

use query::{AnalysisPrompt, TextGenerator};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::AnalysisError;

pub const OUTPUT_FILE_NAME: &str = "risk_analysis.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.5,
        }
    }
}

/// Sends the analysis prompt to the model and keeps a copy of the answer
/// on disk.
pub struct RiskAnalysisGenerator<'a> {
    generator: &'a dyn TextGenerator,
    settings: &'a GenerationSettings,
    output_dir: &'a Path,
}

impl<'a> RiskAnalysisGenerator<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        settings: &'a GenerationSettings,
        output_dir: &'a Path,
    ) -> Self {
        Self {
            generator,
            settings,
            output_dir,
        }
    }

    /// Returns the raw model text and the path it was written to.
    pub async fn generate(
        &self,
        prompt: &AnalysisPrompt,
    ) -> Result<(String, PathBuf), AnalysisError> {
        info!(
            model = %self.settings.model,
            temperature = self.settings.temperature,
            prompt_chars = prompt.as_str().len(),
            "Requesting risk analysis"
        );

        let text = self
            .generator
            .generate(prompt.as_str(), &self.settings.model, self.settings.temperature)
            .await
            .map_err(AnalysisError::Generation)?;

        let path = save_output(self.output_dir, &text)
            .await
            .map_err(AnalysisError::Output)?;

        info!(path = %path.display(), chars = text.len(), "Saved risk analysis");
        Ok((text, path))
    }
}

const PARTIAL_FILE_NAME: &str = ".risk_analysis.txt.partial";

/// Write `text` to `<output_dir>/risk_analysis.txt`, replacing any earlier
/// file.
///
/// The text goes to a sibling file first and is renamed into place, so an
/// interrupted write never leaves a truncated analysis behind.
pub async fn save_output(output_dir: &Path, text: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(output_dir).await?;
    let partial = output_dir.join(PARTIAL_FILE_NAME);
    let path = output_dir.join(OUTPUT_FILE_NAME);

    fs::write(&partial, text).await?;
    fs::rename(&partial, &path).await?;
    Ok(path)
}
