pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod splitter;

pub use config::{AnalysisConfig, DEFAULT_QUERY, InputFolders};
pub use error::AnalysisError;
pub use generator::{GenerationSettings, OUTPUT_FILE_NAME, RiskAnalysisGenerator, save_output};
pub use pipeline::{AnalysisOutcome, RiskAnalysisPipeline};
pub use splitter::{AnalysisResult, MITIGATION_MARKER, split_sections};
