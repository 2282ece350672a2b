pub mod llm;
pub mod prompt;
pub mod retriever;

pub use llm::{ChatClient, TextGenerator};
pub use prompt::{AnalysisPrompt, NO_RETRIEVED_DOCUMENTS, PromptError, PromptInputs};
pub use retriever::{
    MultiQueryRetriever, RetrievalConfig, RetrievalQueries, RetrievalResult, RetrievedContext,
};
