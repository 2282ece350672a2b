pub mod blocks;
pub mod corpus;
pub mod document;
pub mod loader;
pub mod reader;

pub use corpus::{Corpus, CorpusError, CorpusRole};
pub use document::DocumentUnit;
pub use loader::{LoadOutcome, LoadReport, SkippedFile, load_file, load_folder};
pub use reader::{FileKind, FileReader, LoadError};

use std::path::Path;

/// Load a folder straight into a corpus for `role`.
pub async fn load_corpus(folder: &Path, role: CorpusRole) -> (Corpus, Vec<SkippedFile>) {
    load_folder(folder).await.into_corpus(role)
}
