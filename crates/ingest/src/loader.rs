use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::corpus::{Corpus, CorpusRole};
use crate::document::DocumentUnit;
use crate::reader::{FileKind, FileReader};

/// A file the loader could not turn into document units.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Per-file result of loading.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<DocumentUnit>),
    Skipped(SkippedFile),
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub units: Vec<DocumentUnit>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    fn record(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(units) => self.units.extend(units),
            LoadOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn into_corpus(self, role: CorpusRole) -> (Corpus, Vec<SkippedFile>) {
        (Corpus::new(role, self.units), self.skipped)
    }
}

/// Load one file, converting any failure into a `Skipped` outcome.
pub async fn load_file(path: &Path) -> LoadOutcome {
    match FileReader::read_file(path).await {
        Ok(units) => LoadOutcome::Loaded(units),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not load file, skipping");
            LoadOutcome::Skipped(SkippedFile {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Load every supported file directly inside `folder`.
///
/// Files are visited extension by extension (csv, pdf, docx) and by file
/// name within an extension. A missing or unreadable folder yields an empty
/// report.
pub async fn load_folder(folder: &Path) -> LoadReport {
    let mut report = LoadReport::default();
    let files = list_supported_files(folder);

    for kind in FileKind::SUPPORTED {
        for path in files.iter().filter(|(k, _)| *k == kind).map(|(_, p)| p) {
            report.record(load_file(path).await);
        }
    }

    info!(
        folder = %folder.display(),
        units = report.units.len(),
        skipped = report.skipped.len(),
        "Loaded documents"
    );
    report
}

fn list_supported_files(folder: &Path) -> Vec<(FileKind, PathBuf)> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "Could not list folder entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = FileKind::from_path(entry.path()) {
            files.push((kind, entry.into_path()));
        }
    }

    files
}
