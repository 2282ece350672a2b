use std::fmt;

use serde::Serialize;

use crate::document::DocumentUnit;

/// Which input folder a corpus was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusRole {
    Historical,
    RiskTaxonomy,
    Target,
}

impl fmt::Display for CorpusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorpusRole::Historical => "historical documents",
            CorpusRole::RiskTaxonomy => "risks document",
            CorpusRole::Target => "target document",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusError {
    #[error("could not load any content from the {0}")]
    Empty(CorpusRole),
    #[error("the {0} has no text content")]
    EmptyContent(CorpusRole),
}

#[derive(Debug, Clone)]
pub struct Corpus {
    role: CorpusRole,
    units: Vec<DocumentUnit>,
}

impl Corpus {
    pub fn new(role: CorpusRole, units: Vec<DocumentUnit>) -> Self {
        Self { role, units }
    }

    pub fn role(&self) -> CorpusRole {
        self.role
    }

    pub fn units(&self) -> &[DocumentUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn require_non_empty(&self) -> Result<&[DocumentUnit], CorpusError> {
        if self.units.is_empty() {
            return Err(CorpusError::Empty(self.role));
        }
        Ok(&self.units)
    }

    /// The unit that stands for this corpus (the first one loaded).
    pub fn first(&self) -> Result<&DocumentUnit, CorpusError> {
        self.units.first().ok_or(CorpusError::Empty(self.role))
    }

    /// Content of the first unit, rejected when blank.
    pub fn primary_content(&self) -> Result<&str, CorpusError> {
        let unit = self.first()?;
        if unit.is_blank() {
            return Err(CorpusError::EmptyContent(self.role));
        }
        Ok(unit.content())
    }
}
