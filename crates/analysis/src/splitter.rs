use serde::Serialize;

/// Marker the prompt asks the model to put before the mitigation plan.
pub const MITIGATION_MARKER: &str = "Mitigation Plan:";

/// Split `text` once at the first mitigation marker.
///
/// Returns the trimmed text before and after the marker. Without a marker
/// the whole trimmed text is the risk section and the mitigation section is
/// empty.
pub fn split_sections(text: &str) -> (&str, &str) {
    match text.split_once(MITIGATION_MARKER) {
        Some((risk, mitigation)) => (risk.trim(), mitigation.trim()),
        None => (text.trim(), ""),
    }
}

/// Generated analysis text and its two sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    raw: String,
    risk_section: String,
    mitigation_section: String,
}

impl AnalysisResult {
    pub fn from_raw(raw: String) -> Self {
        let (risk, mitigation) = split_sections(&raw);
        let (risk_section, mitigation_section) = (risk.to_string(), mitigation.to_string());
        Self {
            raw,
            risk_section,
            mitigation_section,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn risk_section(&self) -> &str {
        &self.risk_section
    }

    pub fn mitigation_section(&self) -> &str {
        &self.mitigation_section
    }

    pub fn has_mitigation_plan(&self) -> bool {
        !self.mitigation_section.is_empty()
    }
}
