use crate::retriever::RetrievedContext;

/// Context block used when retrieval found nothing.
pub const NO_RETRIEVED_DOCUMENTS: &str =
    "No relevant documents were retrieved from the historical documents.";

const TARGET_SLOT: &str = "{target_document_content}";
const RISKS_SLOT: &str = "{risks_document_content}";
const RETRIEVED_SLOT: &str = "{retrieved_docs_str}";

const RISK_ANALYSIS_TEMPLATE: &str = r#"You are a procurement risk assessment AI. Evaluate the risks associated with the target document
based on the retrieved knowledge and the risks detailed in the risks document.

### Target Document:
{target_document_content}

### Risks Document:
{risks_document_content}

### Retrieved Risk-Related Documents:
{retrieved_docs_str}

### Task:
Analyze the target document and classify risks into the categories detailed in the risks document.

Output the risk labels and a short explanation for each.

Risk Assessment:

Based on the risks document summarize a mitigation plan.

Mitigation Plan:"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("the risks document content is empty")]
    EmptyRisks,
    #[error("the target document content is empty")]
    EmptyTarget,
}

/// A fully rendered generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Risk taxonomy and target content, checked non-blank.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    risks: &'a str,
    target: &'a str,
}

impl<'a> PromptInputs<'a> {
    pub fn new(risks: &'a str, target: &'a str) -> Result<Self, PromptError> {
        if risks.trim().is_empty() {
            return Err(PromptError::EmptyRisks);
        }
        if target.trim().is_empty() {
            return Err(PromptError::EmptyTarget);
        }
        Ok(Self { risks, target })
    }

    pub fn risks(&self) -> &'a str {
        self.risks
    }

    pub fn target(&self) -> &'a str {
        self.target
    }

    pub fn render(&self, context: &RetrievedContext) -> AnalysisPrompt {
        let retrieved = match context {
            RetrievedContext::Found(block) => block.as_str(),
            RetrievedContext::Empty => NO_RETRIEVED_DOCUMENTS,
        };
        AnalysisPrompt(fill_template(&[
            (TARGET_SLOT, self.target),
            (RISKS_SLOT, self.risks),
            (RETRIEVED_SLOT, retrieved),
        ]))
    }
}

/// Substitute each slot once, in template order, without rescanning the
/// inserted values (document text may itself contain braces).
fn fill_template(values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(
        RISK_ANALYSIS_TEMPLATE.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = RISK_ANALYSIS_TEMPLATE;

    for (slot, value) in values {
        match rest.split_once(slot) {
            Some((before, after)) => {
                rendered.push_str(before);
                rendered.push_str(value);
                rest = after;
            }
            None => unreachable!("template is missing slot {slot}"),
        }
    }
    rendered.push_str(rest);
    rendered
}
