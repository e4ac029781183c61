//! JSON reading of analysis input documents.

use crate::types::AnalysisInput;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one analysis input document: declared components plus optional
/// `traces`, `edges` and `workflows` sections, each defaulting to empty.
pub fn parse_input(json: &str) -> Result<AnalysisInput, ParseError> {
    Ok(serde_json::from_str(json)?)
}
