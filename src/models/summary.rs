//! File summaries sent to the model.

use serde::{Deserialize, Serialize};

/// One selected signal file, ready for the analysis prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Path relative to the project root.
    pub path: String,
    /// File extension without the leading dot (may be empty).
    pub language_hint: String,
    /// Sanitized snippet.
    pub content: String,
    /// Bytes charged against the global budget for this file.
    #[serde(skip)]
    pub charged_bytes: usize,
}
