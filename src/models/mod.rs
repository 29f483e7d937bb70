//! Shared data models for linter input and platform wire payloads.

pub mod insights;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity level reported by the linter for a single warning.
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// One finding inside a file's result.
pub struct LintWarning {
    pub line: u64,
    #[serde(default)]
    pub column: Option<u64>,
    #[serde(default)]
    pub rule: Option<String>,
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// The linter's result for one source file. Extra fields emitted by the
/// linter (deprecations, parse errors, ...) are ignored on input.
pub struct LintFileResult {
    pub source: String,
    #[serde(default)]
    pub warnings: Vec<LintWarning>,
}

impl LintFileResult {
    /// Count warnings of the given severity in this file.
    pub fn count(&self, severity: Severity) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == severity)
            .count()
    }
}
