//! Wire schema for the review platform's report and annotation resources.
//!
//! Field names and enum spellings follow the Code Insights REST API; the
//! serialized form of these structs is the request body, byte for byte.

use serde::Serialize;

use crate::models::Severity;

/// Report type accepted by the platform for linter runs.
pub const REPORT_TYPE_TEST: &str = "TEST";
/// Annotation type used for every published finding.
pub const ANNOTATION_TYPE_BUG: &str = "BUG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Overall verdict attached to a report.
pub enum ReportResult {
    #[serde(rename = "PASSED")]
    Passed,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, Serialize)]
/// Summary record attached to a commit.
pub struct Report {
    pub title: String,
    pub logo_url: String,
    pub reporter: String,
    pub report_type: String,
    pub details: String,
    pub result: ReportResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Two-level severity understood by the platform's annotation surface.
pub enum AnnotationSeverity {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
}

impl From<Severity> for AnnotationSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => AnnotationSeverity::High,
            Severity::Warning => AnnotationSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// One line-level finding published to the inline-comment surface.
///
/// `external_id` must be unique within a report; `path` is relative to the
/// repository checkout and uses forward slashes.
pub struct Annotation {
    pub external_id: String,
    pub line: u64,
    pub path: String,
    pub summary: String,
    pub annotation_type: String,
    pub severity: AnnotationSeverity,
}
