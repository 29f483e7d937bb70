//! Report generation.
//!
//! Reduces a result set to error/warning counts, a three-line detail
//! string, and a pass/fail verdict. Pure; the publisher decides what to do
//! with the output.

use crate::config::Effective;
use crate::models::insights::{Report, ReportResult, REPORT_TYPE_TEST};
use crate::models::{LintFileResult, Severity};
use crate::utils::pluralize;

/// Aggregate all files' warnings into the commit-level report.
///
/// The verdict is `FAILED` when any error-severity warning exists anywhere
/// in the set; warnings alone still pass.
pub fn generate_report(results: &[LintFileResult], eff: &Effective) -> Report {
    let error_count: usize = results.iter().map(|r| r.count(Severity::Error)).sum();
    let warning_count: usize = results.iter().map(|r| r.count(Severity::Warning)).sum();
    let problem_count = error_count + warning_count;

    let details = [
        format!("{} {}", problem_count, pluralize("problem", problem_count)),
        format!("{} {}", error_count, pluralize("error", error_count)),
        format!("{} {}", warning_count, pluralize("warning", warning_count)),
    ]
    .join("\n");

    let result = if error_count > 0 {
        ReportResult::Failed
    } else {
        ReportResult::Passed
    };

    Report {
        title: eff.title.clone(),
        logo_url: eff.logo_url.clone(),
        reporter: eff.reporter.clone(),
        report_type: REPORT_TYPE_TEST.to_string(),
        details,
        result,
    }
}
