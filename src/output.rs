//! Output rendering for lint results and publish payloads.
//!
//! Supports `human` (default) and `json` outputs. The human form is the
//! pretty per-file rendering the linter's own formatter would produce; the
//! JSON forms expose the results and the generated publish payloads with a
//! stable shape.

use crate::models::insights::{Annotation, Report};
use crate::models::{LintFileResult, Severity};
use crate::utils::pluralize;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Whether colored output is wanted for the given output mode.
pub fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Render results as pretty human text, one block per flagged file.
///
/// This is the text the process hands back immediately; publishing runs
/// behind it and must not delay it.
pub fn render_results(results: &[LintFileResult], color: bool) -> String {
    let mut out = String::new();
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for result in results {
        if result.warnings.is_empty() {
            continue;
        }
        let header = if color {
            result.source.bold().underline().to_string()
        } else {
            result.source.clone()
        };
        out.push_str(&header);
        out.push('\n');
        for w in &result.warnings {
            match w.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
            let icon = match (w.severity, color) {
                (Severity::Error, true) => "✖".red().to_string(),
                (Severity::Error, false) => "✖".to_string(),
                (Severity::Warning, true) => "▲".yellow().to_string(),
                (Severity::Warning, false) => "▲".to_string(),
            };
            let position = match w.column {
                Some(col) => format!("{}:{}", w.line, col),
                None => w.line.to_string(),
            };
            let rule = w
                .rule
                .as_deref()
                .map(|r| format!(" ❲{}❳", r))
                .unwrap_or_default();
            out.push_str(&format!("  {} {}  {}{}\n", icon, position, w.text, rule));
        }
        out.push('\n');
    }

    let problems = errors + warnings;
    let summary = if problems == 0 {
        "✔ no problems found".to_string()
    } else {
        format!(
            "✖ {} {} ({} {}, {} {})",
            problems,
            pluralize("problem", problems),
            errors,
            pluralize("error", errors),
            warnings,
            pluralize("warning", warnings)
        )
    };
    if color {
        out.push_str(&summary.bold().to_string());
    } else {
        out.push_str(&summary);
    }
    out.push('\n');
    out
}

/// Print results in the requested format.
pub fn print_results(results: &[LintFileResult], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_results_json(results)).unwrap()
        ),
        _ => print!("{}", render_results(results, use_colors(output))),
    }
}

/// Compose results JSON object (pure) for testing/snapshot purposes.
pub fn compose_results_json(results: &[LintFileResult]) -> JsonVal {
    let errors: usize = results.iter().map(|r| r.count(Severity::Error)).sum();
    let warnings: usize = results.iter().map(|r| r.count(Severity::Warning)).sum();
    let summary = json!({
        "problems": errors + warnings,
        "errors": errors,
        "warnings": warnings,
        "files": results.len(),
    });
    json!({
        "results": serde_json::to_value(results).unwrap(),
        "summary": summary,
    })
}

/// Compose the generated publish payloads (pure), used by `--dry-run`.
pub fn compose_publish_json(report: &Report, annotations: &[Annotation]) -> JsonVal {
    json!({
        "report": serde_json::to_value(report).unwrap(),
        "annotations": serde_json::to_value(annotations).unwrap(),
        "summary": {
            "annotations": annotations.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LintWarning;

    fn results() -> Vec<LintFileResult> {
        vec![
            LintFileResult {
                source: "src/a.css".into(),
                warnings: vec![
                    LintWarning {
                        line: 3,
                        column: Some(12),
                        rule: Some("unit-no-unknown".into()),
                        severity: Severity::Error,
                        text: "Unexpected unknown unit \"pxx\"".into(),
                    },
                    LintWarning {
                        line: 5,
                        column: None,
                        rule: None,
                        severity: Severity::Warning,
                        text: "Unexpected hex color".into(),
                    },
                ],
            },
            LintFileResult {
                source: "src/b.css".into(),
                warnings: vec![],
            },
        ]
    }

    #[test]
    fn test_render_results_plain() {
        let text = render_results(&results(), false);
        assert!(text.contains("src/a.css"));
        assert!(text.contains("✖ 3:12  Unexpected unknown unit \"pxx\" ❲unit-no-unknown❳"));
        assert!(text.contains("▲ 5  Unexpected hex color"));
        // Clean files are not listed.
        assert!(!text.contains("src/b.css"));
        assert!(text.ends_with("✖ 2 problems (1 error, 1 warning)\n"));
    }

    #[test]
    fn test_render_results_empty() {
        let text = render_results(&[], false);
        assert_eq!(text, "✔ no problems found\n");
    }

    #[test]
    fn test_compose_results_json_shape() {
        let out = compose_results_json(&results());
        assert_eq!(out["summary"]["problems"], 2);
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["summary"]["files"], 2);
        assert_eq!(out["results"][0]["warnings"][0]["line"], 3);
    }

    #[test]
    fn test_compose_publish_json_shape() {
        let report = Report {
            title: "t".into(),
            logo_url: "l".into(),
            reporter: "r".into(),
            report_type: "TEST".into(),
            details: "d".into(),
            result: crate::models::insights::ReportResult::Passed,
        };
        let out = compose_publish_json(&report, &[]);
        assert_eq!(out["report"]["result"], "PASSED");
        assert_eq!(out["summary"]["annotations"], 0);
        assert!(out["annotations"].as_array().unwrap().is_empty());
    }
}
