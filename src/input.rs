//! Linter result loading.
//!
//! Results are the linter's JSON output: an array of per-file results.
//! Accepted sources: a file path, a glob pattern, or `-` for stdin.
//! Relative paths and patterns are resolved against the repository root.

use crate::models::LintFileResult;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
/// Failure while loading or decoding lint results.
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lint results JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("no result files matched '{0}'")]
    NoMatches(String),
}

fn has_glob_meta(spec: &str) -> bool {
    spec.contains(&['*', '?', '['][..])
}

fn parse_results(path: &str, data: &str) -> Result<Vec<LintFileResult>, InputError> {
    serde_json::from_str(data).map_err(|source| InputError::Parse {
        path: path.to_string(),
        source,
    })
}

fn read_file(path: &Path) -> Result<Vec<LintFileResult>, InputError> {
    let shown = path.to_string_lossy().to_string();
    let data = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: shown.clone(),
        source,
    })?;
    parse_results(&shown, &data)
}

/// Load and concatenate lint results from every spec, in order.
pub fn load_results(specs: &[String], repo_root: &Path) -> Result<Vec<LintFileResult>, InputError> {
    let mut results: Vec<LintFileResult> = Vec::new();
    for spec in specs {
        if spec == "-" {
            let mut data = String::new();
            std::io::stdin()
                .read_to_string(&mut data)
                .map_err(|source| InputError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            results.extend(parse_results("<stdin>", &data)?);
        } else if has_glob_meta(spec) {
            let pattern = repo_root.join(spec).to_string_lossy().to_string();
            let entries = glob::glob(&pattern).map_err(|source| InputError::Pattern {
                pattern: spec.clone(),
                source,
            })?;
            let mut matched = 0usize;
            for entry in entries.flatten() {
                results.extend(read_file(&entry)?);
                matched += 1;
            }
            if matched == 0 {
                return Err(InputError::NoMatches(spec.clone()));
            }
        } else {
            results.extend(read_file(&repo_root.join(spec))?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"source": "/repo/src/a.css", "warnings": [
            {"line": 3, "column": 12, "rule": "unit-no-unknown", "severity": "error", "text": "Unexpected unknown unit \"pxx\""}
        ]},
        {"source": "/repo/src/b.css", "warnings": []}
    ]"#;

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report.json"), SAMPLE).unwrap();
        let results = load_results(&["report.json".to_string()], dir.path()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].warnings.len(), 1);
        assert_eq!(results[0].warnings[0].rule.as_deref(), Some("unit-no-unknown"));
    }

    #[test]
    fn test_load_glob_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"[{"source": "a.css", "warnings": []}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"source": "b.css", "warnings": []}]"#,
        )
        .unwrap();
        let results = load_results(&["*.json".to_string()], dir.path()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "a.css");
        assert_eq!(results[1].source, "b.css");
    }

    #[test]
    fn test_glob_without_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_results(&["missing-*.json".to_string()], dir.path()).unwrap_err();
        assert!(matches!(err, InputError::NoMatches(_)));
    }

    #[test]
    fn test_bad_json_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let err = load_results(&["broken.json".to_string()], dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
