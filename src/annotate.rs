//! Annotation generation.
//!
//! Flattens every file's warnings into the platform's annotation records.
//! Output order follows input file order, then per-file warning order.

use crate::models::insights::{Annotation, ANNOTATION_TYPE_BUG};
use crate::models::LintFileResult;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Relativize a linter source path against `base`, using forward slashes.
///
/// Linters usually emit absolute paths; relative ones are kept as given.
/// When no relative form exists (different prefix), the path passes through
/// unchanged.
fn relative_source(source: &str, base: &Path) -> String {
    let src = Path::new(source);
    let rel: PathBuf = if src.is_absolute() {
        pathdiff::diff_paths(src, base).unwrap_or_else(|| src.to_path_buf())
    } else {
        src.to_path_buf()
    };
    rel.to_string_lossy().replace(MAIN_SEPARATOR, "/")
}

/// Build one annotation per warning, with ids unique within the report.
///
/// The id concatenates report id, relative path, line, rule, and the
/// warning's index within its file, so identical findings on the same line
/// still get distinct ids.
pub fn generate_annotations(
    results: &[LintFileResult],
    report_id: &str,
    base: &Path,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for result in results {
        let path = relative_source(&result.source, base);
        for (i, warning) in result.warnings.iter().enumerate() {
            annotations.push(Annotation {
                external_id: format!(
                    "{}-{}-{}-{}-{}",
                    report_id,
                    path,
                    warning.line,
                    warning.rule.as_deref().unwrap_or(""),
                    i
                ),
                line: warning.line,
                path: path.clone(),
                summary: warning.text.clone(),
                annotation_type: ANNOTATION_TYPE_BUG.to_string(),
                severity: warning.severity.into(),
            });
        }
    }
    annotations
}
