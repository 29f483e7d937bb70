//! Configuration discovery and effective settings resolution.
//!
//! Lintport reads `lintport.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `report.title|reporter|logoUrl`: the stock Stylelint branding
//! - `report.id`: `stylelint-{commit}` (derived at publish time)
//! - `api.baseUrl`: `https://api.bitbucket.org`
//!
//! Overrides precedence: CLI > config file > defaults. The Bitbucket
//! coordinates (workspace, repo slug, commit, credential) are never read
//! from the config file; CI provides them as environment variables and a
//! missing one is a hard error before any network call.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workspace identifier, e.g. the team or user slug.
pub const ENV_WORKSPACE: &str = "BITBUCKET_WORKSPACE";
/// Repository slug within the workspace.
pub const ENV_REPO_SLUG: &str = "BITBUCKET_REPO_SLUG";
/// Full hash of the commit the report attaches to.
pub const ENV_COMMIT: &str = "BITBUCKET_COMMIT";
/// Complete `Authorization` header value, scheme included (`Bearer ...`).
pub const ENV_API_AUTH: &str = "BITBUCKET_API_AUTH";

pub const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org";
pub const DEFAULT_TITLE: &str = "Stylelint Bitbucket Reporter";
pub const DEFAULT_REPORTER: &str = "Stylelint";
pub const DEFAULT_LOGO_URL: &str = "https://stylelint.io/img/light.svg";

#[derive(Debug, Error)]
#[error("Missing ENV var: [{0}]")]
/// A required environment variable is absent or empty.
pub struct EnvError(pub String);

/// Read a required environment variable, rejecting empty values.
pub fn require_env(key: &str) -> Result<String, EnvError> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(EnvError(key.to_string())),
    }
}

#[derive(Debug, Clone)]
/// The CI-provided coordinates of the commit being reported on.
pub struct BitbucketEnv {
    pub workspace: String,
    pub repo_slug: String,
    pub commit: String,
    pub auth: String,
}

impl BitbucketEnv {
    /// Load all required variables, failing on the first missing one.
    pub fn from_env() -> Result<Self, EnvError> {
        Ok(Self {
            workspace: require_env(ENV_WORKSPACE)?,
            repo_slug: require_env(ENV_REPO_SLUG)?,
            commit: require_env(ENV_COMMIT)?,
            auth: require_env(ENV_API_AUTH)?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Report presentation overrides under `[report]`.
pub struct ReportCfg {
    pub id: Option<String>,
    pub title: Option<String>,
    pub reporter: Option<String>,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// API endpoint overrides under `[api]` (CI proxy setups).
pub struct ApiCfg {
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `lintport.toml|yaml`.
pub struct LintportConfig {
    pub output: Option<String>,
    #[serde(default)]
    pub report: Option<ReportCfg>,
    #[serde(default)]
    pub api: Option<ApiCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub output: String,
    /// Explicit report id; `None` means derive `stylelint-{commit}`.
    pub report_id: Option<String>,
    pub title: String,
    pub reporter: String,
    pub logo_url: String,
    pub base_url: String,
}

impl Effective {
    /// The report id used for publishing and annotation ids.
    pub fn report_id_for(&self, commit: &str) -> String {
        self.report_id
            .clone()
            .unwrap_or_else(|| format!("stylelint-{}", commit))
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `lintport.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("lintport.toml").exists()
            || cur.join("lintport.yaml").exists()
            || cur.join("lintport.yml").exists()
        {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `LintportConfig` from `lintport.toml` or `lintport.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<LintportConfig> {
    let toml_path = root.join("lintport.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        let cfg: LintportConfig = toml::from_str(&s).ok()?;
        return Some(cfg);
    }
    for yml in ["lintport.yaml", "lintport.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            let cfg: LintportConfig = serde_yaml::from_str(&s).ok()?;
            return Some(cfg);
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_report_id: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();
    let report = cfg.report.unwrap_or_default();
    let api = cfg.api.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let report_id = cli_report_id.map(|s| s.to_string()).or(report.id);

    Effective {
        repo_root,
        output,
        report_id,
        title: report.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        reporter: report
            .reporter
            .unwrap_or_else(|| DEFAULT_REPORTER.to_string()),
        logo_url: report
            .logo_url
            .unwrap_or_else(|| DEFAULT_LOGO_URL.to_string()),
        base_url: api.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    }
}
