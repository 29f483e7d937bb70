//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lintport",
    version,
    about = "Publish linter results as Bitbucket Code Insights",
    long_about = "Lintport — read a linter's JSON result set and publish it to Bitbucket Code Insights as a commit report with inline annotations.\n\nConfiguration precedence: CLI > lintport.toml > defaults. Bitbucket coordinates come from BITBUCKET_WORKSPACE, BITBUCKET_REPO_SLUG, BITBUCKET_COMMIT, and BITBUCKET_API_AUTH.",
    after_help = "Examples:\n  stylelint 'src/**/*.css' --formatter json | lintport publish\n  lintport publish --results reports/stylelint.json --dry-run\n  lintport render --results 'reports/*.json' --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for rendering and publishing lint results.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current lintport version."
    )]
    Version,
    /// Render lint results without publishing
    #[command(
        about = "Render lint results",
        long_about = "Parse the linter's JSON results and print them in human or json form. No network calls are made.",
        after_help = "Examples:\n  lintport render --results reports/stylelint.json\n  stylelint 'src/**/*.css' --formatter json | lintport render"
    )]
    Render {
        #[arg(long, help = "Result file, glob pattern, or '-' for stdin (repeatable; default: stdin)")]
        results: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Render results and publish the report plus annotations
    #[command(
        about = "Publish report and annotations",
        long_about = "Generate the commit report and annotations from the results, print the rendered results, and publish via the Code Insights API: delete the stale report, create the new one, submit annotations in batches of 100.",
        after_help = "Examples:\n  stylelint 'src/**/*.css' --formatter json | lintport publish\n  lintport publish --results reports/stylelint.json --report-id css-insights\n  lintport publish --results reports/stylelint.json --dry-run"
    )]
    Publish {
        #[arg(long, help = "Result file, glob pattern, or '-' for stdin (repeatable; default: stdin)")]
        results: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Report id on the platform (default: stylelint-{commit})")]
        report_id: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the generated payloads instead of calling the API")]
        dry_run: bool,
    },
}
