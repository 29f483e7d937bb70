//! Lintport CLI binary entry point.
//! Delegates to modules for render/publish and prints results.

use clap::Parser;
use lintport::cli::{Cli, Commands};
use lintport::models::LintFileResult;
use lintport::{annotate, config, input, output, publish, report, utils};
use std::path::{Path, PathBuf};

fn default_specs(results: Vec<String>) -> Vec<String> {
    if results.is_empty() {
        vec!["-".to_string()]
    } else {
        results
    }
}

fn load_or_exit(specs: &[String], repo_root: &Path) -> Vec<LintFileResult> {
    match input::load_results(specs, repo_root) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    }
}

fn note_missing_config(repo_root: &Path) {
    if config::load_config(repo_root).is_none() {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No lintport.toml found; using defaults."
        );
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Render {
            results,
            repo_root,
            output: out,
        } => {
            let eff = config::resolve_effective(repo_root.as_deref(), out.as_deref(), None);
            note_missing_config(&eff.repo_root);
            let specs = default_specs(results);
            let parsed = load_or_exit(&specs, &eff.repo_root);
            output::print_results(&parsed, &eff.output);
        }
        Commands::Publish {
            results,
            repo_root,
            output: out,
            report_id,
            dry_run,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                out.as_deref(),
                report_id.as_deref(),
            );
            note_missing_config(&eff.repo_root);
            let specs = default_specs(results);
            let parsed = load_or_exit(&specs, &eff.repo_root);

            // Coordinates are required before any network call.
            let env = match config::BitbucketEnv::from_env() {
                Ok(env) => env,
                Err(e) => {
                    eprintln!("{} {}", utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };

            let rid = eff.report_id_for(&env.commit);
            let rep = report::generate_report(&parsed, &eff);
            let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let annotations = annotate::generate_annotations(&parsed, &rid, &base);

            if dry_run {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::compose_publish_json(
                        &rep,
                        &annotations
                    ))
                    .unwrap()
                );
                return;
            }

            eprintln!(
                "{} {}",
                utils::info_prefix(),
                format!("Publishing report '{}' for commit {}", rid, env.commit)
            );
            let client = publish::InsightsClient::new(eff.base_url.clone(), env.auth.clone());
            let key = publish::ReportKey::new(&env, rid);
            let handle = publish::spawn_publish(client, key, rep, annotations);

            // The rendered results come back without waiting on the network;
            // the join below only keeps the process alive until the publish
            // sequence is done.
            output::print_results(&parsed, &eff.output);

            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("{} {}", utils::error_prefix(), e);
                    std::process::exit(1);
                }
                Err(_) => {
                    eprintln!("{} publishing thread panicked", utils::error_prefix());
                    std::process::exit(1);
                }
            }
        }
    }
}
