//! Secret generation command.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use keysmith_core::term::in_controlling_terminal;
use keysmith_core::time::pretty_duration;
use keysmith_core::util::ShellRunner;
use keysmith_core::{log, RepoConfig};
use keysmith_inventory::Inventory;
use keysmith_secrets::{Driver, GenerationPlan, ResolvedEntry, RunEvent, RunOptions};
use keysmith_services::{CommandSealer, GitStager};
use keysmith_types::Sealer;
use std::path::Path;
use std::time::Instant;

use crate::cli::Cli;
use crate::ui::progress;

pub async fn execute(cli: &Cli) -> Result<()> {
    let started = Instant::now();
    let root = std::env::current_dir().context("Failed to determine the current directory")?;

    let config = RepoConfig::load(&root)?;
    let _guards = log::init(cli.log_level(), &config.logs)?;
    tracing::debug!(root = %root.display(), "loaded repository configuration");

    let inventory = Inventory::load(&root, &config.hosts_dir).context("Failed to load hosts")?;
    let sealer = CommandSealer::new(config.sealer.clone())?;

    let plan = GenerationPlan::build(&inventory, &sealer.decrypt_command())?;
    for warning in plan.warnings() {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    // Every target must be known before anything is generated.
    let targets = plan.resolve_targets(&root, &cli.targets)?;

    if plan.is_empty() {
        if !cli.quiet {
            println!("No generated secrets declared in {} hosts", inventory.len());
        }
        return Ok(());
    }

    let mut driver = Driver::new(Box::new(sealer), Box::new(ShellRunner::new(config.shell.clone())));
    if cli.add_to_git {
        driver = driver.with_stager(Box::new(GitStager::new(&root)));
    }

    let options = RunOptions {
        targets,
        force: cli.force_generate,
    };

    let show_spinner = in_controlling_terminal() && !cli.quiet;
    let mut spinner: Option<ProgressBar> = None;

    let result = driver
        .run(&plan, &options, |event| match event {
            RunEvent::Started { entry, .. } => {
                if show_spinner {
                    spinner = Some(progress::spinner(&format!(
                        "generating {}",
                        display_path(&root, entry)
                    )));
                }
            }
            RunEvent::Generated { entry, reason } => {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
                if !cli.quiet {
                    println!(
                        "{} {} ({}) {}",
                        "generated".green(),
                        display_path(&root, entry),
                        reason,
                        entry.describe_definitions().dimmed()
                    );
                }
            }
            RunEvent::Skipped { entry } => {
                if !cli.quiet {
                    println!(
                        "{} {} {} {}",
                        "skipped".dimmed(),
                        display_path(&root, entry),
                        "(up to date)".dimmed(),
                        entry.describe_definitions().dimmed()
                    );
                }
            }
        })
        .await;

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
    let summary = result?;

    if !cli.quiet {
        let elapsed = chrono::Duration::from_std(started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        println!(
            "{} {} generated, {} up to date in {}",
            "✓".green().bold(),
            summary.generated,
            summary.skipped,
            pretty_duration(elapsed)
        );
    }

    Ok(())
}

fn display_path(root: &Path, entry: &ResolvedEntry) -> String {
    entry
        .file
        .strip_prefix(root)
        .unwrap_or(&entry.file)
        .display()
        .to_string()
}
