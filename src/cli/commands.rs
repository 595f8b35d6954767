//! CLI command handlers

use anyhow::{Context, Result};
use clap_complete::generate;
use colored::Colorize;
use dialoguer::Confirm;
use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::device::{self, DeviceDetector};
use crate::error::RipsyncError;
use crate::fetch::{DownloadRequest, Fetcher};
use crate::sync::{SyncEngine, SyncOutcome, SyncPlan, SyncReport};
use crate::tools::ExternalTools;
use crate::utils::format_size;

/// Handle the `download` command
pub async fn download(
    config: &Config,
    url: String,
    playlist: bool,
    name: Option<String>,
) -> Result<()> {
    let tools = ExternalTools::locate()?;
    let fetcher = Fetcher::new(tools, config);

    // Strip the backslash escapes shells leave in pasted URLs
    let url = url.replace('\\', "");

    println!("{}", format!("Downloading audio from: {url}").cyan());
    println!("Saving to: {}", config.download_dir().display());
    println!();

    let request = DownloadRequest { url, playlist, name };
    let files = fetcher.fetch(&request).await?;

    println!();
    println!("{}", "Download complete!".green().bold());
    for file in &files {
        println!("  {}", file.display());
    }

    Ok(())
}

/// Handle the `sync` command
pub async fn sync(
    config: &Config,
    target: Option<PathBuf>,
    yes: bool,
    dry_run: bool,
) -> Result<()> {
    let source_root = config.download_dir();
    let (target_root, free_space) = resolve_target(config, target)?;

    println!(
        "Syncing {} {} {}",
        source_root.display().to_string().cyan(),
        "->".bold(),
        target_root.display().to_string().cyan()
    );
    if let Some(free) = free_space {
        println!("Target free space: {}", format_size(free));
    }
    println!();

    let engine = SyncEngine::new(source_root, target_root);

    if dry_run {
        let plan = engine.plan().await?;
        if plan.is_empty() {
            println!("{}", "Everything is in sync!".green());
        } else {
            present_plan(&plan, free_space);
            println!("{}", "[DRY RUN] No changes applied.".yellow());
        }
        return Ok(());
    }

    let outcome = engine
        .reconcile(|plan| {
            present_plan(plan, free_space);
            if yes {
                return Ok(true);
            }
            Confirm::new()
                .with_prompt("Proceed with sync?")
                .default(false)
                .interact()
                .context("Failed to read confirmation")
        })
        .await?;

    match outcome {
        SyncOutcome::AlreadyInSync => {
            println!("{}", "Everything is in sync!".green());
        }
        SyncOutcome::Rejected => {
            println!("Sync cancelled.");
        }
        SyncOutcome::Applied(report) => {
            print_report(&report);
            println!();
            println!("Remember to safely eject the device before unplugging!");
        }
    }

    Ok(())
}

/// Handle the `run` command
pub async fn run(config: &Config, download_only: bool, sync_only: bool) -> Result<()> {
    if !sync_only {
        if config.urls.is_empty() {
            println!("{}", "No URLs configured.".yellow());
        } else {
            let tools = ExternalTools::locate()?;
            let fetcher = Fetcher::new(tools, config);

            let mut succeeded = 0;
            for url in &config.urls {
                println!("{}", format!("Downloading: {url}").cyan());
                let request = DownloadRequest {
                    url: url.clone(),
                    playlist: false,
                    name: None,
                };
                match fetcher.fetch(&request).await {
                    Ok(_) => succeeded += 1,
                    Err(e) => {
                        tracing::error!("Failed to download {}: {:#}", url, e);
                    }
                }
            }
            println!(
                "Downloaded {}/{} URL(s) successfully.",
                succeeded,
                config.urls.len()
            );
            println!();
        }
    }

    if !download_only {
        sync(config, None, false, false).await?;
    }

    Ok(())
}

/// Handle the `devices` command
pub fn devices() -> Result<()> {
    println!("{}", "Scanning for MP3 players...".cyan());
    println!();

    let devices = DeviceDetector::scan()?;
    if devices.is_empty() {
        println!("{}", "No MP3 players found.".yellow());
        println!("Make sure the device is connected and mounted.");
        return Ok(());
    }

    for device in &devices {
        println!(
            "  {} - {} ({} free)",
            device.label.green(),
            device.mount_point.display(),
            format_size(device.free_space)
        );
    }

    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = super::Cli::command();
    generate(shell, &mut cmd, "ripsync", &mut io::stdout());
}

/// Pick the sync target: explicit dir, detected player, or configured fallback
fn resolve_target(config: &Config, explicit: Option<PathBuf>) -> Result<(PathBuf, Option<u64>)> {
    if let Some(dir) = explicit {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let free = device::free_space(&dir).ok();
        return Ok((dir, free));
    }

    if let Some(player) = DeviceDetector::find_first()? {
        println!(
            "Found {} at {}",
            player.label.green(),
            player.mount_point.display()
        );
        return Ok((player.mount_point, Some(player.free_space)));
    }

    match &config.sync_directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let free = device::free_space(dir).ok();
            Ok((dir.clone(), free))
        }
        None => Err(RipsyncError::NoSyncTarget.into()),
    }
}

fn present_plan(plan: &SyncPlan, free_space: Option<u64>) {
    println!("Sync plan:");

    if !plan.additions.is_empty() {
        println!("  To copy:   {} file(s)", plan.additions.len());
        for item in &plan.additions {
            println!(
                "    {} {} ({})",
                "+".green(),
                item.rel_path.display(),
                format_size(item.size)
            );
        }
    }
    if !plan.updates.is_empty() {
        println!("  To update: {} file(s)", plan.updates.len());
        for item in &plan.updates {
            println!(
                "    {} {} ({})",
                "~".yellow(),
                item.rel_path.display(),
                format_size(item.size)
            );
        }
    }
    if !plan.removals.is_empty() {
        println!("  To delete: {} file(s)", plan.removals.len());
        for path in &plan.removals {
            println!("    {} {}", "-".red(), path.display());
        }
    }
    if plan.unchanged > 0 {
        println!("  Up to date: {} file(s)", plan.unchanged);
    }
    println!();

    if let Some(free) = free_space {
        let needed = plan.bytes_to_copy();
        if needed > free {
            println!(
                "{}",
                format!(
                    "WARNING: may not have enough space (need {}, available {})",
                    format_size(needed),
                    format_size(free)
                )
                .yellow()
            );
            println!();
        }
    }
}

fn print_report(report: &SyncReport) {
    println!();
    println!("{}", "Sync complete!".green().bold());
    println!("  Copied:  {}", report.copied);
    println!("  Updated: {}", report.updated);
    println!("  Removed: {}", report.removed);
    if !report.failures.is_empty() {
        println!("  {}", format!("Errors:  {}", report.failures.len()).red());
        for (path, error) in &report.failures {
            println!("    - {}: {}", path.display(), error);
        }
    }
}

// Extension trait for Cli to get clap Command
impl super::Cli {
    fn command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}
