//! CLI module for ripsync

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "ripsync", about = "Download audio and sync it to portable MP3 players")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.config/ripsync/config.json)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download audio from a URL
    Download {
        /// Media or playlist URL
        url: String,

        /// Treat the URL as a playlist and merge all items into one file
        #[arg(short, long)]
        playlist: bool,

        /// Output filename (without extension)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Reconcile a device or sync directory with the local library
    Sync {
        /// Sync to this directory instead of a detected player
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,

        /// Apply the plan without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Show the plan without applying it
        #[arg(long)]
        dry_run: bool,
    },

    /// Download every configured URL, then sync
    Run {
        /// Only download, do not sync
        #[arg(long, conflicts_with = "sync_only")]
        download_only: bool,

        /// Only sync existing files, do not download
        #[arg(long, conflicts_with = "download_only")]
        sync_only: bool,
    },

    /// List detected MP3 players
    Devices,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
