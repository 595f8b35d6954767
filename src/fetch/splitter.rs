//! Splitting oversized downloads into numbered parts
//!
//! Players with FAT32 cards choke on very large files, so anything over the
//! threshold is cut into N even segments with ffmpeg stream-copy. Duration
//! comes from ffprobe's JSON output.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

use crate::tools::{check_status, ExternalTools};
use crate::utils::format_size;

/// Files above this size get split into numbered parts (3 GiB)
pub const SPLIT_THRESHOLD: u64 = 3 * 1024 * 1024 * 1024;

/// One planned segment of a split
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// Segment length in seconds
    pub duration: f64,
}

/// Plan an even split of a file into parts below the threshold
///
/// Returns an empty plan for files at or below the threshold. Part count is
/// ceil(size / threshold), each part covering an equal share of the duration.
pub fn split_plan(size: u64, threshold: u64, total_duration: f64) -> Vec<Segment> {
    if threshold == 0 || size <= threshold {
        return Vec::new();
    }

    let parts = size.div_ceil(threshold);
    let part_duration = total_duration / parts as f64;

    (0..parts)
        .map(|i| Segment {
            start: i as f64 * part_duration,
            duration: part_duration,
        })
        .collect()
}

/// Split a file into parts if it exceeds the threshold
///
/// Returns the resulting file set: either the unchanged input or the numbered
/// parts (the oversized original is deleted after a successful split).
pub async fn split_if_oversized(tools: &ExternalTools, path: &Path) -> Result<Vec<PathBuf>> {
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();

    if size <= SPLIT_THRESHOLD {
        return Ok(vec![path.to_path_buf()]);
    }

    let duration = probe_duration(tools, path).await?;
    let plan = split_plan(size, SPLIT_THRESHOLD, duration);

    info!(
        "File is {} (over {}), splitting into {} parts ({:.1}s each)...",
        format_size(size),
        format_size(SPLIT_THRESHOLD),
        plan.len(),
        duration / plan.len() as f64
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp3".to_string());
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut parts = Vec::with_capacity(plan.len());
    for (index, segment) in plan.iter().enumerate() {
        let part_name = format!("{} part {} of {}.{}", stem, index + 1, plan.len(), extension);
        let part_path = parent.join(&part_name);
        info!("Creating: {}", part_name);

        let output = Command::new(&tools.ffmpeg)
            .arg("-i")
            .arg(path)
            .args(["-ss", &segment.start.to_string()])
            .args(["-t", &segment.duration.to_string()])
            .args(["-acodec", "copy", "-y"])
            .arg(&part_path)
            .output()
            .await
            .context("Failed to run ffmpeg")?;

        if !output.status.success() {
            error!("{}", String::from_utf8_lossy(&output.stderr));
        }
        check_status("ffmpeg", output.status)
            .with_context(|| format!("Failed to create part {}", index + 1))?;

        parts.push(part_path);
    }

    tokio::fs::remove_file(path)
        .await
        .with_context(|| format!("Failed to remove oversized original {}", path.display()))?;
    info!("Removed original file: {}", path.display());

    Ok(parts)
}

/// Probe total duration in seconds with ffprobe
pub async fn probe_duration(tools: &ExternalTools, path: &Path) -> Result<f64> {
    let output = Command::new(&tools.ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .await
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        error!("{}", String::from_utf8_lossy(&output.stderr));
    }
    check_status("ffprobe", output.status)
        .with_context(|| format!("Could not probe duration of {}", path.display()))?;

    let probe: ProbeOutput =
        serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

    probe
        .format
        .duration
        .parse::<f64>()
        .context("ffprobe reported a non-numeric duration")
}

// ffprobe -show_format JSON (duration arrives as a string)

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: String,
}
