//! yt-dlp orchestration for single videos and merged playlists

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::splitter;
use crate::config::Config;
use crate::tools::{check_status, ExternalTools};
use crate::utils::{format_size, sanitize_filename};

/// Temp file yt-dlp writes the final output path into
const LAST_DOWNLOAD_FILE: &str = ".ripsync-last-download";

/// One download invocation
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Media or playlist URL
    pub url: String,
    /// Merge all playlist items into one file
    pub playlist: bool,
    /// Custom output name (without extension)
    pub name: Option<String>,
}

/// Builds and runs yt-dlp/ffmpeg command lines for audio extraction
pub struct Fetcher {
    tools: ExternalTools,
    output_dir: PathBuf,
    audio_format: String,
    audio_quality: String,
}

impl Fetcher {
    pub fn new(tools: ExternalTools, config: &Config) -> Self {
        Self {
            tools,
            output_dir: config.download_dir(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
        }
    }

    /// Fetch audio for a request
    ///
    /// Returns the files produced: one file, or the numbered parts when the
    /// result exceeded the split threshold.
    pub async fn fetch(&self, request: &DownloadRequest) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let output = if request.playlist {
            self.download_playlist(&request.url, request.name.as_deref())
                .await?
        } else {
            self.download_single(&request.url, request.name.as_deref())
                .await?
        };

        info!("Download complete: {}", output.display());
        splitter::split_if_oversized(&self.tools, &output).await
    }

    /// Download a single video's audio track
    async fn download_single(&self, url: &str, name: Option<&str>) -> Result<PathBuf> {
        let template = match name {
            Some(name) => format!("{}.%(ext)s", sanitize_filename(name)),
            None => "%(title)s.%(ext)s".to_string(),
        };
        let filepath_file = self.output_dir.join(LAST_DOWNLOAD_FILE);

        debug!("Running yt-dlp for {}", url);
        let status = Command::new(&self.tools.ytdlp)
            .arg("--ffmpeg-location")
            .arg(&self.tools.ffmpeg)
            .arg("-x")
            .args(["--audio-format", &self.audio_format])
            .args(["--audio-quality", &self.audio_quality])
            .arg("--print-to-file")
            .arg("after_move:filepath")
            .arg(&filepath_file)
            .arg("-o")
            .arg(self.output_dir.join(template))
            .arg(url)
            .status()
            .await
            .context("Failed to run yt-dlp")?;
        check_status("yt-dlp", status)?;

        // yt-dlp recorded where post-processing moved the file
        let recorded = tokio::fs::read_to_string(&filepath_file)
            .await
            .context("yt-dlp did not record an output path")?;
        let _ = tokio::fs::remove_file(&filepath_file).await;

        let output = PathBuf::from(recorded.trim());
        if !output.exists() {
            anyhow::bail!("yt-dlp reported {} but it does not exist", output.display());
        }
        Ok(output)
    }

    /// Download a playlist and merge all items into a single file
    async fn download_playlist(&self, url: &str, name: Option<&str>) -> Result<PathBuf> {
        let title = self.playlist_title(url).await?;
        let final_name = match name {
            Some(name) => sanitize_filename(name),
            None => sanitize_filename(&title),
        };
        info!("Playlist: {}", title);
        info!("Output will be: {}.{}", final_name, self.audio_format);

        // Individual items land in a temp dir, numbered so the merge keeps
        // playlist order
        let temp = tempfile::tempdir().context("Failed to create temp directory")?;
        let template = temp.path().join("%(playlist_index)03d-%(title)s.%(ext)s");

        let status = Command::new(&self.tools.ytdlp)
            .arg("--ffmpeg-location")
            .arg(&self.tools.ffmpeg)
            .arg("-x")
            .args(["--audio-format", &self.audio_format])
            .args(["--audio-quality", &self.audio_quality])
            .arg("-o")
            .arg(&template)
            .arg(url)
            .status()
            .await
            .context("Failed to run yt-dlp")?;
        check_status("yt-dlp", status)?;

        let items = self.collect_items(temp.path()).await?;
        if items.is_empty() {
            anyhow::bail!("No files were downloaded");
        }
        info!("Downloaded {} files. Combining...", items.len());

        let output = self
            .output_dir
            .join(format!("{}.{}", final_name, self.audio_format));
        self.concat(&items, temp.path(), &output).await?;

        let size = tokio::fs::metadata(&output).await?.len();
        info!("Combined into: {} ({})", output.display(), format_size(size));
        Ok(output)
    }

    /// Probe the playlist title without downloading anything
    async fn playlist_title(&self, url: &str) -> Result<String> {
        let output = Command::new(&self.tools.ytdlp)
            .args([
                "--flat-playlist",
                "--print",
                "%(playlist_title)s",
                "--playlist-items",
                "1",
            ])
            .arg(url)
            .output()
            .await
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            error!("{}", String::from_utf8_lossy(&output.stderr));
        }
        check_status("yt-dlp", output.status).context("Could not get playlist info")?;

        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if title.is_empty() || title == "NA" {
            anyhow::bail!("Could not determine playlist title; pass --name");
        }
        Ok(title)
    }

    /// Gather downloaded items in playlist order
    async fn collect_items(&self, dir: &std::path::Path) -> Result<Vec<PathBuf>> {
        let mut items = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .context("Failed to read temp directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_audio = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.audio_format));
            if is_audio {
                items.push(path);
            }
        }

        items.sort();
        Ok(items)
    }

    /// Merge items with the ffmpeg concat demuxer (stream copy, no re-encode)
    async fn concat(
        &self,
        items: &[PathBuf],
        temp_dir: &std::path::Path,
        output: &std::path::Path,
    ) -> Result<()> {
        let mut list = String::new();
        for item in items {
            // Concat list syntax wants single quotes escaped as '\''
            let escaped = item.to_string_lossy().replace('\'', "'\\''");
            list.push_str(&format!("file '{}'\n", escaped));
        }

        let list_file = temp_dir.join("concat.txt");
        tokio::fs::write(&list_file, list)
            .await
            .context("Failed to write concat list")?;

        let result = Command::new(&self.tools.ffmpeg)
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_file)
            .args(["-acodec", "copy", "-y"])
            .arg(output)
            .output()
            .await
            .context("Failed to run ffmpeg")?;

        if !result.status.success() {
            error!("{}", String::from_utf8_lossy(&result.stderr));
        }
        check_status("ffmpeg", result.status).context("Failed to combine playlist items")?;
        Ok(())
    }
}
