//! External tool discovery
//!
//! yt-dlp, ffmpeg and ffprobe are opaque collaborators. We look them up on
//! PATH first, then in ~/.local/bin where the install one-liners put them.

use std::path::PathBuf;
use std::process::ExitStatus;
use tracing::debug;

use crate::error::RipsyncError;

const YTDLP_INSTALL_HINT: &str = "curl -L https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp -o ~/.local/bin/yt-dlp && chmod +x ~/.local/bin/yt-dlp";

const FFMPEG_INSTALL_HINT: &str = "curl -L https://johnvansickle.com/ffmpeg/releases/ffmpeg-release-amd64-static.tar.xz -o /tmp/ffmpeg.tar.xz && tar -xf /tmp/ffmpeg.tar.xz -C /tmp && cp /tmp/ffmpeg-*-amd64-static/ffmpeg /tmp/ffmpeg-*-amd64-static/ffprobe ~/.local/bin/";

/// Resolved paths to the required external binaries
#[derive(Debug, Clone)]
pub struct ExternalTools {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ExternalTools {
    /// Locate all required tools, failing before any operation is attempted
    pub fn locate() -> Result<Self, RipsyncError> {
        Ok(Self {
            ytdlp: find_tool("yt-dlp", YTDLP_INSTALL_HINT)?,
            ffmpeg: find_tool("ffmpeg", FFMPEG_INSTALL_HINT)?,
            ffprobe: find_tool("ffprobe", FFMPEG_INSTALL_HINT)?,
        })
    }
}

fn find_tool(name: &'static str, install_hint: &'static str) -> Result<PathBuf, RipsyncError> {
    if let Ok(path) = which::which(name) {
        debug!("Found {} at {}", name, path.display());
        return Ok(path);
    }

    if let Some(home) = dirs::home_dir() {
        let local = home.join(".local").join("bin").join(name);
        if local.exists() {
            debug!("Found {} at {}", name, local.display());
            return Ok(local);
        }
    }

    Err(RipsyncError::MissingDependency { tool: name, install_hint })
}

/// Turn a non-zero exit status into a SubprocessFailure
pub fn check_status(tool: &str, status: ExitStatus) -> Result<(), RipsyncError> {
    if status.success() {
        Ok(())
    } else {
        Err(RipsyncError::Subprocess {
            tool: tool.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_carries_remediation() {
        let err = find_tool("definitely-not-a-real-binary-xyz", "install me like so").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("definitely-not-a-real-binary-xyz"));
        assert!(message.contains("install me like so"));
    }
}
