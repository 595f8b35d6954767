//! Configuration loading
//!
//! Settings live in a flat JSON document at ~/.config/ripsync/config.json
//! (overridable with --config). A missing default file yields defaults so the
//! tool works out of the box.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::RipsyncError;

/// Audio formats we download and sync
pub const ACCEPTED_FORMATS: &[&str] = &["mp3", "m4a", "wav", "flac", "ogg"];

/// User configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where downloads land (default: ~/Music)
    pub download_directory: Option<PathBuf>,
    /// Fallback sync target when no player is detected
    pub sync_directory: Option<PathBuf>,
    /// Audio format passed to yt-dlp --audio-format
    pub audio_format: String,
    /// Quality passed to yt-dlp --audio-quality ("0" = best)
    pub audio_quality: String,
    /// URLs consumed by the `run` command
    pub urls: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_directory: None,
            sync_directory: None,
            audio_format: "mp3".to_string(),
            audio_quality: "0".to_string(),
            urls: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration, preferring an explicitly passed file
    ///
    /// An explicit path that is missing or malformed is an error; the default
    /// location is allowed to be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(RipsyncError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    ))
                    .into());
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    debug!("No config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid JSON in config file {}", path.display()))?;

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default config file location
    fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("ripsync").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if !ACCEPTED_FORMATS.contains(&self.audio_format.as_str()) {
            return Err(RipsyncError::Config(format!(
                "unsupported audio_format '{}' (expected one of: {})",
                self.audio_format,
                ACCEPTED_FORMATS.join(", ")
            ))
            .into());
        }
        Ok(())
    }

    /// Resolved download directory
    pub fn download_dir(&self) -> PathBuf {
        self.download_directory
            .clone()
            .or_else(dirs::audio_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.audio_quality, "0");
        assert!(config.urls.is_empty());
        assert!(config.sync_directory.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "download_directory": "/tmp/music",
                "sync_directory": "/tmp/device",
                "audio_format": "m4a",
                "audio_quality": "192",
                "urls": ["https://example.com/watch?v=a", "https://example.com/watch?v=b"]
            }}"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/music"));
        assert_eq!(config.sync_directory, Some(PathBuf::from("/tmp/device")));
        assert_eq!(config.audio_format, "m4a");
        assert_eq!(config.audio_quality, "192");
        assert_eq!(config.urls.len(), 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"urls": ["https://example.com/watch?v=x"]}}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.urls.len(), 1);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/ripsync.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"audio_format": "aiff"}}"#).unwrap();

        let result = Config::load(Some(file.path()));
        assert!(result.is_err());
    }
}
