//! Player detection via mount-point markers
//!
//! The Innioasis Y1 exposes its card as plain mass storage, so detection
//! walks /media/<user>/<mount> looking for files the firmware leaves behind.

use anyhow::{Context, Result};
use nix::sys::statvfs::statvfs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker folder the Y1 firmware creates on the card
const Y1_MARKER: &str = "Android/data/com.innioasis.y1";

/// Theme assets shipped on Y1 cards, checked as a fallback
const Y1_THEME_FILES: &[&str] = &[
    "globalWallpaper.jpg",
    "UsbBackground.jpg",
    "desktopWallpaper.jpg",
];

/// Detected MP3 player mount
#[derive(Debug, Clone)]
pub struct Device {
    /// Volume label (mount directory name)
    pub label: String,
    /// Mount point path
    pub mount_point: PathBuf,
    /// Free space in bytes
    pub free_space: u64,
}

/// Detects mounted MP3 players
pub struct DeviceDetector;

impl DeviceDetector {
    /// Scan /media for recognizable player mounts
    pub fn scan() -> Result<Vec<Device>> {
        Self::scan_base(Path::new("/media"))
    }

    /// Return the first detected player, if any
    pub fn find_first() -> Result<Option<Device>> {
        Ok(Self::scan()?.into_iter().next())
    }

    fn scan_base(base: &Path) -> Result<Vec<Device>> {
        let mut devices = Vec::new();

        if !base.exists() {
            debug!("{} does not exist, no devices", base.display());
            return Ok(devices);
        }

        for user_dir in std::fs::read_dir(base)
            .with_context(|| format!("Failed to read {}", base.display()))?
            .flatten()
        {
            let user_path = user_dir.path();
            if !user_path.is_dir() {
                continue;
            }

            // Other users' media directories are typically unreadable
            let Ok(mounts) = std::fs::read_dir(&user_path) else {
                debug!("Cannot read {}, skipping", user_path.display());
                continue;
            };

            for mount in mounts.flatten() {
                let mount_point = mount.path();
                if !mount_point.is_dir() || !is_player_mount(&mount_point) {
                    continue;
                }

                let label = mount_point
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| "(no label)".to_string());

                let free_space = free_space(&mount_point).unwrap_or(0);
                debug!("Detected player at {}", mount_point.display());

                devices.push(Device {
                    label,
                    mount_point,
                    free_space,
                });
            }
        }

        debug!("Found {} player(s)", devices.len());
        Ok(devices)
    }
}

fn is_player_mount(mount_point: &Path) -> bool {
    if mount_point.join(Y1_MARKER).exists() {
        return true;
    }

    mount_point.join("Themes").is_dir()
        && Y1_THEME_FILES
            .iter()
            .any(|file| mount_point.join(file).exists())
}

/// Free space in bytes at a path
pub fn free_space(path: &Path) -> Result<u64> {
    let stat = statvfs(path)
        .with_context(|| format!("Failed to stat filesystem at {}", path.display()))?;
    Ok(stat.fragment_size() as u64 * stat.blocks_available() as u64)
}
