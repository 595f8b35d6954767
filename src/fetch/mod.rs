//! Audio fetching via yt-dlp and ffmpeg

mod downloader;
mod splitter;

pub use downloader::{DownloadRequest, Fetcher};
