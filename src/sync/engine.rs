//! Sync engine: scan both trees, compute a plan, apply it
//!
//! Everything is sequential: one file copies at a time so progress reflects a
//! single active transfer. Individual copy/delete failures are recorded and
//! the run continues; the report carries the tally.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::plan::{compute_plan, MediaFile, PlannedCopy, SyncPlan};
use crate::config::ACCEPTED_FORMATS;

/// Library subfolder routed to its own folder on the target
const AUDIOBOOKS_DIR: &str = "Audiobooks";

/// Suffix for in-flight copies, renamed into place once complete
const PARTIAL_SUFFIX: &str = ".ripsync-part";

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Result of applying a sync plan
#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: usize,
    pub updated: usize,
    pub removed: usize,
    /// Per-file failures (relative path, error message)
    pub failures: Vec<(PathBuf, String)>,
}

/// Outcome of a full reconcile run
#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing to do
    AlreadyInSync,
    /// Operator declined the plan; no mutation happened
    Rejected,
    /// Plan was applied
    Applied(SyncReport),
}

/// Reconciles a target tree with the local library
pub struct SyncEngine {
    source_root: PathBuf,
    target_root: PathBuf,
}

impl SyncEngine {
    pub fn new(source_root: PathBuf, target_root: PathBuf) -> Self {
        Self {
            source_root,
            target_root,
        }
    }

    /// Scan both trees and compute the plan
    pub async fn plan(&self) -> Result<SyncPlan> {
        let source = scan_tree(&self.source_root)
            .await
            .context("Failed to scan library")?;
        let target = scan_tree(&self.target_root)
            .await
            .context("Failed to scan sync target")?;

        debug!(
            "Scanned {} library file(s), {} target file(s)",
            source.len(),
            target.len()
        );
        Ok(compute_plan(&source, &target))
    }

    /// Compute the plan, ask for confirmation, then apply
    ///
    /// The confirmation callback receives the plan so presentation and
    /// prompting stay out of the reconciliation logic.
    pub async fn reconcile<F>(&self, confirm: F) -> Result<SyncOutcome>
    where
        F: FnOnce(&SyncPlan) -> Result<bool>,
    {
        let plan = self.plan().await?;

        if plan.is_empty() {
            return Ok(SyncOutcome::AlreadyInSync);
        }
        if !confirm(&plan)? {
            return Ok(SyncOutcome::Rejected);
        }

        let report = self.apply(&plan).await?;
        Ok(SyncOutcome::Applied(report))
    }

    /// Apply a plan: copy additions and updates, delete removals
    pub async fn apply(&self, plan: &SyncPlan) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for copy in &plan.additions {
            match self.copy_file(copy).await {
                Ok(()) => report.copied += 1,
                Err(e) => {
                    warn!("Failed to copy {}: {:#}", copy.rel_path.display(), e);
                    report.failures.push((copy.rel_path.clone(), format!("{e:#}")));
                }
            }
        }

        for copy in &plan.updates {
            match self.copy_file(copy).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!("Failed to update {}: {:#}", copy.rel_path.display(), e);
                    report.failures.push((copy.rel_path.clone(), format!("{e:#}")));
                }
            }
        }

        for rel_path in &plan.removals {
            let target = self.target_root.join(rel_path);
            match fs::remove_file(&target).await {
                Ok(()) => {
                    info!("Deleted: {}", rel_path.display());
                    report.removed += 1;
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", rel_path.display(), e);
                    report.failures.push((rel_path.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Copy one file through a temporary name, renaming into place at the end
    ///
    /// An interrupted copy leaves only a `.ripsync-part` file, never a
    /// truncated final one; the temp file is removed on failure.
    async fn copy_file(&self, copy: &PlannedCopy) -> Result<()> {
        let dest = self.target_root.join(&copy.rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut partial_name = dest.file_name().unwrap_or_default().to_os_string();
        partial_name.push(PARTIAL_SUFFIX);
        let partial = dest.with_file_name(partial_name);

        // Hidden automatically when stderr is not a terminal
        let progress = ProgressBar::new(copy.size);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        progress.set_message(copy.rel_path.display().to_string());

        let result = stream_copy(&copy.source, &partial, &progress).await;
        progress.finish_and_clear();

        match result {
            Ok(()) => {
                fs::rename(&partial, &dest)
                    .await
                    .with_context(|| format!("Failed to move {} into place", dest.display()))?;
                info!("Copied: {}", copy.rel_path.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

async fn stream_copy(source: &Path, dest: &Path, progress: &ProgressBar) -> Result<()> {
    let mut src = fs::File::open(source)
        .await
        .with_context(|| format!("Failed to open {}", source.display()))?;
    let mut dst = fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = src.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        dst.write_all(&buffer[..read]).await?;
        progress.inc(read as u64);
    }
    dst.flush().await?;
    Ok(())
}

/// Enumerate audio files in a tree: the root area plus the Audiobooks subfolder
///
/// Scanning is shallow per area; players present a flat music list and a
/// dedicated audiobook folder, nothing deeper.
async fn scan_tree(root: &Path) -> Result<BTreeMap<PathBuf, MediaFile>> {
    let mut files = BTreeMap::new();
    scan_area(root, Path::new(""), &mut files).await?;

    let audiobooks = root.join(AUDIOBOOKS_DIR);
    if audiobooks.is_dir() {
        scan_area(&audiobooks, Path::new(AUDIOBOOKS_DIR), &mut files).await?;
    }

    Ok(files)
}

async fn scan_area(
    dir: &Path,
    prefix: &Path,
    files: &mut BTreeMap<PathBuf, MediaFile>,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = entry.metadata().await?;
        if !metadata.is_file() || !is_audio_file(&path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        files.insert(
            prefix.join(name),
            MediaFile {
                path: path.clone(),
                size: metadata.len(),
            },
        );
    }

    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ACCEPTED_FORMATS
                .iter()
                .any(|format| ext.eq_ignore_ascii_case(format))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn write_file(path: &Path, contents: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(path, contents).await.unwrap();
    }

    async fn tree_names(root: &Path) -> Vec<PathBuf> {
        scan_tree(root).await.unwrap().into_keys().collect()
    }

    #[tokio::test]
    async fn test_scan_routes_audiobooks() {
        let temp = tempfile::tempdir().unwrap();
        write_file(&temp.path().join("song.mp3"), b"a").await;
        write_file(&temp.path().join("Audiobooks/story.mp3"), b"b").await;
        write_file(&temp.path().join("notes.txt"), b"c").await;
        // Deeper folders are out of scope
        write_file(&temp.path().join("Covers/art.mp3"), b"d").await;

        let names = tree_names(temp.path()).await;
        assert_eq!(
            names,
            vec![
                PathBuf::from("Audiobooks/story.mp3"),
                PathBuf::from("song.mp3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_makes_target_match_source() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("a.mp3"), b"aaaa").await;
        write_file(&source.path().join("b.mp3"), b"bb").await;
        write_file(&target.path().join("b.mp3"), b"bb").await;
        write_file(&target.path().join("c.mp3"), b"cc").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let plan = engine.plan().await.unwrap();
        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.removals.len(), 1);
        assert_eq!(plan.unchanged, 1);

        let report = engine.apply(&plan).await.unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(report.removed, 1);
        assert!(report.failures.is_empty());

        let names = tree_names(target.path()).await;
        assert_eq!(names, vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")]);
        assert_eq!(
            fs::read(target.path().join("a.mp3")).await.unwrap(),
            b"aaaa"
        );

        // Idempotence: a second run has nothing to do
        let plan = engine.plan().await.unwrap();
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_changed_file() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("a.mp3"), b"new longer contents").await;
        write_file(&target.path().join("a.mp3"), b"old").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let plan = engine.plan().await.unwrap();
        assert_eq!(plan.updates.len(), 1);

        let report = engine.apply(&plan).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(
            fs::read(target.path().join("a.mp3")).await.unwrap(),
            b"new longer contents"
        );
    }

    #[tokio::test]
    async fn test_rejection_leaves_target_unchanged() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("a.mp3"), b"a").await;
        write_file(&target.path().join("c.mp3"), b"c").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let outcome = engine.reconcile(|_| Ok(false)).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Rejected));

        let names = tree_names(target.path()).await;
        assert_eq!(names, vec![PathBuf::from("c.mp3")]);
    }

    #[tokio::test]
    async fn test_reconcile_confirmed_applies() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("Audiobooks/story.mp3"), b"tale").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let outcome = engine.reconcile(|plan| {
            assert_eq!(plan.additions.len(), 1);
            Ok(true)
        })
        .await
        .unwrap();

        let SyncOutcome::Applied(report) = outcome else {
            panic!("expected plan to be applied");
        };
        assert_eq!(report.copied, 1);
        assert!(target.path().join("Audiobooks/story.mp3").exists());
    }

    #[tokio::test]
    async fn test_in_sync_trees_report_already_in_sync() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("a.mp3"), b"a").await;
        write_file(&target.path().join("a.mp3"), b"a").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let outcome = engine
            .reconcile(|_| panic!("confirmation must not run for an empty plan"))
            .await
            .unwrap();
        assert!(matches!(outcome, SyncOutcome::AlreadyInSync));
    }

    #[tokio::test]
    async fn test_delete_failure_is_isolated() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        write_file(&source.path().join("a.mp3"), b"a").await;
        write_file(&target.path().join("gone.mp3"), b"x").await;

        let engine = SyncEngine::new(
            source.path().to_path_buf(),
            target.path().to_path_buf(),
        );

        let mut plan = engine.plan().await.unwrap();
        // Simulate a file that vanished between scan and apply
        plan.removals.push(PathBuf::from("never-existed.mp3"));

        let report = engine.apply(&plan).await.unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, PathBuf::from("never-existed.mp3"));
    }
}
