//! Sync plan computation
//!
//! A plan is a plain set difference over two directory listings, computed
//! fresh on every run and never persisted.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A file in the library or on the target
///
/// Identity is the path relative to the tree root; the filesystem provides
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Absolute path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// A file scheduled to be copied to the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    /// Path relative to both roots
    pub rel_path: PathBuf,
    /// Absolute source path
    pub source: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Additions, updates and removals needed to make the target match the library
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Present in the library, absent on the target
    pub additions: Vec<PlannedCopy>,
    /// Present on both but with differing sizes
    pub updates: Vec<PlannedCopy>,
    /// Present on the target, absent in the library (relative paths)
    pub removals: Vec<PathBuf>,
    /// Files already in sync
    pub unchanged: usize,
}

impl SyncPlan {
    /// True when nothing would change
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.updates.is_empty() && self.removals.is_empty()
    }

    /// Total bytes the copy phase would transfer
    pub fn bytes_to_copy(&self) -> u64 {
        self.additions
            .iter()
            .chain(self.updates.iter())
            .map(|copy| copy.size)
            .sum()
    }
}

/// Compute the plan to reconcile `target` with `source`
///
/// additions = S − T, removals = T − S; files present in both sides with
/// differing sizes become updates. The three sets are mutually exclusive by
/// construction. BTreeMap keys give deterministic ordering.
pub fn compute_plan(
    source: &BTreeMap<PathBuf, MediaFile>,
    target: &BTreeMap<PathBuf, MediaFile>,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (rel_path, file) in source {
        let copy = PlannedCopy {
            rel_path: rel_path.clone(),
            source: file.path.clone(),
            size: file.size,
        };
        match target.get(rel_path) {
            None => plan.additions.push(copy),
            Some(existing) if existing.size != file.size => plan.updates.push(copy),
            Some(_) => plan.unchanged += 1,
        }
    }

    for rel_path in target.keys() {
        if !source.contains_key(rel_path) {
            plan.removals.push(rel_path.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(entries: &[(&str, u64)]) -> BTreeMap<PathBuf, MediaFile> {
        entries
            .iter()
            .map(|(name, size)| {
                (
                    PathBuf::from(name),
                    MediaFile {
                        path: PathBuf::from("/root").join(name),
                        size: *size,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_set_difference() {
        let source = listing(&[("a.mp3", 10), ("b.mp3", 20)]);
        let target = listing(&[("b.mp3", 20), ("c.mp3", 30)]);

        let plan = compute_plan(&source, &target);

        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.additions[0].rel_path, PathBuf::from("a.mp3"));
        assert_eq!(plan.removals, vec![PathBuf::from("c.mp3")]);
        assert_eq!(plan.unchanged, 1);
        assert!(plan.updates.is_empty());
    }

    #[test]
    fn test_categories_are_disjoint() {
        let source = listing(&[("a.mp3", 1), ("b.mp3", 2), ("c.mp3", 3)]);
        let target = listing(&[("b.mp3", 99), ("c.mp3", 3), ("d.mp3", 4)]);

        let plan = compute_plan(&source, &target);

        let added: Vec<_> = plan.additions.iter().map(|c| &c.rel_path).collect();
        let updated: Vec<_> = plan.updates.iter().map(|c| &c.rel_path).collect();
        for path in &added {
            assert!(!updated.contains(path));
            assert!(!plan.removals.contains(path));
        }
        for path in &updated {
            assert!(!plan.removals.contains(path));
        }
    }

    #[test]
    fn test_size_mismatch_is_update() {
        let source = listing(&[("a.mp3", 100)]);
        let target = listing(&[("a.mp3", 50)]);

        let plan = compute_plan(&source, &target);
        assert!(plan.additions.is_empty());
        assert!(plan.removals.is_empty());
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.bytes_to_copy(), 100);
    }

    #[test]
    fn test_identical_trees_yield_empty_plan() {
        let source = listing(&[("a.mp3", 1), ("Audiobooks/b.mp3", 2)]);
        let plan = compute_plan(&source, &source.clone());
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 2);
    }

    #[test]
    fn test_subfolder_identity() {
        let source = listing(&[("Audiobooks/story.mp3", 10)]);
        let target = listing(&[("story.mp3", 10)]);

        let plan = compute_plan(&source, &target);
        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.removals.len(), 1);
    }

    #[test]
    fn test_empty_sides() {
        let empty = BTreeMap::new();
        let files = listing(&[("a.mp3", 1)]);

        let plan = compute_plan(&empty, &files);
        assert_eq!(plan.removals.len(), 1);
        assert!(plan.additions.is_empty());

        let plan = compute_plan(&files, &empty);
        assert_eq!(plan.additions.len(), 1);
        assert!(plan.removals.is_empty());
    }
}
