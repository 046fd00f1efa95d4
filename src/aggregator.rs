//! Lock-protected statistics accumulation and hardlink deduplication.

use dashmap::DashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

/// Subtree-wide counters, as returned by [`crate::count::Count`] and
/// carried alongside every [`crate::walk::Walk`]/[`crate::scandir::Scandir`]
/// run.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub dirs: u64,
    pub files: u64,
    pub slinks: u64,
    pub hlinks: u64,
    pub devices: u64,
    pub pipes: u64,
    pub size: u64,
    pub usage: u64,
    pub errors: Vec<String>,
    pub duration: f64,
}

impl Statistics {
    /// A scalar-only snapshot, keyed the way callers comparing against a
    /// plain mapping expect. `errors` and `duration` are excluded since
    /// neither is a directly comparable count.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<&'static str, u64> {
        BTreeMap::from([
            ("dirs", self.dirs),
            ("files", self.files),
            ("slinks", self.slinks),
            ("hlinks", self.hlinks),
            ("devices", self.devices),
            ("pipes", self.pipes),
            ("size", self.size),
            ("usage", self.usage),
        ])
    }
}

/// Per-directory counters a worker accumulates locally while enumerating
/// one directory, then submits to the [`Aggregator`] with a single lock
/// acquisition — the "batch-per-directory" discipline that keeps lock
/// contention proportional to directory count, not entry count.
#[derive(Debug, Default)]
pub(crate) struct DirectoryTally {
    pub(crate) dirs: u64,
    pub(crate) files: u64,
    pub(crate) slinks: u64,
    pub(crate) hlinks: u64,
    pub(crate) devices: u64,
    pub(crate) pipes: u64,
    pub(crate) size: u64,
    pub(crate) usage: u64,
    pub(crate) errors: Vec<String>,
}

#[derive(Debug, Default)]
struct Counts {
    dirs: u64,
    files: u64,
    slinks: u64,
    hlinks: u64,
    devices: u64,
    pipes: u64,
    size: u64,
    usage: u64,
    errors: Vec<String>,
}

/// A lock-protected `Statistics` plus a monotonic start instant, and the
/// hardlink set used in `Ext` mode.
pub(crate) struct Aggregator {
    counts: Mutex<Counts>,
    start: Instant,
    finished_at: Mutex<Option<Instant>>,
    inodes: DashSet<(u64, u64)>,
}

impl Aggregator {
    pub(crate) fn new() -> Self {
        Self {
            counts: Mutex::new(Counts::default()),
            start: Instant::now(),
            finished_at: Mutex::new(None),
            inodes: DashSet::new(),
        }
    }

    /// Record that `(dev, ino)` was just seen with `nlink > 1`. Returns
    /// `true` the first time a tuple is seen, `false` on every subsequent
    /// sighting — callers use this to decide whether to count the entry
    /// towards `hlinks` and whether to skip re-adding its `size`/`usage`.
    pub(crate) fn first_sighting(&self, dev: u64, ino: u64) -> bool {
        self.inodes.insert((dev, ino))
    }

    pub(crate) fn commit(&self, tally: DirectoryTally) {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        counts.dirs += tally.dirs;
        counts.files += tally.files;
        counts.slinks += tally.slinks;
        counts.hlinks += tally.hlinks;
        counts.devices += tally.devices;
        counts.pipes += tally.pipes;
        counts.size += tally.size;
        counts.usage += tally.usage;
        counts.errors.extend(tally.errors);
    }

    pub(crate) fn mark_finished(&self) {
        let mut finished_at = self
            .finished_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if finished_at.is_none() {
            *finished_at = Some(Instant::now());
        }
    }

    pub(crate) fn snapshot(&self) -> Statistics {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let finished_at = *self
            .finished_at
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let duration = finished_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.start)
            .as_secs_f64();
        Statistics {
            dirs: counts.dirs,
            files: counts.files,
            slinks: counts.slinks,
            hlinks: counts.hlinks,
            devices: counts.devices,
            pipes: counts.pipes,
            size: counts.size,
            usage: counts.usage,
            errors: counts.errors.clone(),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Aggregator, DirectoryTally};

    #[test]
    fn commit_accumulates_across_directories() {
        let agg = Aggregator::new();
        agg.commit(DirectoryTally {
            dirs: 1,
            files: 10,
            ..DirectoryTally::default()
        });
        agg.commit(DirectoryTally {
            dirs: 2,
            files: 5,
            ..DirectoryTally::default()
        });
        let stats = agg.snapshot();
        assert_eq!(stats.dirs, 3);
        assert_eq!(stats.files, 15);
    }

    #[test]
    fn first_sighting_is_true_only_once() {
        let agg = Aggregator::new();
        assert!(agg.first_sighting(1, 42));
        assert!(!agg.first_sighting(1, 42));
        assert!(agg.first_sighting(1, 43));
    }

    #[test]
    fn duration_freezes_after_mark_finished() {
        let agg = Aggregator::new();
        agg.mark_finished();
        let first = agg.snapshot().duration;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = agg.snapshot().duration;
        assert_eq!(first, second);
    }
}
