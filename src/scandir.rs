//! The Scandir operation: one record per surviving entry in the subtree.

use crate::Statistics;
use crate::error::ConfigError;
use crate::filter::{FilterSpec, PathFilter};
use crate::home::expand_tilde;
use crate::metadata::{DirEntryBase, DirEntryExt};
use crate::pool::{DirOutcome, Sink};
use crate::task::{ReturnType, TaskHandle, default_thread_count};
use crossbeam_channel::Sender;
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

/// A single surviving entry, shaped by the operation's `return_type`.
#[derive(Debug, Clone)]
pub enum ScandirRecord {
    Base(DirEntryBase),
    Ext(DirEntryExt),
}

/// Scan a rooted subtree, emitting one [`ScandirRecord`] per surviving
/// entry. The root directory itself is never emitted.
pub struct Scandir;

impl Scandir {
    /// Start a [`ScandirBuilder`] rooted at `root`.
    pub fn new<A: AsRef<OsStr>>(root: A) -> ScandirBuilder {
        ScandirBuilder::new(root)
    }
}

/// Builder for a Scandir traversal.
pub struct ScandirBuilder {
    root: PathBuf,
    return_type: ReturnType,
    filter: FilterSpec,
    thread_count: NonZeroUsize,
}

impl ScandirBuilder {
    fn new<A: AsRef<OsStr>>(root: A) -> Self {
        Self {
            root: PathBuf::from(root.as_ref()),
            return_type: ReturnType::Base,
            filter: FilterSpec::default(),
            thread_count: default_thread_count(),
        }
    }

    /// `Base` emits [`ScandirRecord::Base`], `Ext` emits
    /// [`ScandirRecord::Ext`]. [`ReturnType::Walk`] is rejected at
    /// `build()` — Scandir has no table-of-contents grouping. Defaults
    /// to `Base`.
    #[must_use]
    pub const fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Include/exclude glob lists, defaults to unrestricted.
    #[must_use]
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Number of worker threads, defaults to `available_parallelism()`.
    #[must_use]
    pub const fn thread_count(mut self, thread_count: NonZeroUsize) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Validates configuration and returns a not-yet-started [`TaskHandle`].
    ///
    /// # Errors
    /// [`ConfigError::InvalidReturnType`] if `return_type` is
    /// [`ReturnType::Walk`]; [`ConfigError::NotADirectory`] if the root
    /// does not resolve to a directory; [`ConfigError::InvalidGlob`] if a
    /// filter pattern fails to compile; [`ConfigError::NoHomeDirectory`]
    /// if the root used `~` expansion with no resolvable home.
    pub fn build(self) -> Result<TaskHandle<ScandirRecord>, ConfigError> {
        if matches!(self.return_type, ReturnType::Walk) {
            return Err(ConfigError::InvalidReturnType);
        }
        let root = expand_tilde(&self.root)?;
        let filter = Arc::new(PathFilter::compile(&self.filter)?);
        let ext_mode = matches!(self.return_type, ReturnType::Ext);
        Ok(TaskHandle::new(
            root,
            self.thread_count,
            filter,
            ext_mode,
            true,
            move |sender: Sender<ScandirRecord>| {
                Arc::new(ScandirSink { sender, ext_mode }) as Arc<dyn Sink>
            },
        ))
    }

    /// `build()` then run to completion, returning every record alongside
    /// the final statistics.
    ///
    /// # Errors
    /// Propagates [`ScandirBuilder::build`]'s errors.
    pub fn collect(self) -> Result<(Vec<ScandirRecord>, Statistics), ConfigError> {
        self.build()?.collect()
    }
}

struct ScandirSink {
    sender: Sender<ScandirRecord>,
    ext_mode: bool,
}

impl Sink for ScandirSink {
    fn accept(&self, outcome: DirOutcome) {
        for entry in outcome.entries {
            let record = if self.ext_mode {
                ScandirRecord::Ext(entry.ext)
            } else {
                ScandirRecord::Base(entry.ext.base)
            };
            let _ = self.sender.send(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Scandir, ScandirRecord};

    #[test]
    fn emits_one_record_per_entry_and_skips_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();

        let (records, stats) = Scandir::new(tmp.path()).collect().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(stats.files, 1);
        assert_eq!(stats.dirs, 1);
        assert!(records.iter().all(|r| matches!(r, ScandirRecord::Base(_))));
    }

    #[test]
    fn ext_return_type_yields_ext_records() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hi").unwrap();

        let (records, _stats) = Scandir::new(tmp.path())
            .return_type(crate::ReturnType::Ext)
            .collect()
            .unwrap();
        assert!(matches!(records.as_slice(), [ScandirRecord::Ext(_)]));
    }

    #[test]
    fn rejects_walk_return_type() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Scandir::new(tmp.path())
            .return_type(crate::ReturnType::Walk)
            .build();
        assert!(matches!(result, Err(crate::ConfigError::InvalidReturnType)));
    }
}
