//! The Walk operation: one `Toc` (table of contents) per visited directory.

use crate::Statistics;
use crate::collector::Toc;
use crate::error::ConfigError;
use crate::filter::{FilterSpec, PathFilter};
use crate::home::expand_tilde;
use crate::pool::{DirOutcome, Sink};
use crate::task::{ReturnType, TaskHandle, default_thread_count};
use crossbeam_channel::Sender;
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

/// Walk a rooted subtree, emitting one [`Toc`] per directory as it's
/// opened and enumerated.
pub struct Walk;

impl Walk {
    /// Start a [`WalkBuilder`] rooted at `root`.
    pub fn new<A: AsRef<OsStr>>(root: A) -> WalkBuilder {
        WalkBuilder::new(root)
    }
}

/// Builder for a Walk traversal.
pub struct WalkBuilder {
    root: PathBuf,
    return_type: ReturnType,
    filter: FilterSpec,
    thread_count: NonZeroUsize,
}

impl WalkBuilder {
    fn new<A: AsRef<OsStr>>(root: A) -> Self {
        Self {
            root: PathBuf::from(root.as_ref()),
            return_type: ReturnType::Base,
            filter: FilterSpec::default(),
            thread_count: default_thread_count(),
        }
    }

    /// `Base` leaves `symlinks`/`other`/`errors` on each `Toc` empty;
    /// `Ext` populates them and enables hardlink deduplication in the
    /// accompanying statistics. Defaults to `Base`.
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
    pub fn build(self) -> Result<TaskHandle<Toc>, ConfigError> {
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
            false,
            move |sender: Sender<Toc>| Arc::new(WalkSink { sender }) as Arc<dyn Sink>,
        ))
    }

    /// `build()` then run to completion, returning every `Toc` alongside
    /// the final statistics.
    ///
    /// # Errors
    /// Propagates [`WalkBuilder::build`]'s errors.
    pub fn collect(self) -> Result<(Vec<Toc>, Statistics), ConfigError> {
        self.build()?.collect()
    }
}

struct WalkSink {
    sender: Sender<Toc>,
}

impl Sink for WalkSink {
    fn accept(&self, outcome: DirOutcome) {
        let toc = Toc {
            root: outcome.rel_path,
            dirs: outcome.dir_names,
            files: outcome.file_names,
            symlinks: outcome.symlink_names,
            other: outcome.other_names,
            errors: outcome.errors,
        };
        // Blocks if the channel is momentarily full; only errors once the
        // receiver side is gone, which only happens once the task is
        // fully joined and no longer draining.
        let _ = self.sender.send(toc);
    }
}
