//! The Count operation: subtree statistics with no per-entry delivery.

use crate::error::ConfigError;
use crate::filter::{FilterSpec, PathFilter};
use crate::home::expand_tilde;
use crate::pool::{NullSink, Sink};
use crate::task::{ReturnType, TaskHandle, default_thread_count};
use crate::Statistics;
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

/// Aggregate `dirs`/`files`/`size`/... over a rooted subtree, producing no
/// per-entry records.
pub struct Count;

impl Count {
    /// Start a [`CountBuilder`] rooted at `root`.
    pub fn new<A: AsRef<OsStr>>(root: A) -> CountBuilder {
        CountBuilder::new(root)
    }
}

/// Builder for a Count traversal.
pub struct CountBuilder {
    root: PathBuf,
    return_type: ReturnType,
    filter: FilterSpec,
    thread_count: NonZeroUsize,
}

impl CountBuilder {
    fn new<A: AsRef<OsStr>>(root: A) -> Self {
        Self {
            root: PathBuf::from(root.as_ref()),
            return_type: ReturnType::Ext,
            filter: FilterSpec::default(),
            thread_count: default_thread_count(),
        }
    }

    /// Statistics always carry `size`/`usage`, since `Count`'s only
    /// output is the aggregate itself and those fields are cheap to keep
    /// once the directory is already being enumerated — unlike Walk and
    /// Scandir, `Base` vs `Ext` makes no observable difference for Count
    /// beyond hardlink deduplication accounting. Defaults to `Ext`.
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
    pub fn build(self) -> Result<TaskHandle<()>, ConfigError> {
        if matches!(self.return_type, ReturnType::Walk) {
            return Err(ConfigError::InvalidReturnType);
        }
        let root = expand_tilde(&self.root)?;
        let filter = Arc::new(PathFilter::compile(&self.filter)?);
        // Count always tracks size/usage/hardlinks regardless of return_type
        // — see the `return_type` doc comment above.
        let ext_mode = true;
        Ok(TaskHandle::new(
            root,
            self.thread_count,
            filter,
            ext_mode,
            false,
            |_sender| Arc::new(NullSink) as Arc<dyn Sink>,
        ))
    }

    /// `build()` then run to completion, the common case for a one-shot
    /// count.
    ///
    /// # Errors
    /// Propagates [`CountBuilder::build`]'s errors.
    pub fn collect(self) -> Result<Statistics, ConfigError> {
        let handle = self.build()?;
        let (_records, stats) = handle.collect()?;
        Ok(stats)
    }
}
