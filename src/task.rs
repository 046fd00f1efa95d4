//! The `Fresh → Running → (Stopping →) Finished` lifecycle every operation
//! facade is built on.

use crate::aggregator::{Aggregator, Statistics};
use crate::error::ConfigError;
use crate::filter::PathFilter;
use crate::pool::{self, Sink, TraversalConfig};
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicBool, Ordering};
use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Which shape of record (and metadata depth) a traversal emits.
///
/// Not every operation accepts every variant — Scandir rejects `Walk` at
/// [`TaskHandle::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Base,
    Ext,
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Fresh,
    Running,
    Stopping,
    Finished,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A background traversal and its lifecycle controls.
///
/// `T` is the record type a single traversal directory contributes —
/// [`crate::Toc`] for Walk, a Scandir record enum for Scandir, and `()`
/// (never produced) for Count.
pub struct TaskHandle<T: Send + 'static> {
    root: PathBuf,
    thread_count: NonZeroUsize,
    filter: Arc<PathFilter>,
    ext_mode: bool,
    collect_entries: bool,
    aggregator: Arc<Aggregator>,
    state: Mutex<TaskState>,
    receiver: Mutex<Option<Receiver<T>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    stop_flag: Mutex<Option<Arc<AtomicBool>>>,
    #[allow(clippy::type_complexity)]
    sink_factory: Mutex<Option<Box<dyn FnOnce(Sender<T>) -> Arc<dyn Sink> + Send>>>,
}

/// Channel capacity is a small multiple of the worker count, matching the
/// bounded-channel-for-backpressure shape the worker pool's result
/// delivery already uses.
const CHANNEL_FACTOR: usize = 4;

/// The default thread count every facade builder starts from: the
/// number of available hardware threads, falling back to one.
pub(crate) fn default_thread_count() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::new(1).unwrap())
}

impl<T: Send + 'static> TaskHandle<T> {
    pub(crate) fn new(
        root: PathBuf,
        thread_count: NonZeroUsize,
        filter: Arc<PathFilter>,
        ext_mode: bool,
        collect_entries: bool,
        sink_factory: impl FnOnce(Sender<T>) -> Arc<dyn Sink> + Send + 'static,
    ) -> Self {
        Self {
            root,
            thread_count,
            filter,
            ext_mode,
            collect_entries,
            aggregator: Arc::new(Aggregator::new()),
            state: Mutex::new(TaskState::Fresh),
            receiver: Mutex::new(None),
            handles: Mutex::new(Vec::new()),
            stop_flag: Mutex::new(None),
            sink_factory: Mutex::new(Some(Box::new(sink_factory))),
        }
    }

    /// Transitions `Fresh` → `Running` and spawns the worker pool.
    ///
    /// # Errors
    /// [`ConfigError::AlreadyStarted`] if not `Fresh`; [`ConfigError::NotADirectory`]
    /// if the root does not resolve to a directory.
    pub fn start(&self) -> Result<(), ConfigError> {
        let mut state = lock(&self.state);
        if *state != TaskState::Fresh {
            return Err(ConfigError::AlreadyStarted);
        }
        if !self.root.is_dir() {
            return Err(ConfigError::NotADirectory(self.root.clone()));
        }

        let capacity = self.thread_count.get().saturating_mul(CHANNEL_FACTOR).max(1);
        let (sender, receiver) = crossbeam_channel::bounded(capacity);

        let sink_factory = lock(&self.sink_factory)
            .take()
            .expect("sink_factory consumed only once, guarded by Fresh state");
        let sink = sink_factory(sender);

        let config = TraversalConfig {
            thread_count: self.thread_count,
            filter: Arc::clone(&self.filter),
            ext_mode: self.ext_mode,
            collect_entries: self.collect_entries,
        };
        let (handles, stop_flag) =
            pool::spawn(self.root.clone(), config, Arc::clone(&self.aggregator), sink);

        *lock(&self.receiver) = Some(receiver);
        *lock(&self.handles) = handles;
        *lock(&self.stop_flag) = Some(stop_flag);
        *state = TaskState::Running;
        tracing::trace!(root = %self.root.display(), threads = self.thread_count.get(), "traversal started");
        Ok(())
    }

    /// True iff the task is currently `Running`.
    #[must_use]
    pub fn busy(&self) -> bool {
        *lock(&self.state) == TaskState::Running
    }

    /// Requests cooperative cancellation and blocks until `Finished`.
    /// Idempotent: calling it on a `Fresh` or already-`Finished` task is a
    /// no-op.
    pub fn stop(&self) {
        {
            let mut state = lock(&self.state);
            match *state {
                TaskState::Fresh | TaskState::Finished => return,
                TaskState::Running => *state = TaskState::Stopping,
                TaskState::Stopping => {}
            }
        }
        if let Some(flag) = lock(&self.stop_flag).clone() {
            flag.store(true, Ordering::Relaxed);
        }
        self.join_handles();
        self.aggregator.mark_finished();
        *lock(&self.state) = TaskState::Finished;
        tracing::debug!("traversal stopped");
    }

    /// Blocks until `Finished` without requesting cancellation.
    pub fn join(&self) {
        {
            let state = lock(&self.state);
            if matches!(*state, TaskState::Fresh | TaskState::Finished) {
                return;
            }
        }
        self.join_handles();
        self.aggregator.mark_finished();
        *lock(&self.state) = TaskState::Finished;
    }

    /// Joins every worker thread, concurrently draining whatever the
    /// workers still have queued on the bounded delivery channel. Workers
    /// call `Sender::send`, which blocks once the channel is full rather
    /// than failing — without a concurrent drain, a worker can block
    /// forever on a full channel while this thread waits on `join()`,
    /// deadlocking `stop()`/`join()` on any tree wider than the channel's
    /// capacity. The drain thread exits once the last sender (held by the
    /// sink, dropped as the last worker finishes) closes the channel.
    fn join_handles(&self) {
        let handles = std::mem::take(&mut *lock(&self.handles));
        let drain = lock(&self.receiver)
            .clone()
            .map(|receiver| std::thread::spawn(move || for _ in receiver.iter() {}));
        for handle in handles {
            drop(handle.join());
        }
        if let Some(drain) = drain {
            drop(drain.join());
        }
    }

    /// A non-blocking snapshot of whatever records are currently
    /// buffered in the delivery channel; safe to call concurrently with
    /// running workers.
    #[must_use]
    pub fn results(&self) -> Vec<T> {
        lock(&self.receiver)
            .clone()
            .map(|receiver| receiver.try_iter().collect())
            .unwrap_or_default()
    }

    /// `start()` if `Fresh`, then blocks until every record has been
    /// produced, then returns them alongside the final statistics.
    ///
    /// # Errors
    /// Propagates [`TaskHandle::start`]'s errors.
    pub fn collect(&self) -> Result<(Vec<T>, Statistics), ConfigError> {
        if *lock(&self.state) == TaskState::Fresh {
            self.start()?;
        }
        let records = self.iter().collect();
        self.join();
        Ok((records, self.statistics()))
    }

    /// Yields records one at a time; blocks while the channel is empty and
    /// the task is still running, ends once the task is finished and the
    /// channel has been drained.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'static {
        lock(&self.receiver)
            .clone()
            .into_iter()
            .flat_map(|receiver| receiver)
    }

    /// A snapshot of the current running (or final) statistics.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.aggregator.snapshot()
    }

    /// True iff any record is currently buffered in the delivery channel.
    #[must_use]
    pub fn has_results(&self) -> bool {
        lock(&self.receiver)
            .as_ref()
            .is_some_and(|receiver| receiver.len() > 0)
    }

    /// True iff the statistics error list is non-empty.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.statistics().errors.is_empty()
    }

    /// Flat scalar mapping of the current statistics, for value comparison.
    #[must_use]
    pub fn as_dict(&self) -> BTreeMap<&'static str, u64> {
        self.statistics().as_map()
    }
}

/// RAII scoped acquisition: entering the scope calls `start()`, and
/// whatever way the scope is exited (return, early `?`, panic unwind)
/// calls `stop()` unconditionally.
pub struct ScopedTask<'handle, T: Send + 'static> {
    handle: &'handle TaskHandle<T>,
}

impl<'handle, T: Send + 'static> ScopedTask<'handle, T> {
    /// # Errors
    /// Propagates [`TaskHandle::start`]'s errors; the scope is not entered
    /// on failure, so no `stop()` call follows.
    pub fn enter(handle: &'handle TaskHandle<T>) -> Result<Self, ConfigError> {
        handle.start()?;
        Ok(Self { handle })
    }
}

impl<T: Send + 'static> Drop for ScopedTask<'_, T> {
    fn drop(&mut self) {
        self.handle.stop();
    }
}

impl<T: Send + 'static> std::ops::Deref for ScopedTask<'_, T> {
    type Target = TaskHandle<T>;

    fn deref(&self) -> &Self::Target {
        self.handle
    }
}
