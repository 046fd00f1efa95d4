//! The work-stealing traversal core shared by Count, Walk and Scandir.
//!
//! One directory is one [`DirJob`]. A fixed pool of OS threads pulls jobs
//! from a work-stealing deque, probes each entry with exactly one
//! `metadata()` call, commits the directory's tally to the shared
//! [`Aggregator`], and hands whatever the operation cares about to a
//! [`Sink`]. Cancellation is cooperative: workers only check the shared
//! flag at directory boundaries, so an in-flight probe always finishes.

use crate::aggregator::{Aggregator, DirectoryTally};
use crate::error::ProbeError;
use crate::filter::PathFilter;
use crate::kind::Kind;
use crate::metadata::DirEntryExt;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use crossbeam_deque::{Injector, Steal, Stealer, Worker};
use std::fs::Metadata;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One directory still waiting to be opened and enumerated.
#[derive(Clone)]
pub(crate) struct DirJob {
    pub(crate) abs_path: PathBuf,
    /// Forward-slash path relative to the traversal root; `""` for the root.
    pub(crate) rel_path: String,
}

/// One surviving entry within an opened directory, already probed.
pub(crate) struct ProbedEntry {
    pub(crate) kind: Kind,
    pub(crate) basename: String,
    pub(crate) ext: DirEntryExt,
}

/// Everything one successfully-opened directory contributed, handed to the
/// operation-specific [`Sink`] after the shared tally has already been
/// committed to the [`Aggregator`].
pub(crate) struct DirOutcome {
    pub(crate) rel_path: String,
    pub(crate) abs_path: PathBuf,
    pub(crate) dir_names: Vec<String>,
    pub(crate) file_names: Vec<String>,
    pub(crate) symlink_names: Vec<String>,
    pub(crate) other_names: Vec<String>,
    pub(crate) errors: Vec<String>,
    /// Every surviving entry, in OS order. Only populated when the
    /// operation asked for it via [`TraversalConfig::collect_entries`].
    pub(crate) entries: Vec<ProbedEntry>,
}

/// What an operation does with a completed directory's contribution,
/// beyond the statistics accounting `pool` already performs for every
/// operation uniformly.
pub(crate) trait Sink: Send + Sync {
    fn accept(&self, outcome: DirOutcome);
}

/// A `Sink` that does nothing — Count needs only the `Aggregator`.
pub(crate) struct NullSink;

impl Sink for NullSink {
    fn accept(&self, _outcome: DirOutcome) {}
}

pub(crate) struct TraversalConfig {
    pub(crate) thread_count: NonZeroUsize,
    pub(crate) filter: Arc<PathFilter>,
    /// Whether hardlink deduplication and symlink/other Toc population are
    /// active (`ReturnType::Ext`).
    pub(crate) ext_mode: bool,
    /// Whether to build the per-entry `entries` vector (Scandir only).
    pub(crate) collect_entries: bool,
}

/// Spawns the worker pool and returns the join handles plus the shared
/// shutdown flag the caller uses to request cancellation.
pub(crate) fn spawn(
    root: PathBuf,
    config: TraversalConfig,
    aggregator: Arc<Aggregator>,
    sink: Arc<dyn Sink>,
) -> (Vec<JoinHandle<()>>, Arc<AtomicBool>) {
    let thread_count = config.thread_count.get();
    let config = Arc::new(config);

    let injector = Arc::new(Injector::new());
    let pending = Arc::new(AtomicUsize::new(1));
    let stop_flag = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::with_capacity(thread_count);
    let mut stealers = Vec::with_capacity(thread_count);
    for _ in 0..thread_count {
        let worker = Worker::new_lifo();
        stealers.push(worker.stealer());
        workers.push(worker);
    }
    let stealers = Arc::new(stealers);

    injector.push(DirJob {
        abs_path: root,
        rel_path: String::new(),
    });

    let mut handles = Vec::with_capacity(thread_count);
    for (index, worker) in workers.into_iter().enumerate() {
        let config = Arc::clone(&config);
        let aggregator = Arc::clone(&aggregator);
        let sink = Arc::clone(&sink);
        let injector = Arc::clone(&injector);
        let pending = Arc::clone(&pending);
        let stop_flag = Arc::clone(&stop_flag);
        let stealers = Arc::clone(&stealers);

        handles.push(thread::spawn(move || {
            let local_stealers: Vec<Stealer<DirJob>> = stealers
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != index)
                .map(|(_, stealer)| stealer.clone())
                .collect();

            loop {
                if stop_flag.load(Ordering::Relaxed) && worker.is_empty() && injector.is_empty() {
                    break;
                }

                let Some(job) = find_job(&worker, &injector, &local_stealers) else {
                    if stop_flag.load(Ordering::Relaxed) {
                        break;
                    }
                    thread::yield_now();
                    continue;
                };

                let _guard = PendingGuard::new(&pending, &stop_flag);

                if stop_flag.load(Ordering::Relaxed) {
                    continue;
                }

                process_directory(job, &config, &aggregator, sink.as_ref(), &worker, &pending);
            }
        }));
    }

    (handles, stop_flag)
}

fn find_job(
    local: &Worker<DirJob>,
    injector: &Injector<DirJob>,
    stealers: &[Stealer<DirJob>],
) -> Option<DirJob> {
    if let Some(job) = local.pop() {
        return Some(job);
    }

    loop {
        match injector.steal_batch_and_pop(local) {
            Steal::Success(job) => return Some(job),
            Steal::Retry => continue,
            Steal::Empty => {}
        }

        let mut retry = false;
        for stealer in stealers {
            match stealer.steal() {
                Steal::Success(job) => return Some(job),
                Steal::Retry => retry = true,
                Steal::Empty => {}
            }
        }

        if !retry {
            return None;
        }
    }
}

struct PendingGuard<'guard> {
    pending: &'guard AtomicUsize,
    stop_flag: &'guard AtomicBool,
}

impl<'guard> PendingGuard<'guard> {
    const fn new(pending: &'guard AtomicUsize, stop_flag: &'guard AtomicBool) -> Self {
        Self { pending, stop_flag }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let remaining = self.pending.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining == 0 {
            self.stop_flag.store(true, Ordering::Relaxed);
        }
    }
}

fn process_directory(
    job: DirJob,
    config: &TraversalConfig,
    aggregator: &Aggregator,
    sink: &dyn Sink,
    local: &Worker<DirJob>,
    pending: &AtomicUsize,
) {
    let read_dir = match std::fs::read_dir(&job.abs_path) {
        Ok(read_dir) => read_dir,
        Err(error) => {
            let message = ProbeError::new(&job.abs_path, error).to_message();
            aggregator.commit(DirectoryTally {
                errors: vec![message],
                ..DirectoryTally::default()
            });
            tracing::debug!(path = %job.abs_path.display(), "failed to open directory");
            return;
        }
    };

    let mut tally = DirectoryTally::default();
    let mut outcome = DirOutcome {
        rel_path: job.rel_path.clone(),
        abs_path: job.abs_path.clone(),
        dir_names: Vec::new(),
        file_names: Vec::new(),
        symlink_names: Vec::new(),
        other_names: Vec::new(),
        errors: Vec::new(),
        entries: Vec::new(),
    };

    for entry in read_dir {
        let dir_entry = match entry {
            Ok(dir_entry) => dir_entry,
            Err(error) => {
                let message = ProbeError::new(&job.abs_path, error).to_message();
                tally.errors.push(message.clone());
                outcome.errors.push(message);
                continue;
            }
        };

        let abs_path = dir_entry.path();
        let basename = dir_entry.file_name().to_string_lossy().into_owned();
        let rel_path = if job.rel_path.is_empty() {
            basename.clone()
        } else {
            format!("{}/{basename}", job.rel_path)
        };

        let meta = match dir_entry.metadata() {
            Ok(meta) => meta,
            Err(error) => {
                let message = ProbeError::new(&abs_path, error).to_message();
                tally.errors.push(message.clone());
                outcome.errors.push(message);
                continue;
            }
        };

        let kind = Kind::from_symlink_metadata(&meta);
        let ext = DirEntryExt::from_metadata(abs_path.to_string_lossy().into_owned(), kind, &meta);

        match kind {
            Kind::Dir => {
                if !config.filter.should_descend(&rel_path) {
                    continue;
                }
                tally.dirs += 1;
                outcome.dir_names.push(basename.clone());
                pending.fetch_add(1, Ordering::Relaxed);
                local.push(DirJob {
                    abs_path: abs_path.clone(),
                    rel_path: rel_path.clone(),
                });
            }
            Kind::File => {
                if !config.filter.admits_file(&basename) {
                    continue;
                }
                tally.files += 1;
                outcome.file_names.push(basename.clone());
                account_file(&mut tally, aggregator, config.ext_mode, &ext);
            }
            Kind::Symlink => {
                tally.slinks += 1;
                if config.ext_mode {
                    outcome.symlink_names.push(basename.clone());
                }
            }
            Kind::Other => {
                if is_device(&meta) {
                    tally.devices += 1;
                } else if is_pipe(&meta) {
                    tally.pipes += 1;
                }
                if config.ext_mode {
                    outcome.other_names.push(basename.clone());
                }
            }
        }

        if config.collect_entries {
            outcome.entries.push(ProbedEntry {
                kind,
                basename,
                ext,
            });
        }
    }

    aggregator.commit(tally);
    sink.accept(outcome);
}

fn account_file(
    tally: &mut DirectoryTally,
    aggregator: &Aggregator,
    ext_mode: bool,
    ext: &DirEntryExt,
) {
    if !ext_mode {
        return;
    }
    if ext.nlink > 1 {
        if aggregator.first_sighting(ext.dev, ext.ino) {
            tally.size += u64::try_from(ext.size).unwrap_or(0);
            tally.usage += u64::try_from(ext.blocks.saturating_mul(512)).unwrap_or(0);
        } else {
            tally.hlinks += 1;
        }
    } else {
        tally.size += u64::try_from(ext.size).unwrap_or(0);
        tally.usage += u64::try_from(ext.blocks.saturating_mul(512)).unwrap_or(0);
    }
}

#[cfg(unix)]
fn is_device(meta: &Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt as _;
    let file_type = meta.file_type();
    file_type.is_block_device() || file_type.is_char_device()
}

#[cfg(not(unix))]
fn is_device(_meta: &Metadata) -> bool {
    false
}

#[cfg(unix)]
fn is_pipe(meta: &Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt as _;
    let file_type = meta.file_type();
    file_type.is_fifo() || file_type.is_socket()
}

#[cfg(not(unix))]
fn is_pipe(_meta: &Metadata) -> bool {
    false
}
