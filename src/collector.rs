//! Result record shapes for [`crate::walk::Walk`] and [`crate::scandir::Scandir`].
//!
//! `Count` needs nothing beyond an [`crate::aggregator::Aggregator`]. Walk
//! and Scandir each have one record type, pushed one whole directory at a
//! time over the bounded channel `crate::pool` and `crate::task` share —
//! the channel's own internal synchronization *is* the "lock-protected
//! queue with condition-variable-backed delivery" this crate needs; a
//! second buffer duplicating the same data would just be bookkeeping for
//! its own sake.

use serde::Serialize;

/// One visited directory's table of contents.
///
/// Under `ReturnType::Base` the worker pool simply never appends to
/// `symlinks`/`other`/`errors` here (those entries still reach
/// [`crate::aggregator::Statistics`] globally) — the fields always exist
/// on the type, population is what varies by return type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Toc {
    pub root: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    pub symlinks: Vec<String>,
    pub other: Vec<String>,
    pub errors: Vec<String>,
}
