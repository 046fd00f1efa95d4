use std::fs::Metadata;

/// The coarse classification [`Kind::from_symlink_metadata`] assigns to an entry.
///
/// Every non-dir, non-file, non-symlink type (FIFO, socket, block/char
/// device) is grouped under `Other` — finer-grained typing is a job for a
/// downstream encoder, not this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Dir,
    File,
    Symlink,
    Other,
}

impl Kind {
    /// Classify from a `symlink_metadata()`-style `Metadata` (never follows
    /// the link, matching invariant 4 in spec.md §3).
    #[must_use]
    #[inline]
    pub fn from_symlink_metadata(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Dir
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir => write!(f, "directory"),
            Self::File => write!(f, "file"),
            Self::Symlink => write!(f, "symlink"),
            Self::Other => write!(f, "other"),
        }
    }
}
