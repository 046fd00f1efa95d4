use core::fmt;
use std::path::PathBuf;

/// Fatal configuration failure, surfaced to the caller at `start()`/`build()`.
///
/// Never produced mid-traversal: once a [`crate::TaskHandle`] is running,
/// every per-entry failure becomes a [`ProbeError`] instead.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The root path does not exist, or is not a directory.
    NotADirectory(PathBuf),
    /// A glob pattern in a [`crate::FilterSpec`] list failed to compile.
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// The underlying compiler error.
        source: crate::glob::Error,
    },
    /// The requested [`crate::ReturnType`] is not valid for this operation.
    ///
    /// Scandir rejects [`crate::ReturnType::Walk`] with this variant; the
    /// message text must contain the literal phrase the original Python
    /// implementation raises, so downstream callers matching on string
    /// content keep working.
    InvalidReturnType,
    /// The task was already started; `start()` requires `Fresh`.
    AlreadyStarted,
    /// `~` expansion was requested but no home directory could be resolved.
    NoHomeDirectory,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADirectory(path) => {
                write!(f, "root path is not a directory: {}", path.display())
            }
            Self::InvalidGlob { pattern, source } => {
                write!(f, "invalid glob pattern {pattern:?}: {source}")
            }
            Self::InvalidReturnType => {
                write!(f, "Parameter return_type has invalid value")
            }
            Self::AlreadyStarted => write!(f, "task has already been started"),
            Self::NoHomeDirectory => write!(f, "could not resolve home directory for ~ expansion"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGlob { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A non-fatal, per-entry failure recorded into `Statistics.errors` and,
/// for Walk-Ext, into the owning directory's `Toc.errors`.
///
/// Never aborts traversal — see spec §7, "errors are data, not control
/// flow".
#[derive(Debug)]
pub struct ProbeError {
    /// Path of the entry (or directory) the failure occurred on.
    pub path: PathBuf,
    /// Human-readable reason, normally an `io::Error`'s `Display` output.
    pub reason: String,
}

impl ProbeError {
    pub(crate) fn new(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Render as `"<path>: <reason>"`, the wire format spec.md §6 requires.
    #[must_use]
    pub fn to_message(&self) -> String {
        format!("{}: {}", self.path.display(), self.reason)
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_message())
    }
}

impl std::error::Error for ProbeError {}
