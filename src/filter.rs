//! `FilterSpec` compilation and the include/exclude decision engine.
//!
//! Four glob lists, compiled once per [`crate::TaskHandle::start`], decide
//! whether a directory is descended and whether a file basename is
//! admitted. An empty list means "accept all"; a pattern that appears in
//! both an include and an exclude list loses — exclude always wins.

use crate::error::ConfigError;
use regex::Regex;

/// The four glob lists a traversal is configured with.
///
/// `dir_include`/`dir_exclude` match against the path relative to the
/// traversal root, with forward slashes regardless of platform.
/// `file_include`/`file_exclude` match against the file's basename only.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub dir_include: Vec<String>,
    pub dir_exclude: Vec<String>,
    pub file_include: Vec<String>,
    pub file_exclude: Vec<String>,
}

/// A compiled [`FilterSpec`], ready to answer descend/admit questions
/// without re-parsing glob patterns per entry.
#[derive(Debug, Default)]
pub(crate) struct PathFilter {
    dir_include: Vec<Regex>,
    dir_exclude: Vec<Regex>,
    file_include: Vec<Regex>,
    file_exclude: Vec<Regex>,
}

impl PathFilter {
    pub(crate) fn compile(spec: &FilterSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            dir_include: compile_dir_patterns(&spec.dir_include)?,
            dir_exclude: compile_dir_patterns(&spec.dir_exclude)?,
            file_include: compile_patterns(&spec.file_include)?,
            file_exclude: compile_patterns(&spec.file_exclude)?,
        })
    }

    /// Whether the directory at `rel_path` (root itself is `""`) should be
    /// opened and descended into. The root is never filtered out.
    pub(crate) fn should_descend(&self, rel_path: &str) -> bool {
        if rel_path.is_empty() {
            return true;
        }
        if matches_any(&self.dir_exclude, rel_path) {
            return false;
        }
        self.dir_include.is_empty() || matches_any(&self.dir_include, rel_path)
    }

    /// Whether a file with the given basename should be admitted into
    /// results / size accounting.
    pub(crate) fn admits_file(&self, basename: &str) -> bool {
        if matches_any(&self.file_exclude, basename) {
            return false;
        }
        self.file_include.is_empty() || matches_any(&self.file_include, basename)
    }
}

fn matches_any(patterns: &[Regex], candidate: &str) -> bool {
    patterns.iter().any(|re| re.is_match(candidate))
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_pattern(p)).collect()
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    crate::glob::glob_to_regex(pattern).map_err(|source| ConfigError::InvalidGlob {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Directory patterns additionally special-case a leading `**/` or a
/// trailing `/**`, so that e.g. `dir0/**` matches `dir0` itself as well
/// as everything below it — [`crate::glob::glob_to_regex`] on its own
/// never lets `*` cross a `/`, including when doubled.
fn compile_dir_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_dir_pattern(p)).collect()
}

fn compile_dir_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return widen(pattern, prefix, |body| format!("^{body}(?:/.*)?$"));
    }
    if let Some(suffix) = pattern.strip_prefix("**/") {
        return widen(pattern, suffix, |body| format!("^(?:.*/)?{body}$"));
    }
    if pattern == "**" {
        return Regex::new("^.*$").map_err(|err| ConfigError::InvalidGlob {
            pattern: pattern.to_owned(),
            source: crate::glob::Error::InvalidRegex("^.*$".to_owned(), err.to_string()),
        });
    }
    compile_pattern(pattern)
}

/// Compile `inner` to a regex, strip its `^`/`$` anchors, and rebuild a
/// widened pattern around the unanchored body via `wrap`.
fn widen(
    original_pattern: &str,
    inner: &str,
    wrap: impl FnOnce(&str) -> String,
) -> Result<Regex, ConfigError> {
    let inner_re = compile_pattern(inner)?;
    let body = inner_re
        .as_str()
        .strip_prefix('^')
        .and_then(|s| s.strip_suffix('$'))
        .unwrap_or_else(|| inner_re.as_str());
    let widened = wrap(body);
    Regex::new(&widened).map_err(|err| ConfigError::InvalidGlob {
        pattern: original_pattern.to_owned(),
        source: crate::glob::Error::InvalidRegex(widened, err.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::{FilterSpec, PathFilter};

    #[test]
    fn empty_spec_accepts_everything() {
        let filter = PathFilter::compile(&FilterSpec::default()).unwrap();
        assert!(filter.should_descend("dir0/dir1"));
        assert!(filter.admits_file("anything.bin"));
    }

    #[test]
    fn trailing_double_star_matches_prefix_and_descendants() {
        let spec = FilterSpec {
            dir_include: vec!["dir0/**".to_owned()],
            ..FilterSpec::default()
        };
        let filter = PathFilter::compile(&spec).unwrap();
        assert!(filter.should_descend("dir0"));
        assert!(filter.should_descend("dir0/dir1"));
        assert!(!filter.should_descend("dir1"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let spec = FilterSpec {
            file_include: vec!["*.bin".to_owned()],
            file_exclude: vec!["*.bin".to_owned()],
            ..FilterSpec::default()
        };
        let filter = PathFilter::compile(&spec).unwrap();
        assert!(!filter.admits_file("archive.bin"));
    }

    #[test]
    fn root_is_never_filtered_out() {
        let spec = FilterSpec {
            dir_exclude: vec!["**".to_owned()],
            ..FilterSpec::default()
        };
        let filter = PathFilter::compile(&spec).unwrap();
        assert!(filter.should_descend(""));
    }
}
