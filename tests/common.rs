//! Shared fixtures for the end-to-end traversal scenarios.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber once per test binary, gated by
/// `RUST_LOG`. Silent unless a caller sets the env var, so normal
/// `cargo test` runs stay quiet.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub struct TreeFixture {
    pub dir: TempDir,
}

impl TreeFixture {
    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

/// Reproduces the upstream `scandir-rs` fixture generator byte-for-byte,
/// including its incidental behavior: the inner loop variable shares its
/// name with the `depth` parameter, so each top-level directory's chain
/// is one level shorter than the last. With `(dircnt=10, depth=3,
/// filecnt=10)` only `dir0`/`dir1`/`dir2` ever get populated (chains of
/// length 3, 2 and 1), giving 6 directories and 180 zero-byte files
/// total — the exact numbers the canonical scenarios below assert on.
pub fn create_tree(dircnt: usize, depth: usize, filecnt: usize) -> TreeFixture {
    init_tracing();
    let tmp = tempfile::Builder::new()
        .prefix("scanwalk_")
        .tempdir()
        .expect("create temp root");

    let mut depth_budget = depth;
    for dn in 0..dircnt {
        let mut dir_name = tmp.path().join(format!("dir{dn}"));
        for d in 0..depth_budget {
            std::fs::create_dir_all(&dir_name).expect("create nested dir");
            for fi in 0..filecnt {
                std::fs::write(dir_name.join(format!("file{fi}.bin")), []).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.txt")), []).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.log")), []).unwrap();
            }
            dir_name = dir_name.join(format!("dir{d}"));
        }
        depth_budget = depth_budget.saturating_sub(1);
    }

    TreeFixture { dir: tmp }
}

pub fn tree10x3x10() -> TreeFixture {
    create_tree(10, 3, 10)
}

/// A tree shaped like `tree10x3x10` (6 directories, 3 file extensions
/// per directory) but with every file holding `bytes_per_file` bytes of
/// real content, so size/usage assertions don't depend on a
/// filesystem's empty-file block accounting.
pub fn sized_tree(bytes_per_file: usize) -> TreeFixture {
    init_tracing();
    let tmp = tempfile::Builder::new()
        .prefix("scanwalk_sized_")
        .tempdir()
        .expect("create temp root");
    let content = vec![b'x'; bytes_per_file];

    let mut depth_budget = 3usize;
    for dn in 0..10usize {
        let mut dir_name = tmp.path().join(format!("dir{dn}"));
        for d in 0..depth_budget {
            std::fs::create_dir_all(&dir_name).expect("create nested dir");
            for fi in 0..10usize {
                std::fs::write(dir_name.join(format!("file{fi}.bin")), &content).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.txt")), &content).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.log")), &content).unwrap();
            }
            dir_name = dir_name.join(format!("dir{d}"));
        }
        depth_budget = depth_budget.saturating_sub(1);
    }

    TreeFixture { dir: tmp }
}
