//! Cross-cutting invariants of the traversal engine, each as a direct
//! assertion against a small, purpose-built tree (the canonical
//! `tree10x3x10` fixture is reused where it's the natural fit).

mod common;

use scanwalk::count::Count;
use scanwalk::scandir::Scandir;
use scanwalk::walk::Walk;
use scanwalk::{FilterSpec, ReturnType, TaskHandle};

fn small_tree_no_links() -> common::TreeFixture {
    let tmp = tempfile::Builder::new()
        .prefix("scanwalk_props_")
        .tempdir()
        .unwrap();
    std::fs::create_dir(tmp.path().join("a")).unwrap();
    std::fs::create_dir(tmp.path().join("b")).unwrap();
    std::fs::write(tmp.path().join("root.txt"), b"root").unwrap();
    std::fs::write(tmp.path().join("a/one.txt"), b"one").unwrap();
    std::fs::write(tmp.path().join("a/two.log"), b"two").unwrap();
    std::fs::write(tmp.path().join("b/three.bin"), b"three").unwrap();
    common::TreeFixture { dir: tmp }
}

#[test]
fn property_1_count_conservation() {
    let tree = small_tree_no_links();
    let stats = Count::new(tree.root()).collect().unwrap();
    let (records, _) = Scandir::new(tree.root())
        .return_type(ReturnType::Ext)
        .collect()
        .unwrap();

    let lhs = stats.dirs + stats.files + stats.slinks + stats.devices + stats.pipes;
    assert_eq!(lhs as usize, records.len());
}

#[test]
fn property_2_toc_coverage() {
    let tree = small_tree_no_links();
    let (tocs, _) = Walk::new(tree.root()).collect().unwrap();

    let mut from_toc: Vec<String> = tocs.iter().flat_map(|t| t.files.clone()).collect();
    from_toc.sort();

    let mut expected = vec![
        "root.txt".to_owned(),
        "one.txt".to_owned(),
        "two.log".to_owned(),
        "three.bin".to_owned(),
    ];
    expected.sort();

    assert_eq!(from_toc, expected);
}

#[test]
fn property_3_filter_monotonicity() {
    let tree = common::tree10x3x10();

    let narrow = Count::new(tree.root())
        .filter(FilterSpec {
            file_include: vec!["*.bin".to_owned()],
            ..Default::default()
        })
        .collect()
        .unwrap();

    let wide = Count::new(tree.root()).collect().unwrap();

    assert!(narrow.files <= wide.files);
    assert!(narrow.dirs <= wide.dirs);
}

#[test]
fn property_4_exclude_wins_over_include() {
    let tree = small_tree_no_links();
    let stats = Count::new(tree.root())
        .filter(FilterSpec {
            file_include: vec!["*.txt".to_owned()],
            file_exclude: vec!["*.txt".to_owned()],
            ..Default::default()
        })
        .collect()
        .unwrap();
    assert_eq!(stats.files, 0);
}

#[test]
fn property_5_collect_after_drain_is_idempotent() {
    let tree = small_tree_no_links();
    let handle = Walk::new(tree.root()).build().unwrap();
    let (first_records, first_stats) = handle.collect().unwrap();
    assert!(!first_records.is_empty());

    // Re-collecting after the channel has drained and the task has
    // finished: statistics stay available, no records are re-emitted.
    let second_stats = handle.statistics();
    assert_eq!(first_stats.dirs, second_stats.dirs);
    assert_eq!(first_stats.files, second_stats.files);
    assert!(handle.results().is_empty());
}

#[test]
fn property_6_cancellation_safety() {
    let tree = common::tree10x3x10();
    let handle = Count::new(tree.root()).build().unwrap();
    handle.start().unwrap();
    handle.stop();

    let before = handle.statistics();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let after = handle.statistics();

    assert_eq!(before.dirs, after.dirs);
    assert_eq!(before.files, after.files);
    assert!(!handle.busy());
}

#[test]
fn property_7_scoped_cleanup_on_early_return() {
    let tree = small_tree_no_links();
    let handle = Count::new(tree.root()).build().unwrap();

    fn run_scope(handle: &TaskHandle<()>) -> Option<()> {
        let _scope = scanwalk::ScopedTask::enter(handle).ok()?;
        return None; // force an early return out of the scope
    }

    let _ = run_scope(&handle);
    assert!(!handle.busy());
}

#[test]
fn filter_empty_spec_is_unrestricted() {
    let tree = small_tree_no_links();
    let unfiltered = Count::new(tree.root()).collect().unwrap();
    let explicit_empty = Count::new(tree.root())
        .filter(FilterSpec::default())
        .collect()
        .unwrap();
    assert_eq!(unfiltered.files, explicit_empty.files);
    assert_eq!(unfiltered.dirs, explicit_empty.dirs);
}

#[test]
fn nonexistent_root_fails_at_start() {
    let handle = Count::new("/this/path/does/not/exist/hopefully").build().unwrap();
    assert!(handle.start().is_err());
}
