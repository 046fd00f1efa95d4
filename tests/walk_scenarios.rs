//! Canonical Walk scenario over the shrinking-chain fixture tree.

mod common;

use scanwalk::walk::Walk;
use scanwalk::ReturnType;

#[test]
fn scenario_6_walk_ext_has_no_symlinks_other_or_errors() {
    let tree = common::tree10x3x10();
    let (tocs, stats) = Walk::new(tree.root())
        .return_type(ReturnType::Ext)
        .collect()
        .unwrap();

    assert!(stats.errors.is_empty());
    assert!(tocs.iter().all(|toc| toc.other.is_empty()));
    assert!(tocs.iter().all(|toc| toc.symlinks.is_empty()));
    assert!(tocs.iter().all(|toc| toc.errors.is_empty()));

    assert_eq!(tocs.len(), 7, "one Toc per visited directory, root included");
    let total_dirs: usize = tocs.iter().map(|toc| toc.dirs.len()).sum();
    let total_files: usize = tocs.iter().map(|toc| toc.files.len()).sum();
    assert_eq!(total_dirs, 6);
    assert_eq!(total_files, 180);
}

#[test]
fn walk_base_omits_symlinks_other_and_errors_fields() {
    let tree = common::tree10x3x10();
    let (tocs, _stats) = Walk::new(tree.root())
        .return_type(ReturnType::Base)
        .collect()
        .unwrap();

    for toc in &tocs {
        assert!(toc.symlinks.is_empty());
        assert!(toc.other.is_empty());
        assert!(toc.errors.is_empty());
    }
    let total_files: usize = tocs.iter().map(|toc| toc.files.len()).sum();
    assert_eq!(total_files, 180);
}

#[test]
fn toc_coverage_matches_basenames_after_filtering() {
    let tree = common::tree10x3x10();
    let (tocs, _stats) = Walk::new(tree.root())
        .return_type(ReturnType::Ext)
        .filter(scanwalk::FilterSpec {
            file_include: vec!["*.bin".to_owned()],
            ..Default::default()
        })
        .collect()
        .unwrap();

    assert!(tocs.iter().flat_map(|t| t.files.iter()).all(|f| f.ends_with(".bin")));
    let total: usize = tocs.iter().map(|t| t.files.len()).sum();
    assert_eq!(total, 60);
}
