use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scanwalk::count::Count;
use scanwalk::scandir::Scandir;
use scanwalk::walk::Walk;
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::path::Path;

/// Same chain-shrinking fixture generator as `tests/common.rs`; kept as
/// a standalone copy since benches don't share a crate with tests.
fn build_fixture(root: &Path, dircnt: usize, depth: usize, filecnt: usize) {
    let mut depth_budget = depth;
    for dn in 0..dircnt {
        let mut dir_name = root.join(format!("dir{dn}"));
        for d in 0..depth_budget {
            std::fs::create_dir_all(&dir_name).unwrap();
            for fi in 0..filecnt {
                std::fs::write(dir_name.join(format!("file{fi}.bin")), [0u8; 64]).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.txt")), [0u8; 64]).unwrap();
                std::fs::write(dir_name.join(format!("file{fi}.log")), [0u8; 64]).unwrap();
            }
            dir_name = dir_name.join(format!("dir{d}"));
        }
        depth_budget = depth_budget.saturating_sub(1);
    }
}

fn bench_count(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    build_fixture(tmp.path(), 10, 3, 10);

    let mut group = c.benchmark_group("count");
    group.throughput(Throughput::Elements(180));

    for threads in [1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                let stats = Count::new(tmp.path())
                    .thread_count(NonZeroUsize::new(threads).unwrap())
                    .collect()
                    .unwrap();
                black_box(stats.files)
            });
        });
    }
    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    build_fixture(tmp.path(), 10, 3, 10);

    let mut group = c.benchmark_group("walk");
    group.throughput(Throughput::Elements(6));
    group.bench_function("collect_base", |b| {
        b.iter(|| {
            let (tocs, _stats) = Walk::new(tmp.path()).collect().unwrap();
            black_box(tocs.len())
        });
    });
    group.finish();
}

fn bench_scandir(c: &mut Criterion) {
    let tmp = tempfile::tempdir().unwrap();
    build_fixture(tmp.path(), 10, 3, 10);

    let mut group = c.benchmark_group("scandir");
    group.throughput(Throughput::Elements(186));
    group.bench_function("collect_ext", |b| {
        b.iter(|| {
            let (records, _stats) = Scandir::new(tmp.path())
                .return_type(scanwalk::ReturnType::Ext)
                .collect()
                .unwrap();
            black_box(records.len())
        });
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(20)
        .warm_up_time(std::time::Duration::from_millis(200))
        .measurement_time(std::time::Duration::from_secs(2));
    targets = bench_count, bench_walk, bench_scandir
}
criterion_main!(benches);
