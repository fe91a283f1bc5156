// benches/blacklabel_bench.rs
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use walkdir::WalkDir;

use blacklabel::core::{
    Explorer, LocalFs, MemoryFs, TreeBuilder, TreePolicy, WorkspaceFolder, WorkspaceRootResolver,
    render_tree, snapshot,
};

// ---------- Fixture: synthetic markdown book reused across benches ----------
static FS_FIXTURE: Lazy<Fixture> = Lazy::new(|| {
    let tmp = TempDir::new().expect("tmp");
    let root = tmp.path().to_path_buf();

    for ch in 0..40 {
        let dir = root.join(format!("chapter_{ch:02}"));
        for s in 0..25 {
            write_file(&dir.join(format!("section_{s:02}.md")), "# section\n");
            if s % 5 == 0 {
                write_file(&dir.join(format!("section_{s:02}.assets/figure.png")), "");
            }
        }
        write_file(&dir.join("build.log"), "noise");
        write_file(&dir.join("draft/wip.md"), "# wip\n");
    }

    let file_count = WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count();

    Fixture {
        _tmp: tmp,
        root,
        file_count,
    }
});

struct Fixture {
    _tmp: TempDir, // keep alive
    root: PathBuf,
    file_count: usize,
}

fn write_file(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

// ---------- Benches ----------

fn bench_read_directory_local(c: &mut Criterion) {
    let fx = &*FS_FIXTURE;
    let rt = runtime();
    let builder = TreeBuilder::new(Arc::new(LocalFs));
    let chapter = fx.root.join("chapter_00");

    let mut g = c.benchmark_group("read_directory");
    g.sample_size(50);
    g.measurement_time(Duration::from_secs(4));

    g.bench_function("local_markdown_policy", |b| {
        b.iter(|| {
            let out = rt
                .block_on(builder.read_directory(black_box(&chapter), TreePolicy::markdown()))
                .unwrap();
            black_box(out.len())
        });
    });

    g.bench_function("local_unrestricted", |b| {
        b.iter(|| {
            let out = rt
                .block_on(builder.read_directory(black_box(&chapter), TreePolicy::unrestricted()))
                .unwrap();
            black_box(out.len())
        });
    });

    g.finish();
}

fn bench_read_directory_memory(c: &mut Criterion) {
    let rt = runtime();
    let memory = MemoryFs::new();
    for i in 0..2000 {
        memory.add_file(format!("/big/file_{i:04}.md"), 1).unwrap();
    }
    for i in 0..200 {
        memory.add_file(format!("/big/draft/d_{i:03}.md"), 1).unwrap();
    }
    let builder = TreeBuilder::new(Arc::new(memory));

    let mut g = c.benchmark_group("read_directory");
    g.throughput(Throughput::Elements(2200));
    g.bench_function("memory_wide_with_draft", |b| {
        b.iter(|| {
            let out = rt
                .block_on(builder.read_directory(Path::new("/big"), TreePolicy::markdown()))
                .unwrap();
            black_box(out.len())
        });
    });
    g.finish();
}

fn bench_full_snapshot(c: &mut Criterion) {
    let fx = &*FS_FIXTURE;
    let rt = runtime();

    let mut g = c.benchmark_group("explorer");
    g.sample_size(20);
    g.measurement_time(Duration::from_secs(8));
    g.throughput(Throughput::Elements(fx.file_count as u64));

    g.bench_function("snapshot_unbounded", |b| {
        b.iter_batched(
            || {
                Explorer::new(WorkspaceRootResolver::new(
                    TreeBuilder::new(Arc::new(LocalFs)),
                    Arc::new(vec![WorkspaceFolder::local(fx.root.clone())]),
                ))
            },
            |explorer| {
                let nodes = rt.block_on(snapshot(&explorer, None)).unwrap();
                black_box(nodes);
            },
            BatchSize::SmallInput,
        )
    });

    let explorer = Explorer::new(WorkspaceRootResolver::new(
        TreeBuilder::new(Arc::new(LocalFs)),
        Arc::new(vec![WorkspaceFolder::local(fx.root.clone())]),
    ));
    g.bench_function("render_tree_depth_1", |b| {
        b.iter(|| {
            let s = rt.block_on(render_tree(&explorer, Some(1))).unwrap();
            black_box(s);
        })
    });

    g.finish();
}

criterion_group!(
    benches,
    bench_read_directory_local,
    bench_read_directory_memory,
    bench_full_snapshot
);
criterion_main!(benches);
