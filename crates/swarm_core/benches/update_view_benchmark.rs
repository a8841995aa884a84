//! # Update View Benchmark
//!
//! Measures the per-frame cost of rebuilding instance buffers against the
//! recording host:
//! 1. Rebuild-every-frame (release + allocate + upload per attribute)
//! 2. Grow-only (upload into retained buffers)
//! 3. Draw submission after a rebuild
//!
//! The recording host copies bytes into CPU memory, so numbers here are an
//! upper bound on the bookkeeping overhead, not on GPU upload bandwidth.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use swarm_core::recording::{RecordingHost, RecordingMaterial, RecordingMesh};
use swarm_core::{
    share_material, BufferPolicy, Color, InstanceArrays, InstanceLayout, InstanceSet,
    InstancingConfig, Vec3,
};

fn make_set(layout: InstanceLayout, policy: BufferPolicy) -> InstanceSet<RecordingHost> {
    let config = InstancingConfig {
        buffer_policy: policy,
        ..InstancingConfig::for_layout(layout)
    };
    InstanceSet::new(
        config,
        Arc::new(RecordingMesh::cube()),
        share_material(RecordingMaterial::default()),
    )
    .expect("cube has submesh 0")
}

fn grid(count: usize) -> Vec<Vec3> {
    let side = (count as f32).sqrt().ceil() as usize;
    (0..count)
        .map(|i| Vec3::new((i % side) as f32, 0.0, (i / side) as f32))
        .collect()
}

/// Colored layout: 28 bytes per instance
fn bench_update_colored(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_view_colored");

    for count in [1_000usize, 10_000, 100_000] {
        let positions = grid(count);
        let colors = vec![Color::WHITE; count];
        group.throughput(Throughput::Bytes((count * 28) as u64));

        for (name, policy) in [
            ("rebuild", BufferPolicy::RebuildEveryFrame),
            ("grow_only", BufferPolicy::GrowOnly),
        ] {
            let mut host = RecordingHost::new();
            let mut set = make_set(InstanceLayout::Colored, policy);

            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, _| {
                b.iter(|| {
                    let arrays = InstanceArrays::colored(&positions, &colors);
                    set.update_view(&mut host, black_box(&arrays)).unwrap();
                });
            });

            set.shutdown(&mut host);
        }
    }

    group.finish();
}

/// Transformed layout: 52 bytes per instance
fn bench_update_transformed(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_view_transformed");

    for count in [1_000usize, 10_000, 100_000] {
        let positions = grid(count);
        let rotations = vec![Vec3::ZERO; count];
        let sizes = vec![Vec3::ONE; count];
        let colors = vec![Color::WHITE; count];
        group.throughput(Throughput::Bytes((count * 52) as u64));

        let mut host = RecordingHost::new();
        let mut set = make_set(InstanceLayout::Transformed, BufferPolicy::RebuildEveryFrame);

        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, _| {
            b.iter(|| {
                let arrays = InstanceArrays::transformed(&positions, &rotations, &sizes, &colors);
                set.update_view(&mut host, black_box(&arrays)).unwrap();
            });
        });

        set.shutdown(&mut host);
    }

    group.finish();
}

/// Full frame: update then draw
fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let count = 10_000;
    let positions = grid(count);
    let colors = vec![Color::WHITE; count];

    let mut host = RecordingHost::new();
    let mut set = make_set(InstanceLayout::Colored, BufferPolicy::GrowOnly);

    group.bench_function("update_and_draw_10k", |b| {
        b.iter(|| {
            let arrays = InstanceArrays::colored(&positions, &colors);
            set.update_view(&mut host, &arrays).unwrap();
            black_box(set.draw(&mut host).unwrap());
            // Keep the draw log from growing across iterations
            host.clear_events();
        });
    });

    set.shutdown(&mut host);
    group.finish();
}

criterion_group!(
    benches,
    bench_update_colored,
    bench_update_transformed,
    bench_frame,
);
criterion_main!(benches);
