// Copyright 2025 the Copperline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

use copperline_geom::{Seg, Vec2};
use copperline_world::{
    CollisionFilter, Item, KindMask, LayerRange, Probe, Segment, World,
};

const PITCH: i64 = 10_000;
const WIDTH: i64 = 1_000;

fn grid_world(n: i64) -> World {
    let mut world = World::new();
    for row in 0..n {
        let y = row * PITCH;
        for col in 0..n {
            let x = col * PITCH;
            let _ = world.add_segment(
                Segment::new(
                    Seg::new(Vec2::new(x, y), Vec2::new(x + PITCH, y)),
                    WIDTH,
                    row as i32,
                    LayerRange::single(0),
                ),
                false,
            );
        }
    }
    world
}

fn bench_query_colliding(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_colliding");
    for &n in &[16_i64, 32] {
        let world = grid_world(n);
        let probe = Item::Segment(Segment::new(
            Seg::new(Vec2::new(0, n / 2 * PITCH + 2_000), Vec2::new(n * PITCH, n / 2 * PITCH + 2_000)),
            WIDTH,
            -1,
            LayerRange::single(0),
        ));
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter(|| {
                let hits = world.query_colliding(
                    &Probe::Item(&probe),
                    &CollisionFilter::of_kind(KindMask::SEGMENT),
                );
                black_box(hits.len());
            })
        });
    }
    group.finish();
}

fn bench_assemble_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble_line");
    for &len in &[16_i64, 128] {
        let mut world = World::new();
        let mut seed = None;
        for i in 0..len {
            let id = world
                .add_segment(
                    Segment::new(
                        Seg::new(Vec2::new(i * PITCH, 0), Vec2::new((i + 1) * PITCH, 0)),
                        WIDTH,
                        1,
                        LayerRange::single(0),
                    ),
                    false,
                )
                .unwrap();
            if i == len / 2 {
                seed = Some(id);
            }
        }
        let seed = seed.unwrap();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_function(format!("chain_{}", len), |b| {
            b.iter(|| {
                let line = world.assemble_line(seed, false);
                black_box(line.points().len());
            })
        });
    }
    group.finish();
}

fn bench_branch_revert(c: &mut Criterion) {
    let mut group = c.benchmark_group("branch_revert");
    group.bench_function("speculative_edit", |b| {
        b.iter_batched(
            || grid_world(8),
            |mut world| {
                world.branch_move();
                for i in 0..16 {
                    let _ = world.add_segment(
                        Segment::new(
                            Seg::new(Vec2::new(i * PITCH, -PITCH), Vec2::new((i + 1) * PITCH, -PITCH)),
                            WIDTH,
                            99,
                            LayerRange::single(0),
                        ),
                        false,
                    );
                }
                world.revert();
                black_box(world.revision());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_query_colliding,
    bench_assemble_line,
    bench_branch_revert
);
criterion_main!(benches);
