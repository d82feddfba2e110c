//! Physics benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- narrowphase

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Quat, Vec3};
use rein_physics::ecs::components::transform::Pose;
use rein_physics::physics::broadphase::BroadphaseMode;
use rein_physics::physics::gjk::gjk;
use rein_physics::physics::kdtree::KdTree;
use rein_physics::physics::narrowphase::{detect_collision, gjk_epa, sphere_sphere};
use rein_physics::physics::shape::{ConvexHull, Shape};
use rein_physics_bench::*;

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("narrowphase/sphere_sphere");
        let shape = Shape::sphere(Vec3::ZERO, 1.0);
        let pa = Pose::identity();

        let pb_hit = Pose::from_position(Vec3::new(1.5, 0.0, 0.0));
        group.bench_function("analytic", |b| {
            b.iter(|| sphere_sphere(&shape, &pa, &shape, &pb_hit));
        });
        let pb_oblique = Pose::from_position(Vec3::new(0.9, 1.2, 0.0));
        group.bench_function("gjk_epa", |b| {
            b.iter(|| gjk_epa(&shape, &pa, &shape, &pb_oblique));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/hull_hull");
        let hull = Shape::hull(ConvexHull::cuboid(Vec3::splat(0.5)));
        let pa = Pose::identity();

        let pb_hit = Pose::from_position(Vec3::new(0.8, 0.1, 0.05));
        group.bench_function("intersecting", |b| {
            b.iter(|| detect_collision(&hull, &pa, &hull, &pb_hit));
        });

        let pb_miss = Pose::from_position(Vec3::new(5.0, 0.0, 0.0));
        group.bench_function("separated", |b| {
            b.iter(|| detect_collision(&hull, &pa, &hull, &pb_miss));
        });

        let pb_rot = Pose::from_position(Vec3::new(0.9, 0.2, 0.0))
            .with_rotation(Quat::from_rotation_y(0.785));
        group.bench_function("rotated", |b| {
            b.iter(|| detect_collision(&hull, &pa, &hull, &pb_rot));
        });

        group.bench_function("gjk_only", |b| {
            b.iter(|| gjk(&hull, &pa, &hull, &pb_hit));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/dispatch");
        let pa = Pose::identity();
        let pb = Pose::from_position(Vec3::new(0.0, 0.4, 0.0));

        let plane = Shape::plane(Vec3::Y, 0.0);
        let sphere = Shape::sphere(Vec3::ZERO, 0.5);
        let cuboid = Shape::cuboid(Vec3::splat(0.5));
        let capsule = Shape::capsule(0.25, 0.5);
        group.bench_function("plane_sphere", |b| {
            b.iter(|| detect_collision(&plane, &pa, &sphere, &pb));
        });
        group.bench_function("cuboid_plane", |b| {
            b.iter(|| detect_collision(&cuboid, &pb, &plane, &pa));
        });
        group.bench_function("capsule_cuboid", |b| {
            b.iter(|| detect_collision(&capsule, &pb, &cuboid, &pa));
        });
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// KD-tree
// ---------------------------------------------------------------------------

fn bench_kdtree(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("kdtree/build");
        for &n in &[1_000, 10_000, 50_000] {
            let points = point_cloud(n, 100.0);
            let mut tree = KdTree::new();
            group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
                b.iter(|| tree.set_points(points));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("kdtree/query");
        let points = point_cloud(10_000, 100.0);
        let tree = KdTree::from_points(&points);
        let queries = point_cloud(100, 100.0);

        group.bench_function("nearest", |b| {
            b.iter(|| {
                for q in &queries {
                    tree.nearest(*q);
                }
            });
        });
        group.bench_function("k_nearest_16", |b| {
            b.iter(|| {
                for q in &queries {
                    tree.k_nearest(*q, 16);
                }
            });
        });
        group.bench_function("radius_10", |b| {
            b.iter(|| {
                for q in &queries {
                    tree.radius(*q, 10.0);
                }
            });
        });
        group.bench_function("radius_bounded_10_8", |b| {
            b.iter(|| {
                for q in &queries {
                    tree.radius_bounded(*q, 10.0, 8);
                }
            });
        });
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// World step
// ---------------------------------------------------------------------------

fn bench_world_step(c: &mut Criterion) {
    for (name, mode) in [
        ("exhaustive", BroadphaseMode::Exhaustive),
        ("kdtree", BroadphaseMode::KdTree { radius: 2.0 }),
    ] {
        let mut group = c.benchmark_group(format!("world/step_{name}"));
        group.sample_size(30);
        for &n in &[50, 100, 250] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_scene(n, mode),
                    |mut physics| {
                        physics.step(1.0 / 60.0).expect("step");
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("world/sustained_10steps");
        group.sample_size(20);
        group.bench_function("100", |b| {
            b.iter_batched(
                || setup_scene(100, BroadphaseMode::KdTree { radius: 2.0 }),
                |mut physics| {
                    for _ in 0..10 {
                        physics.step(1.0 / 60.0).expect("step");
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Cloth
// ---------------------------------------------------------------------------

fn bench_cloth(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloth/update");
    group.sample_size(30);
    for &(columns, rows) in &[(20, 10), (60, 30)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{columns}x{rows}")),
            &(columns, rows),
            |b, &(columns, rows)| {
                b.iter_batched(
                    || setup_cloth(columns, rows),
                    |mut cloth| cloth.update(1.0 / 60.0),
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_narrowphase,
    bench_kdtree,
    bench_world_step,
    bench_cloth,
);
criterion_main!(benches);
