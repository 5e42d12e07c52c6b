//! Benchmarks for contouring and simplification
//!
//! Author: Moroya Sakamoto

use alice_contour::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("density");

    let point = Vec4::new(20.0, 10.0, 5.0, 1.0);
    for shape in [ShapeType::Cube, ShapeType::Pill, ShapeType::Torus] {
        let config = SuperPrimitiveConfig::for_shape(shape);
        group.bench_function(format!("{:?}", shape).to_lowercase(), |b| {
            b.iter(|| density(black_box(&config), black_box(point)))
        });
    }

    group.finish();
}

fn bench_contour(c: &mut Criterion) {
    let mut group = c.benchmark_group("contour");
    group.sample_size(10);

    for grid_size in [32u32, 64] {
        let sdf = |p: Vec4| Vec3::new(p.x, p.y, p.z).length() - grid_size as f32 * 0.3;
        group.bench_with_input(
            BenchmarkId::new("sphere", grid_size),
            &grid_size,
            |b, &size| b.iter(|| contour_sdf(black_box(&sdf), size)),
        );
    }

    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");
    group.sample_size(10);

    let sdf = |p: Vec4| Vec3::new(p.x, p.y, p.z).length() - 10.0;
    let source = contour_sdf(&sdf, 64);

    let options = SimplifyOptions {
        edge_fraction: 0.5,
        max_iterations: 20,
        target_percentage: 0.1,
        max_error: 1e30,
        max_edge_size: 4.0,
        min_angle_cosine: 0.5,
    };

    group.bench_function("sphere_64", |b| {
        b.iter(|| {
            let mut mesh = source.clone();
            simplify_mesh(&mut mesh, Vec4::ZERO, black_box(&options));
            mesh
        })
    });

    group.finish();
}

criterion_group!(benches, bench_density, bench_contour, bench_simplify);
criterion_main!(benches);
