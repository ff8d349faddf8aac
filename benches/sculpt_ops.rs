//! Benchmarks for brush kernels and topology operations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use chisel::algo::brush::{grab_deform, inflate_deflate, local_smooth};
use chisel::algo::decimate::Decimate;
use chisel::algo::subdivide::Subdivide;
use chisel::prelude::*;
use nalgebra::{Point3, Vector3};

fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            vertices.push(Point3::new(x, y, 0.1 * (x * 0.3).sin() * (y * 0.2).cos()));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_brushes(c: &mut Criterion) {
    let mesh = create_grid_mesh(200);
    let points = mesh.positions();
    let normals = mesh.vertex_normals();
    let anchor = Point3::new(100.0, 100.0, 0.0);
    let delta = Vector3::new(0.0, 0.0, 0.2);

    let mut group = c.benchmark_group("brush_200x200");
    for parallel in [false, true] {
        let mode = if parallel { "parallel" } else { "sequential" };

        group.bench_with_input(BenchmarkId::new("grab", mode), &parallel, |b, &parallel| {
            b.iter(|| grab_deform(points, &anchor, &delta, 12.0, 1.0, parallel));
        });

        group.bench_with_input(BenchmarkId::new("inflate", mode), &parallel, |b, &parallel| {
            b.iter(|| inflate_deflate(points, &anchor, Some(&normals), 12.0, 0.2, parallel));
        });

        group.bench_with_input(BenchmarkId::new("smooth", mode), &parallel, |b, &parallel| {
            b.iter(|| local_smooth(points, &anchor, 12.0, 1.0, 0.1, parallel));
        });
    }
    group.finish();
}

fn bench_normals(c: &mut Criterion) {
    let mesh = create_grid_mesh(200);

    c.bench_function("vertex_normals_200x200", |b| {
        b.iter(|| mesh.vertex_normals());
    });
}

fn bench_topology(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);

    c.bench_function("loop_subdivide_50x50", |b| {
        let op = Subdivide::new(1).unwrap();
        b.iter(|| op.apply(&mesh).unwrap());
    });

    c.bench_function("qem_decimate_50x50_half", |b| {
        let op = Decimate::new(0.5).unwrap();
        b.iter(|| op.apply(&mesh).unwrap());
    });
}

criterion_group!(benches, bench_brushes, bench_normals, bench_topology);
criterion_main!(benches);
