use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use terramesh_core::Point2d;
use terramesh_delaunay::{divconq_triangulate, incremental_triangulate, TriangulateOpts};

fn scattered(count: usize) -> Vec<Point2d> {
    let mut state = 0x1234_5678_9abc_def1u64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    (0..count)
        .map(|_| Point2d::new(next() * 1000.0, next() * 1000.0))
        .collect()
}

fn bench_triangulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulation");
    for &size in &[100usize, 1_000, 10_000] {
        let points = scattered(size);
        group.bench_with_input(BenchmarkId::new("divconq", size), &points, |b, points| {
            b.iter(|| divconq_triangulate(black_box(points), &TriangulateOpts::default()).unwrap())
        });
        if size <= 1_000 {
            group.bench_with_input(
                BenchmarkId::new("incremental", size),
                &points,
                |b, points| b.iter(|| incremental_triangulate(black_box(points)).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_triangulation);
criterion_main!(benches);
