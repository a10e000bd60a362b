use criterion::{black_box, criterion_group, criterion_main, Criterion};
use genotile_core::{unflatten, visible_tiles, ChromosomeIndex, GenomicRange, SearchField, TilesetInfo};

fn generate_dense(channels: usize, rows: usize) -> Vec<f64> {
    (0..channels * rows).map(|i| (i % 97) as f64).collect()
}

fn bench_visible_tiles(c: &mut Criterion) {
    let track = TilesetInfo::power_of_two(vec![0.0], vec![3.1e9], 4_294_967_296.0, 22);
    let matrix = TilesetInfo::power_of_two(vec![0.0, 0.0], vec![3.1e9, 3.1e9], 4_294_967_296.0, 22);
    let resolutions = TilesetInfo::with_resolutions(
        vec![0.0],
        vec![3.1e9],
        vec![1000.0, 5000.0, 10_000.0, 50_000.0, 100_000.0],
        Some(256),
    );
    let range = GenomicRange::new(1.0e9, 1.05e9);

    c.bench_function("visible_tiles_1d_z16", |b| {
        b.iter(|| black_box(visible_tiles(16, black_box(&[range]), &track)))
    });

    c.bench_function("visible_tiles_2d_z14", |b| {
        b.iter(|| black_box(visible_tiles(14, black_box(&[range, range]), &matrix)))
    });

    c.bench_function("visible_tiles_resolutions", |b| {
        b.iter(|| black_box(visible_tiles(3, black_box(&[range]), &resolutions)))
    });
}

fn bench_unflatten(c: &mut Criterion) {
    let dense = generate_dense(24, 256);

    c.bench_function("unflatten_24x256", |b| {
        b.iter(|| black_box(unflatten(black_box(&dense), [24, 256])))
    });
}

fn bench_search(c: &mut Criterion) {
    let chroms = ChromosomeIndex::from_sizes((1..=22).map(|i| (format!("chr{}", i), 100_000_000u64))).unwrap();
    let field = SearchField::new(chroms).unwrap();

    c.bench_function("search_two_axis_offset", |b| {
        b.iter(|| black_box(field.search(black_box("chr3:1,000,000-2,000,000 & chr7:5,000-9,000 [offset 5,10:0,0]"))))
    });
}

criterion_group!(benches, bench_visible_tiles, bench_unflatten, bench_search);
criterion_main!(benches);
