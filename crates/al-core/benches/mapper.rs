use al_core::mapper::GlyphMapper;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_map_rgba(c: &mut Criterion) {
    let mapper = GlyphMapper::new(26, 130.0, 3.0).unwrap_or_else(|e| panic!("{e}"));
    // 240×80 grid, a typical full-screen terminal.
    let rgba: Vec<u8> = (0..240 * 80 * 4).map(|i| (i * 37 % 256) as u8).collect();
    let mut out = vec![0u8; 240 * 80];

    c.bench_function("map_rgba_240x80", |b| {
        b.iter(|| mapper.map_rgba(black_box(&rgba), black_box(&mut out)));
    });
}

criterion_group!(benches, bench_map_rgba);
criterion_main!(benches);
