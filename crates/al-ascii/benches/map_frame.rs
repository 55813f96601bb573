use al_ascii::map::FrameMapper;
use al_core::config::RenderConfig;
use al_core::frame::{FrameBuffer, GridDims, IndexGrid};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_map_frame(c: &mut Criterion) {
    let config = RenderConfig::default();
    let mut mapper = FrameMapper::new(&config).unwrap_or_else(|e| panic!("{e}"));
    // 480×270 capture onto a 240×80 grid.
    let mut frame = FrameBuffer::new(480, 270);
    for (i, b) in frame.data.iter_mut().enumerate() {
        *b = (i * 37 % 256) as u8;
    }
    let mut grid = IndexGrid::new(GridDims::new(240, 80));

    c.bench_function("map_frame_480x270_to_240x80", |b| {
        b.iter(|| {
            let _ = mapper.map_into(black_box(frame.clone()), &mut grid);
        });
    });
}

criterion_group!(benches, bench_map_frame);
criterion_main!(benches);
