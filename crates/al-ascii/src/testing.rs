use al_core::config::RenderConfig;
use al_core::frame::{Container, FrameBuffer};
use al_core::traits::GlyphSurface;
use al_render::canvas::GlyphCanvas;

/// Surface that records what was drawn since the last clear.
#[derive(Default)]
pub struct Recorder {
    pub clears: usize,
    pub glyphs: Vec<(char, f32, f32)>,
}

impl GlyphSurface for Recorder {
    fn configure(&mut self, _w: u32, _h: u32, _scale: f32) {}

    fn clear(&mut self, _w: f32, _h: f32) {
        self.clears += 1;
        self.glyphs.clear();
    }

    fn fill_glyph(&mut self, ch: char, x: f32, y: f32) {
        self.glyphs.push((ch, x, y));
    }
}

pub fn config() -> RenderConfig {
    RenderConfig {
        ramp: " .:-=+*#%@".into(),
        font_size: 10.0,
        char_aspect: 0.5,
        ..RenderConfig::default()
    }
}

/// Canvas of `cols × rows` cells for [`config`].
pub fn canvas(cols: u32, rows: u32) -> GlyphCanvas<Recorder> {
    let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
    canvas.resize(Container::new(cols as f32 * 5.0, rows as f32 * 10.0, 1.0));
    canvas
}

/// Diagonal gradient, dark top-left to light bottom-right.
pub fn gradient(w: u32, h: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = ((x + y) * 255 / (w + h - 2)) as u8;
            let idx = ((y * w + x) * 4) as usize;
            fb.data[idx..idx + 4].copy_from_slice(&[v, v / 2, 255 - v, 255]);
        }
    }
    fb
}
