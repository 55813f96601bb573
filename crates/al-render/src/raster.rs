use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use al_core::config::RenderConfig;
use al_core::frame::FrameBuffer;
use al_core::traits::GlyphSurface;
use anyhow::{Context, Result};

/// Rasterized coverage of one glyph, positioned relative to the cell origin.
struct Coverage {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

/// Software glyph surface producing an RGBA image.
///
/// Used for headless snapshots. The backing store is in device pixels; glyphs
/// are rasterized at `font_size × scale` with their top edge on the cell
/// origin, then alpha-blended in the ink color.
pub struct RasterSurface {
    font: FontArc,
    font_size: f32,
    scale: f32,
    ink: (u8, u8, u8),
    background: (u8, u8, u8),
    frame: FrameBuffer,
    /// Coverage cache, valid for the current `scale` only.
    cache: HashMap<char, Coverage>,
}

impl RasterSurface {
    /// Load a TrueType/OpenType font for rasterization.
    ///
    /// # Errors
    /// Returns an error if the font data cannot be parsed.
    pub fn new(font_data: Vec<u8>, config: &RenderConfig) -> Result<Self> {
        let font = FontArc::try_from_vec(font_data).context("invalid font data")?;
        Ok(Self {
            font,
            font_size: config.font_size,
            scale: 1.0,
            ink: config.ink,
            background: config.background,
            frame: FrameBuffer::new(0, 0),
            cache: HashMap::new(),
        })
    }

    /// Load the font from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a font.
    pub fn from_font_file(path: &Path, config: &RenderConfig) -> Result<Self> {
        let data =
            std::fs::read(path).with_context(|| format!("cannot read font {}", path.display()))?;
        Self::new(data, config)
    }

    /// Rendered pixels.
    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Write the current image as PNG.
    ///
    /// # Errors
    /// Returns an error if the surface is empty or the file cannot be written.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        anyhow::ensure!(!self.frame.is_empty(), "nothing rendered yet");
        let img = image::RgbaImage::from_raw(
            self.frame.width,
            self.frame.height,
            self.frame.data.clone(),
        )
        .context("frame buffer does not match its dimensions")?;
        img.save(path)
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!(
            "snapshot: {}x{} -> {}",
            self.frame.width,
            self.frame.height,
            path.display()
        );
        Ok(())
    }

    fn rasterize(&self, ch: char) -> Coverage {
        let px = PxScale::from(self.font_size * self.scale);
        let ascent = self.font.as_scaled(px).ascent();
        let glyph = self
            .font
            .glyph_id(ch)
            .with_scale_and_position(px, point(0.0, ascent));

        let Some(outline) = self.font.outline_glyph(glyph) else {
            // Whitespace and glyphs missing from the font.
            return Coverage {
                left: 0,
                top: 0,
                width: 0,
                height: 0,
                alpha: Vec::new(),
            };
        };
        let bounds = outline.px_bounds();
        let width = bounds.width().max(0.0) as u32;
        let height = bounds.height().max(0.0) as u32;
        let mut alpha = vec![0u8; width as usize * height as usize];
        outline.draw(|x, y, v| {
            if x < width && y < height {
                alpha[(y * width + x) as usize] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        });
        Coverage {
            left: bounds.min.x as i32,
            top: bounds.min.y as i32,
            width,
            height,
            alpha,
        }
    }
}

/// Blend `ink` over `base` with coverage `alpha` (0..=255).
#[inline(always)]
fn blend(base: u8, ink: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(base) * (255 - a) + u32::from(ink) * a + 127) / 255) as u8
}

impl GlyphSurface for RasterSurface {
    fn configure(&mut self, backing_width: u32, backing_height: u32, scale: f32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        if (scale - self.scale).abs() > f32::EPSILON {
            self.cache.clear();
        }
        self.scale = scale;
        self.frame.reshape(backing_width, backing_height);
        let (r, g, b) = self.background;
        for px in self.frame.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }

    fn clear(&mut self, width: f32, height: f32) {
        let w = ((width * self.scale).round().max(0.0) as u32).min(self.frame.width) as usize;
        let h = ((height * self.scale).round().max(0.0) as u32).min(self.frame.height) as usize;
        let stride = self.frame.width as usize * 4;
        let (r, g, b) = self.background;
        for row in self.frame.data.chunks_exact_mut(stride).take(h) {
            for px in row[..w * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&[r, g, b, 255]);
            }
        }
    }

    fn fill_glyph(&mut self, ch: char, x: f32, y: f32) {
        if !self.cache.contains_key(&ch) {
            let coverage = self.rasterize(ch);
            self.cache.insert(ch, coverage);
        }
        let Some(cov) = self.cache.get(&ch) else {
            return;
        };
        if cov.width == 0 {
            return;
        }

        let ox = (x * self.scale).round() as i32 + cov.left;
        let oy = (y * self.scale).round() as i32 + cov.top;
        let (fw, fh) = (self.frame.width as i32, self.frame.height as i32);
        let (ir, ig, ib) = self.ink;

        for gy in 0..cov.height as i32 {
            let py = oy + gy;
            if py < 0 || py >= fh {
                continue;
            }
            for gx in 0..cov.width as i32 {
                let px = ox + gx;
                if px < 0 || px >= fw {
                    continue;
                }
                let a = cov.alpha[(gy * cov.width as i32 + gx) as usize];
                if a == 0 {
                    continue;
                }
                let idx = ((py * fw + px) * 4) as usize;
                let dst = &mut self.frame.data[idx..idx + 4];
                dst[0] = blend(dst[0], ir, a);
                dst[1] = blend(dst[1], ig, a);
                dst[2] = blend(dst[2], ib, a);
                dst[3] = 255;
            }
        }
    }
}
