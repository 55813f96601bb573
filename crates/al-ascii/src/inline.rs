use al_core::config::RenderConfig;
use al_core::error::CoreError;
use al_core::frame::{FrameBuffer, GridDims};
use al_core::traits::GlyphSurface;
use al_render::canvas::GlyphCanvas;

use crate::backend::{RenderBackend, Submission};
use crate::map::FrameMapper;

/// Backend that samples, maps and draws on the calling thread.
///
/// Used when worker threads are unavailable or not wanted. No grid is kept:
/// each cell is drawn as soon as it is mapped.
///
/// # Example
/// ```
/// use al_ascii::inline::InlineBackend;
/// use al_core::config::RenderConfig;
/// let backend = InlineBackend::new(&RenderConfig::default()).unwrap();
/// ```
pub struct InlineBackend {
    mapper: FrameMapper,
    dims: GridDims,
}

impl InlineBackend {
    /// # Errors
    /// Returns an error if the ramp, cutoff or gamma are invalid.
    pub fn new(config: &RenderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            mapper: FrameMapper::new(config)?,
            dims: GridDims::default(),
        })
    }
}

impl<S: GlyphSurface> RenderBackend<S> for InlineBackend {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn resize(&mut self, dims: GridDims) {
        self.dims = dims;
    }

    fn submit_frame(&mut self, frame: FrameBuffer, canvas: &mut GlyphCanvas<S>) -> Submission {
        if self.dims.is_empty() {
            return Submission::Dropped;
        }
        let mapper = *self.mapper.mapper();
        let samples = match self.mapper.sample(frame, self.dims.cols, self.dims.rows) {
            Ok(Some(samples)) => samples,
            Ok(None) => return Submission::Dropped,
            Err(e) => {
                log::warn!("InlineBackend: cannot sample frame: {e:#}");
                return Submission::Dropped;
            }
        };

        canvas.begin_frame();
        let cols = self.dims.cols as usize;
        for (i, px) in samples.data.chunks_exact(4).enumerate() {
            let value = mapper.map_pixel(px[0], px[1], px[2]);
            if value != 0 {
                canvas.draw_cell((i % cols) as u32, (i / cols) as u32, value);
            }
        }
        Submission::Submitted
    }

    fn poll(&mut self, _canvas: &mut GlyphCanvas<S>) -> bool {
        false
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn dispose(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Recorder, canvas, config, gradient};

    #[test]
    fn draws_synchronously() {
        let mut backend = InlineBackend::new(&config()).unwrap();
        let mut c = canvas(6, 3);
        RenderBackend::<Recorder>::resize(&mut backend, c.dims());
        assert_eq!(backend.submit_frame(gradient(30, 30), &mut c), Submission::Submitted);
        assert_eq!(c.surface().clears, 1);
        assert!(!c.surface().glyphs.is_empty());
        assert!(!RenderBackend::<Recorder>::is_busy(&backend));
        assert!(!backend.poll(&mut c));
    }

    #[test]
    fn nothing_drawn_without_dims_or_pixels() {
        let mut backend = InlineBackend::new(&config()).unwrap();
        let mut c = canvas(6, 3);
        assert_eq!(backend.submit_frame(gradient(30, 30), &mut c), Submission::Dropped);
        RenderBackend::<Recorder>::resize(&mut backend, c.dims());
        assert_eq!(
            backend.submit_frame(FrameBuffer::new(0, 0), &mut c),
            Submission::Dropped
        );
        assert_eq!(c.surface().clears, 0);
    }
}
