use al_core::config::RenderConfig;
use al_core::error::CoreError;
use al_core::frame::{FrameBuffer, IndexGrid};
use al_core::mapper::GlyphMapper;
use al_source::resize::Sampler;
use anyhow::Result;
use rayon::prelude::*;

/// Sample `frame` down to the grid and map every sample to a glyph index.
///
/// `samples` is scratch space reshaped to the grid size. Rows are mapped in
/// parallel. Returns `Ok(false)` when there is nothing to map (empty frame or
/// empty grid); `grid` is then left as it was.
///
/// # Errors
/// Returns an error if the frame buffer does not match its dimensions.
pub fn map_frame(
    sampler: &mut Sampler,
    mapper: &GlyphMapper,
    frame: FrameBuffer,
    samples: &mut FrameBuffer,
    grid: &mut IndexGrid,
) -> Result<bool> {
    let dims = grid.dims;
    if dims.is_empty() {
        return Ok(false);
    }
    samples.reshape(dims.cols, dims.rows);
    if !sampler.sample(frame, samples)? {
        return Ok(false);
    }

    let cols = dims.cols as usize;
    grid.cells
        .par_chunks_exact_mut(cols)
        .zip(samples.data.par_chunks_exact(cols * 4))
        .for_each(|(row, pixels)| mapper.map_rgba(pixels, row));
    Ok(true)
}

/// Sampler, mapper and scratch buffer bundled for one render path.
///
/// Each backend owns exactly one, so no state is shared across threads.
pub struct FrameMapper {
    sampler: Sampler,
    mapper: GlyphMapper,
    samples: FrameBuffer,
}

impl FrameMapper {
    /// # Errors
    /// Returns an error if the ramp, cutoff or gamma are invalid.
    pub fn new(config: &RenderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            sampler: Sampler::new(),
            mapper: GlyphMapper::from_config(config)?,
            samples: FrameBuffer::new(0, 0),
        })
    }

    /// See [`map_frame`].
    ///
    /// # Errors
    /// Returns an error if the frame buffer does not match its dimensions.
    pub fn map_into(&mut self, frame: FrameBuffer, grid: &mut IndexGrid) -> Result<bool> {
        map_frame(
            &mut self.sampler,
            &self.mapper,
            frame,
            &mut self.samples,
            grid,
        )
    }

    /// Sample `frame` to `cols × rows` and return the samples, one pixel per
    /// cell, for callers that map cell by cell.
    ///
    /// # Errors
    /// Returns an error if the frame buffer does not match its dimensions.
    pub fn sample(&mut self, frame: FrameBuffer, cols: u32, rows: u32) -> Result<Option<&FrameBuffer>> {
        self.samples.reshape(cols, rows);
        if self.sampler.sample(frame, &mut self.samples)? {
            Ok(Some(&self.samples))
        } else {
            Ok(None)
        }
    }

    #[must_use]
    pub fn mapper(&self) -> &GlyphMapper {
        &self.mapper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use al_core::frame::GridDims;

    fn gradient(w: u32, h: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
            let v = ((i as u32 % w) * 255 / (w - 1)) as u8;
            px.copy_from_slice(&[v, v, v, 255]);
        }
        fb
    }

    #[test]
    fn dark_left_light_right() {
        let config = RenderConfig::default();
        let mut fm = FrameMapper::new(&config).unwrap();
        let mut grid = IndexGrid::new(GridDims::new(8, 2));
        assert!(fm.map_into(gradient(80, 20), &mut grid).unwrap());
        assert!(grid.get(0, 0) > 0);
        assert_eq!(grid.get(7, 1), 0);
        for row in grid.cells.chunks_exact(8) {
            assert!(row.windows(2).all(|w| w[0] >= w[1]), "{row:?}");
        }
    }

    #[test]
    fn same_input_same_grid() {
        let config = RenderConfig::default();
        let mut a = IndexGrid::new(GridDims::new(13, 7));
        let mut b = IndexGrid::new(GridDims::new(13, 7));
        FrameMapper::new(&config).unwrap().map_into(gradient(64, 48), &mut a).unwrap();
        FrameMapper::new(&config).unwrap().map_into(gradient(64, 48), &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_leave_grid_alone() {
        let config = RenderConfig::default();
        let mut fm = FrameMapper::new(&config).unwrap();
        let mut grid = IndexGrid::new(GridDims::new(4, 4));
        grid.cells[0] = 9;
        assert!(!fm.map_into(FrameBuffer::new(0, 0), &mut grid).unwrap());
        assert_eq!(grid.cells[0], 9);

        let mut empty = IndexGrid::new(GridDims::default());
        assert!(!fm.map_into(gradient(8, 8), &mut empty).unwrap());
    }
}
