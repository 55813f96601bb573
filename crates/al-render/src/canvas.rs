use al_core::config::RenderConfig;
use al_core::error::CoreError;
use al_core::frame::{Container, GridDims, IndexGrid};
use al_core::ramp::GlyphRamp;
use al_core::traits::GlyphSurface;

/// Lays out glyph grids on a drawing surface.
///
/// Owns the surface and the cell geometry. Cell (col, row) is drawn at
/// `(col × cell_width, row × cell_height)` in device-independent pixels; the
/// surface backing store is `round(size × dpr)` device pixels with a matching
/// scale transform, so glyphs stay crisp on dense displays.
///
/// # Example
/// ```
/// use al_core::config::RenderConfig;
/// use al_core::frame::{Container, GridDims};
/// use al_render::canvas::GlyphCanvas;
/// use al_render::terminal::TerminalSurface;
///
/// let config = RenderConfig::default();
/// let surface = TerminalSurface::new(&config);
/// let mut canvas = GlyphCanvas::new(surface, &config).unwrap();
/// let dims = canvas.resize(Container::new(66.0, 24.0, 1.0));
/// assert_eq!(dims, Some(GridDims::new(10, 2)));
/// ```
pub struct GlyphCanvas<S> {
    surface: S,
    ramp: GlyphRamp,
    config: RenderConfig,
    container: Option<Container>,
    dims: GridDims,
}

impl<S: GlyphSurface> GlyphCanvas<S> {
    /// Wrap `surface` with the ramp and cell size from `config`.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyRamp`] or [`CoreError::RampTooLong`] if the
    /// configured ramp cannot be addressed by grid values.
    pub fn new(surface: S, config: &RenderConfig) -> Result<Self, CoreError> {
        Ok(Self {
            surface,
            ramp: GlyphRamp::new(&config.ramp)?,
            config: config.clone(),
            container: None,
            dims: GridDims::default(),
        })
    }

    /// Apply a new container size.
    ///
    /// Reconfigures the surface whenever the container changes, and returns
    /// the new grid dimensions only when they differ from the current ones.
    pub fn resize(&mut self, container: Container) -> Option<GridDims> {
        if self.container == Some(container) {
            return None;
        }
        self.container = Some(container);

        let (bw, bh) = container.backing_size();
        self.surface.configure(bw, bh, container.effective_dpr());

        let dims = self.config.grid_dims(&container);
        if dims == self.dims {
            return None;
        }
        log::debug!(
            "GlyphCanvas: {}x{} cells, backing {bw}x{bh} @ {}x",
            dims.cols,
            dims.rows,
            container.effective_dpr()
        );
        self.dims = dims;
        Some(dims)
    }

    /// Current grid dimensions (0×0 before the first resize).
    #[inline]
    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Clear the whole container to the background.
    pub fn begin_frame(&mut self) {
        if let Some(c) = self.container {
            self.surface.clear(c.width, c.height);
        }
    }

    /// Draw one cell. `value` is a 1-based ramp index; `0` draws nothing.
    #[inline]
    pub fn draw_cell(&mut self, col: u32, row: u32, value: u8) {
        if let Some(ch) = self.ramp.glyph(value) {
            let x = col as f32 * self.config.cell_width();
            let y = row as f32 * self.config.cell_height();
            self.surface.fill_glyph(ch, x, y);
        }
    }

    /// Clear, then draw every non-zero cell of `grid` using its own layout.
    ///
    /// Returns `false` (and leaves the surface untouched) for an empty grid.
    pub fn draw_grid(&mut self, grid: &IndexGrid) -> bool {
        if grid.is_empty() {
            return false;
        }
        self.begin_frame();
        let cols = grid.dims.cols as usize;
        for (row, line) in grid.cells.chunks_exact(cols).enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value != 0 {
                    self.draw_cell(col as u32, row as u32, value);
                }
            }
        }
        true
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        configured: Vec<(u32, u32, f32)>,
        clears: usize,
        glyphs: Vec<(char, f32, f32)>,
    }

    impl GlyphSurface for Recorder {
        fn configure(&mut self, w: u32, h: u32, scale: f32) {
            self.configured.push((w, h, scale));
        }
        fn clear(&mut self, _w: f32, _h: f32) {
            self.clears += 1;
            self.glyphs.clear();
        }
        fn fill_glyph(&mut self, ch: char, x: f32, y: f32) {
            self.glyphs.push((ch, x, y));
        }
    }

    fn config() -> RenderConfig {
        RenderConfig {
            ramp: " .#".into(),
            font_size: 10.0,
            char_aspect: 0.5,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn backing_store_follows_dpr() {
        let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
        assert_eq!(
            canvas.resize(Container::new(101.3, 40.0, 2.0)),
            Some(GridDims::new(20, 4))
        );
        assert_eq!(canvas.surface().configured, vec![(203, 80, 2.0)]);
    }

    #[test]
    fn dims_reported_only_on_change() {
        let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
        assert!(canvas.resize(Container::new(100.0, 40.0, 1.0)).is_some());
        assert!(canvas.resize(Container::new(100.0, 40.0, 1.0)).is_none());
        // Same grid, new density: surface rescaled, no new dims.
        assert!(canvas.resize(Container::new(102.0, 41.0, 3.0)).is_none());
        assert_eq!(canvas.surface().configured.len(), 2);
        assert_eq!(
            canvas.resize(Container::new(200.0, 40.0, 3.0)),
            Some(GridDims::new(40, 4))
        );
    }

    #[test]
    fn grid_cells_land_on_cell_origins() {
        let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
        canvas.resize(Container::new(15.0, 20.0, 2.0));
        let grid = IndexGrid {
            cells: vec![0, 3, 0, 2, 1, 0],
            dims: GridDims::new(3, 2),
        };
        assert!(canvas.draw_grid(&grid));
        let s = canvas.surface();
        assert_eq!(s.clears, 1);
        assert_eq!(
            s.glyphs,
            vec![('#', 5.0, 0.0), ('.', 0.0, 10.0), (' ', 5.0, 10.0)]
        );
    }

    #[test]
    fn empty_grid_is_ignored() {
        let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
        canvas.resize(Container::new(15.0, 20.0, 1.0));
        assert!(!canvas.draw_grid(&IndexGrid::new(GridDims::default())));
        assert_eq!(canvas.surface().clears, 0);
    }

    #[test]
    fn out_of_ramp_values_are_skipped() {
        let mut canvas = GlyphCanvas::new(Recorder::default(), &config()).unwrap();
        canvas.resize(Container::new(15.0, 20.0, 1.0));
        canvas.draw_cell(0, 0, 200);
        assert!(canvas.surface().glyphs.is_empty());
    }
}
