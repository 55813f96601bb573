use al_core::config::RenderConfig;
use al_core::traits::GlyphSurface;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

/// Glyph surface backed by terminal cells.
///
/// One terminal cell is one glyph cell. Glyph coordinates are snapped to the
/// nearest cell, so the surface is resolution-independent: the scale passed
/// to `configure` only converts the backing size back to cell units.
///
/// # Example
/// ```
/// use al_core::config::RenderConfig;
/// use al_core::traits::GlyphSurface;
/// use al_render::terminal::TerminalSurface;
///
/// let config = RenderConfig::default();
/// let mut surface = TerminalSurface::new(&config);
/// surface.configure(66, 24, 1.0);
/// surface.fill_glyph('#', 13.2, 12.0);
/// assert_eq!(surface.get(2, 1), Some('#'));
/// ```
pub struct TerminalSurface {
    cell_w: f32,
    cell_h: f32,
    cols: u16,
    rows: u16,
    cells: Vec<char>,
    ink: Color,
    background: Color,
}

impl TerminalSurface {
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        let (ir, ig, ib) = config.ink;
        let (br, bg, bb) = config.background;
        Self {
            cell_w: config.cell_width(),
            cell_h: config.cell_height(),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            ink: Color::Rgb(ir, ig, ib),
            background: Color::Rgb(br, bg, bb),
        }
    }

    /// Size in cells.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Glyph at (col, row), `None` outside the surface.
    #[must_use]
    pub fn get(&self, col: u16, row: u16) -> Option<char> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells
            .get(usize::from(row) * usize::from(self.cols) + usize::from(col))
            .copied()
    }

    /// Copy the surface into a ratatui buffer, clipped to `area`.
    pub fn render(&self, buf: &mut Buffer, area: Rect) {
        for cy in 0..self.rows.min(area.height) {
            for cx in 0..self.cols.min(area.width) {
                let ch = self.cells[usize::from(cy) * usize::from(self.cols) + usize::from(cx)];
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_char(ch)
                        .set_fg(self.ink)
                        .set_bg(self.background);
                }
            }
        }
    }
}

impl GlyphSurface for TerminalSurface {
    fn configure(&mut self, backing_width: u32, backing_height: u32, scale: f32) {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        // Backing sizes are rounded to whole pixels; round back to whole cells.
        let cols = (backing_width as f32 / scale / self.cell_w).round();
        let rows = (backing_height as f32 / scale / self.cell_h).round();
        self.cols = cols.clamp(0.0, f32::from(u16::MAX)) as u16;
        self.rows = rows.clamp(0.0, f32::from(u16::MAX)) as u16;
        self.cells.clear();
        self.cells
            .resize(usize::from(self.cols) * usize::from(self.rows), ' ');
    }

    fn clear(&mut self, _width: f32, _height: f32) {
        self.cells.fill(' ');
    }

    #[inline]
    fn fill_glyph(&mut self, ch: char, x: f32, y: f32) {
        let col = (x / self.cell_w).round();
        let row = (y / self.cell_h).round();
        if col < 0.0 || row < 0.0 {
            return;
        }
        let (col, row) = (col as usize, row as usize);
        if col < usize::from(self.cols) && row < usize::from(self.rows) {
            self.cells[row * usize::from(self.cols) + col] = ch;
        }
    }
}
