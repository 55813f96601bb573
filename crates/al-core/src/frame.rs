/// Owned RGBA pixel buffer.
///
/// Captured frames travel between threads by value: whoever holds the
/// `FrameBuffer` is its only reader and writer.
///
/// # Example
/// ```
/// use al_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes per pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of the given size.
    ///
    /// # Example
    /// ```
    /// use al_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.height, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// `true` when the buffer has no pixels (source not loaded yet).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reallocate in place if the dimensions differ.
    pub fn reshape(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.data.clear();
            self.data.resize(width as usize * height as usize * 4, 0);
        }
    }
}

/// Character grid dimensions.
///
/// # Example
/// ```
/// use al_core::frame::GridDims;
/// let dims = GridDims::new(40, 20);
/// assert_eq!(dims.cells(), 800);
/// assert!(!dims.is_empty());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridDims {
    /// Columns.
    pub cols: u32,
    /// Rows.
    pub rows: u32,
}

impl GridDims {
    #[must_use]
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn cells(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// `true` if either side is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

/// Visible drawing area in device-independent pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    /// Width in device-independent pixels.
    pub width: f32,
    /// Height in device-independent pixels.
    pub height: f32,
    /// Device pixels per device-independent pixel.
    pub dpr: f32,
}

impl Container {
    #[must_use]
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    /// Backing store size in device pixels: `round(size * dpr)`.
    ///
    /// # Example
    /// ```
    /// use al_core::frame::Container;
    /// let c = Container::new(100.5, 40.0, 2.0);
    /// assert_eq!(c.backing_size(), (201, 80));
    /// ```
    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        let dpr = self.effective_dpr();
        (
            (self.width.max(0.0) * dpr).round() as u32,
            (self.height.max(0.0) * dpr).round() as u32,
        )
    }

    /// DPR with a fallback of 1 for unset or nonsensical values.
    #[must_use]
    pub fn effective_dpr(&self) -> f32 {
        if self.dpr.is_finite() && self.dpr > 0.0 {
            self.dpr
        } else {
            1.0
        }
    }
}

/// Flat per-cell glyph indices: `0` = nothing, `v > 0` = ramp glyph `v - 1`.
///
/// # Example
/// ```
/// use al_core::frame::{GridDims, IndexGrid};
/// let grid = IndexGrid::new(GridDims::new(4, 2));
/// assert_eq!(grid.cells.len(), 8);
/// assert_eq!(grid.get(3, 1), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexGrid {
    /// Row-major indices.
    pub cells: Vec<u8>,
    /// Grid size.
    pub dims: GridDims,
}

impl IndexGrid {
    #[must_use]
    pub fn new(dims: GridDims) -> Self {
        Self {
            cells: vec![0u8; dims.cells()],
            dims,
        }
    }

    /// Reuse an existing allocation, zeroed and sized for `dims`.
    #[must_use]
    pub fn from_buffer(mut cells: Vec<u8>, dims: GridDims) -> Self {
        cells.clear();
        cells.resize(dims.cells(), 0);
        Self { cells, dims }
    }

    /// Index at (col, row).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, col: u32, row: u32) -> u8 {
        self.cells[row as usize * self.dims.cols as usize + col as usize]
    }

    /// `true` for a 0×0 grid.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// Give the allocation back (for pooling).
    #[must_use]
    pub fn into_buffer(self) -> Vec<u8> {
        self.cells
    }
}

/// Completion of a position change on a frame source.
///
/// `frame` is `None` when the capture failed; the frame is then skipped.
#[derive(Debug)]
pub struct Seeked {
    /// Position reached, in seconds.
    pub position: f64,
    /// Captured snapshot at that position.
    pub frame: Option<FrameBuffer>,
}
