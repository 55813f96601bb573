use al_core::frame::{FrameBuffer, GridDims};
use al_core::traits::GlyphSurface;
use al_render::canvas::GlyphCanvas;

/// Result of handing a frame to a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Accepted: drawn already (inline) or queued on the worker.
    Submitted,
    /// Discarded: a frame is outstanding, or the grid size is unknown.
    Dropped,
}

/// Strategy that turns captured frames into glyphs on a canvas.
///
/// Chosen once per render session by [`crate::select_backend`]. Both
/// implementations produce identical glyphs for identical inputs.
pub trait RenderBackend<S: GlyphSurface> {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The grid changed size. Called once per change, never for a no-op.
    fn resize(&mut self, dims: GridDims);

    /// Hand over a captured frame. Ownership moves to the backend.
    fn submit_frame(&mut self, frame: FrameBuffer, canvas: &mut GlyphCanvas<S>) -> Submission;

    /// Draw whatever finished since the last call. Never blocks.
    ///
    /// Returns `true` if the canvas changed.
    fn poll(&mut self, canvas: &mut GlyphCanvas<S>) -> bool;

    /// `true` while a submitted frame has not come back.
    fn is_busy(&self) -> bool;

    /// Release background resources. Later submissions are dropped.
    fn dispose(&mut self);
}
