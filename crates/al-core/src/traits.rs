use crate::frame::Seeked;

/// A scrubbable clip: position changes are requested, then completed later.
///
/// Implemented by: `VideoSource` (ffmpeg), and in-memory sources in tests.
///
/// # Example
/// ```
/// use al_core::traits::FrameSource;
/// use al_core::frame::Seeked;
///
/// struct Unloaded;
/// impl FrameSource for Unloaded {
///     fn duration(&self) -> f64 { 0.0 }
///     fn is_seeking(&self) -> bool { false }
///     fn request_seek(&mut self, _position: f64) {}
///     fn poll_seeked(&mut self) -> Option<Seeked> { None }
/// }
/// ```
pub trait FrameSource: Send {
    /// Clip length in seconds. `0.0` until the metadata is known.
    fn duration(&self) -> f64;

    /// `true` between `request_seek` and the matching completion.
    fn is_seeking(&self) -> bool;

    /// Ask for the playback position to move. Never blocks.
    fn request_seek(&mut self, position: f64);

    /// Take the completion of the last requested seek, if it has landed.
    ///
    /// Never blocks. Each request completes at most once.
    fn poll_seeked(&mut self) -> Option<Seeked>;
}

/// A 2D glyph drawing target, the equivalent of a canvas context.
///
/// Coordinates passed to `clear` and `fill_glyph` are device-independent;
/// the surface multiplies them by the scale set in `configure`.
///
/// # Example
/// ```
/// use al_core::traits::GlyphSurface;
///
/// #[derive(Default)]
/// struct Count(usize);
/// impl GlyphSurface for Count {
///     fn configure(&mut self, _w: u32, _h: u32, _scale: f32) {}
///     fn clear(&mut self, _w: f32, _h: f32) { self.0 = 0; }
///     fn fill_glyph(&mut self, _ch: char, _x: f32, _y: f32) { self.0 += 1; }
/// }
/// ```
pub trait GlyphSurface {
    /// Resize the backing store (device pixels) and set the coordinate scale.
    fn configure(&mut self, backing_width: u32, backing_height: u32, scale: f32);

    /// Fill `width × height` (device-independent) with the background.
    fn clear(&mut self, width: f32, height: f32);

    /// Draw one glyph with its top-left corner at (x, y).
    fn fill_glyph(&mut self, ch: char, x: f32, y: f32);
}
