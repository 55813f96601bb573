use crate::config::RenderConfig;
use crate::error::CoreError;
use crate::ramp::MAX_RAMP_LEN;

/// Rec. 601 luma weights, matching the browser-era formula.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Luminance → glyph index mapper.
///
/// Pure: the output depends only on the pixel and the three parameters
/// captured at construction. Every render path goes through
/// [`GlyphMapper::map_pixel`] so the visual result cannot drift between them.
///
/// Returned indices are 1-based; `0` means "draw nothing".
///
/// # Example
/// ```
/// use al_core::mapper::GlyphMapper;
/// let mapper = GlyphMapper::new(3, 130.0, 1.0).unwrap();
/// assert_eq!(mapper.map_pixel(255, 255, 255), 0);
/// assert_eq!(mapper.map_pixel(0, 0, 0), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphMapper {
    cutoff: f64,
    gamma: f64,
    /// `ramp_len - 1`.
    max_index: usize,
}

impl GlyphMapper {
    /// Create a mapper for a ramp of `ramp_len` glyphs.
    ///
    /// # Errors
    /// Fails if the ramp is empty or longer than [`MAX_RAMP_LEN`], the cutoff
    /// is outside `(0, 255]`, or the gamma exponent is not a positive finite
    /// number.
    pub fn new(ramp_len: usize, cutoff: f32, gamma: f32) -> Result<Self, CoreError> {
        if ramp_len == 0 {
            return Err(CoreError::EmptyRamp);
        }
        if ramp_len > MAX_RAMP_LEN {
            return Err(CoreError::RampTooLong(ramp_len));
        }
        if !(cutoff > 0.0 && cutoff <= 255.0) {
            return Err(CoreError::Config(format!(
                "brightness cutoff {cutoff} outside (0, 255]"
            )));
        }
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(CoreError::Config(format!(
                "contrast gamma {gamma} must be > 0"
            )));
        }
        Ok(Self {
            cutoff: f64::from(cutoff),
            gamma: f64::from(gamma),
            max_index: ramp_len - 1,
        })
    }

    /// Build from a render configuration.
    ///
    /// # Errors
    /// See [`GlyphMapper::new`].
    pub fn from_config(config: &RenderConfig) -> Result<Self, CoreError> {
        Self::new(
            config.ramp.chars().count(),
            config.brightness_cutoff,
            config.contrast_gamma,
        )
    }

    /// Luminance of an RGB triple.
    #[inline(always)]
    #[must_use]
    pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
        LUMA_R * f64::from(r) + LUMA_G * f64::from(g) + LUMA_B * f64::from(b)
    }

    /// Map a pixel to a 1-based glyph index (`0` = whitespace).
    #[inline(always)]
    #[must_use]
    pub fn map_pixel(&self, r: u8, g: u8, b: u8) -> u8 {
        self.map_luminance(Self::luminance(r, g, b))
    }

    /// Map a luminance value to a 1-based glyph index (`0` = whitespace).
    ///
    /// # Example
    /// ```
    /// use al_core::mapper::GlyphMapper;
    /// let mapper = GlyphMapper::new(3, 130.0, 1.0).unwrap();
    /// assert_eq!(mapper.map_luminance(130.0), 0);
    /// assert_eq!(mapper.map_luminance(65.0), 2);
    /// assert_eq!(mapper.map_luminance(0.0), 3);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn map_luminance(&self, luminance: f64) -> u8 {
        if luminance >= self.cutoff {
            return 0;
        }
        let normalized = 1.0 - luminance / self.cutoff;
        let curved = normalized.powf(self.gamma);
        let index = ((curved * self.max_index as f64).floor() as usize).min(self.max_index);
        (index + 1) as u8
    }

    /// Map a row-major RGBA buffer into `out`, one value per pixel.
    ///
    /// Stops at whichever of the two buffers runs out first.
    #[inline]
    pub fn map_rgba(&self, rgba: &[u8], out: &mut [u8]) {
        for (px, slot) in rgba.chunks_exact(4).zip(out.iter_mut()) {
            *slot = self.map_pixel(px[0], px[1], px[2]);
        }
    }
}
