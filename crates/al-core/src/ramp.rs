use crate::error::CoreError;

/// Curated 26-glyph ramp: short enough that shapes stay recognisable.
pub const RAMP_JADE: &str = " .,:;+*?%S#@!$%^&(-_=+`~#\"";

/// 10 characters, good contrast.
pub const RAMP_COMPACT: &str = " .:-=+*#%@";

/// Unicode shade blocks.
pub const RAMP_BLOCKS: &str = " ░▒▓█";

/// Longest ramp a `u8` grid value can address (values are 1-based).
pub const MAX_RAMP_LEN: usize = u8::MAX as usize;

/// Ordered glyph sequence from least ink to most ink.
///
/// Fixed at construction and never empty.
///
/// # Example
/// ```
/// use al_core::ramp::GlyphRamp;
/// let ramp = GlyphRamp::new(" .#").unwrap();
/// assert_eq!(ramp.len(), 3);
/// assert_eq!(ramp.glyph(2), Some('.'));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    chars: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from a string ordered lightest → densest.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyRamp`] if `ramp` has no characters, or
    /// [`CoreError::RampTooLong`] past [`MAX_RAMP_LEN`] glyphs.
    pub fn new(ramp: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = ramp.chars().collect();
        if chars.is_empty() {
            return Err(CoreError::EmptyRamp);
        }
        if chars.len() > MAX_RAMP_LEN {
            return Err(CoreError::RampTooLong(chars.len()));
        }
        Ok(Self { chars })
    }

    /// Number of glyphs in the ramp (always ≥ 1).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always `false`; present for clippy's `len_without_is_empty`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Glyph for a 1-based grid value. `0` and out-of-range values yield `None`.
    ///
    /// # Example
    /// ```
    /// use al_core::ramp::GlyphRamp;
    /// let ramp = GlyphRamp::new(" .#").unwrap();
    /// assert_eq!(ramp.glyph(0), None);
    /// assert_eq!(ramp.glyph(3), Some('#'));
    /// assert_eq!(ramp.glyph(4), None);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn glyph(&self, value: u8) -> Option<char> {
        let idx = usize::from(value).checked_sub(1)?;
        self.chars.get(idx).copied()
    }

}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            chars: RAMP_JADE.chars().collect(),
        }
    }
}
