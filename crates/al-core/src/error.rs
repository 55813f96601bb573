use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A glyph ramp needs at least one character.
    #[error("glyph ramp is empty")]
    EmptyRamp,

    /// Grid values are `u8`, so a ramp holds at most 255 glyphs.
    #[error("glyph ramp has {0} glyphs, at most 255 are addressable")]
    RampTooLong(usize),
}
