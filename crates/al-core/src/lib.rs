//! Configuration, types, and shared structures for asciiloop.
//!
//! This crate contains the glyph ramp, the luminance mapper, the playback
//! state machine, and every type that crosses a thread or crate boundary.

pub mod config;
pub mod error;
pub mod frame;
pub mod mapper;
pub mod playback;
pub mod ramp;
pub mod traits;

pub use config::RenderConfig;
pub use error::CoreError;
pub use frame::{Container, FrameBuffer, GridDims, IndexGrid, Seeked};
pub use mapper::GlyphMapper;
pub use playback::{Direction, PlaybackDriver, Tick};
pub use ramp::GlyphRamp;
