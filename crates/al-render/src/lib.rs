//! Glyph rendering for asciiloop.
//!
//! `canvas` lays out index grids on any [`al_core::traits::GlyphSurface`];
//! `terminal` and `raster` are the two concrete surfaces.

pub mod canvas;
pub mod raster;
pub mod terminal;
