//! Frame-to-glyph conversion backends for asciiloop.
//!
//! Two interchangeable strategies behind [`backend::RenderBackend`]: an
//! offloaded worker thread and an inline fallback. Both share
//! [`map::map_frame`]'s sampling and mapping, so their output is identical.

pub mod backend;
pub mod inline;
pub mod map;
pub mod worker;

#[cfg(test)]
mod testing;

use std::num::NonZeroUsize;

use al_core::config::{BackendPreference, RenderConfig};
use al_core::traits::GlyphSurface;
use anyhow::Result;

pub use backend::{RenderBackend, Submission};
pub use inline::InlineBackend;
pub use worker::OffloadedBackend;

/// What the host can do, probed once per render session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Threads the host can run in parallel.
    pub parallelism: usize,
    /// A dedicated worker thread is worth starting.
    pub offload: bool,
}

/// Probe the host.
///
/// # Example
/// ```
/// let caps = al_ascii::detect_capabilities();
/// assert!(caps.parallelism >= 1);
/// ```
#[must_use]
pub fn detect_capabilities() -> Capabilities {
    let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    Capabilities {
        parallelism,
        offload: parallelism > 1,
    }
}

/// Pick the backend for this session.
///
/// `Auto` offloads when the host has more than one hardware thread. A worker
/// that fails to start degrades to the inline backend with a warning.
///
/// # Errors
/// Returns an error if the ramp, cutoff or gamma are invalid.
pub fn select_backend<S: GlyphSurface>(
    config: &RenderConfig,
    caps: Capabilities,
) -> Result<Box<dyn RenderBackend<S>>> {
    let offload = match config.backend {
        BackendPreference::Inline => false,
        BackendPreference::Offloaded => true,
        BackendPreference::Auto => caps.offload,
    };

    if offload {
        match OffloadedBackend::spawn(config) {
            Ok(backend) => {
                log::info!("render backend: offloaded");
                return Ok(Box::new(backend));
            }
            Err(e) => log::warn!("worker unavailable ({e:#}), rendering inline"),
        }
    }
    log::info!("render backend: inline");
    Ok(Box::new(InlineBackend::new(config)?))
}
