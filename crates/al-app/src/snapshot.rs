use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use al_ascii::backend::Submission;
use al_ascii::{detect_capabilities, select_backend};
use al_core::config::RenderConfig;
use al_core::frame::Container;
use al_render::canvas::GlyphCanvas;
use al_render::raster::RasterSurface;
use al_source::video::{capture_frame, capture_size, probe_video};
use anyhow::{Context, Result};

/// Longest wait for the worker to finish the snapshot grid.
const RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless export of one frame.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub output: PathBuf,
    pub at: f64,
    pub font: PathBuf,
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
}

/// Clamp a requested position to the range the scrub loop can reach.
#[must_use]
pub fn reachable_position(at: f64, duration: f64, end_buffer: f64) -> f64 {
    if duration <= 2.0 * end_buffer {
        return duration / 2.0;
    }
    if at.is_finite() {
        at.clamp(end_buffer, duration - end_buffer)
    } else {
        end_buffer
    }
}

/// Render the frame at `opts.at` through the configured backend and write it
/// as a PNG.
///
/// # Errors
/// Returns an error if the video, the font or the output file cannot be
/// used, or if the backend never produces a grid.
pub fn export(video: &Path, config: &RenderConfig, opts: &SnapshotOptions) -> Result<()> {
    let info = probe_video(video)?;
    let (w, h) = capture_size(&info, config.capture_width);
    let at = reachable_position(opts.at, info.duration, config.end_buffer);
    let frame = capture_frame(video, at, w, h)?
        .with_context(|| format!("no frame at {at:.3}s in {}", video.display()))?;

    let surface = RasterSurface::from_font_file(&opts.font, config)?;
    let mut canvas = GlyphCanvas::new(surface, config)?;
    let container = Container::new(opts.width as f32, opts.height as f32, opts.dpr);
    let dims = canvas.resize(container).unwrap_or_else(|| canvas.dims());
    anyhow::ensure!(
        !dims.is_empty(),
        "{}x{} is too small for a single glyph cell",
        opts.width,
        opts.height
    );

    let mut backend = select_backend(config, detect_capabilities())?;
    backend.resize(dims);
    if backend.submit_frame(frame, &mut canvas) == Submission::Dropped {
        anyhow::bail!("{} backend refused the frame", backend.name());
    }
    let deadline = Instant::now() + RENDER_TIMEOUT;
    while backend.is_busy() {
        backend.poll(&mut canvas);
        if Instant::now() > deadline {
            backend.dispose();
            anyhow::bail!("{} backend timed out", backend.name());
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    backend.dispose();

    log::info!(
        "snapshot at {at:.3}s: {}x{} cells, {} backend",
        dims.cols,
        dims.rows,
        backend.name()
    );
    canvas.surface().save_png(&opts.output)
}
