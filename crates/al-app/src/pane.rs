use al_ascii::backend::{RenderBackend, Submission};
use al_core::config::RenderConfig;
use al_core::frame::Container;
use al_core::playback::{PlaybackDriver, Tick};
use al_core::traits::FrameSource;
use al_render::canvas::GlyphCanvas;
use al_render::terminal::TerminalSurface;
use anyhow::Result;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::stats::RenderStats;

/// Draws averaged by the recent-rate window.
const STATS_WINDOW: usize = 30;

/// One render instance: a clip, its backend and its own terminal region.
///
/// Panes share nothing. Each owns its capture thread (behind `source`), its
/// backend (and worker, when offloaded), its scrub state and its canvas.
pub struct Pane {
    label: String,
    config: RenderConfig,
    source: Box<dyn FrameSource>,
    backend: Box<dyn RenderBackend<TerminalSurface>>,
    canvas: GlyphCanvas<TerminalSurface>,
    driver: PlaybackDriver,
    stats: RenderStats,
    focused: bool,
    area_empty: bool,
}

impl Pane {
    /// Assemble an instance. Nothing is requested from the source yet.
    ///
    /// # Errors
    /// Returns an error if the configured ramp cannot be drawn.
    pub fn new(
        label: impl Into<String>,
        config: RenderConfig,
        source: Box<dyn FrameSource>,
        backend: Box<dyn RenderBackend<TerminalSurface>>,
    ) -> Result<Self> {
        let label = label.into();
        let canvas = GlyphCanvas::new(TerminalSurface::new(&config), &config)?;
        let driver = PlaybackDriver::new(config.target_fps, config.end_buffer);
        let stats = RenderStats::new(config.target_fps, STATS_WINDOW);
        log::info!(
            "{label}: {} backend, clip {:.2}s, {} fps",
            backend.name(),
            source.duration(),
            config.target_fps
        );
        Ok(Self {
            label,
            config,
            source,
            backend,
            canvas,
            driver,
            stats,
            focused: true,
            area_empty: true,
        })
    }

    /// Rewind the clip and ask for the first frame.
    pub fn start(&mut self) {
        self.driver.reset();
        self.source.request_seek(0.0);
    }

    /// One cooperative iteration: advance the scrub clock, hand a landed
    /// frame to the backend, collect finished grids.
    ///
    /// Returns `true` if the canvas changed and needs to be shown.
    pub fn step(&mut self, now_ms: f64) -> bool {
        match self
            .driver
            .tick(now_ms, self.source.duration(), self.source.is_seeking())
        {
            Tick::Seek(position) => self.source.request_seek(position),
            Tick::Hidden | Tick::Throttled | Tick::NotReady => {}
        }

        let mut changed = false;
        if let Some(seeked) = self.source.poll_seeked() {
            match seeked.frame {
                Some(frame) => match self.backend.submit_frame(frame, &mut self.canvas) {
                    Submission::Submitted => changed |= !self.backend.is_busy(),
                    Submission::Dropped => {
                        self.stats.record_dropped();
                        log::trace!("{}: frame at {:.3}s dropped", self.label, seeked.position);
                    }
                },
                None => {
                    self.stats.record_missing();
                    log::debug!("{}: no frame captured at {:.3}s", self.label, seeked.position);
                }
            }
        }

        changed |= self.backend.poll(&mut self.canvas);
        if changed {
            self.stats.record_drawn(now_ms);
            log::trace!(
                "{}: {:.1} fps, {:.0}% of target",
                self.label,
                self.stats.recent_fps(),
                self.stats.pace() * 100.0
            );
        }
        changed
    }

    /// The pane now covers `cols × rows` terminal cells.
    pub fn resize_to(&mut self, cols: u16, rows: u16) {
        let container = Container::new(
            f32::from(cols) * self.config.cell_width(),
            f32::from(rows) * self.config.cell_height(),
            1.0,
        );
        if let Some(dims) = self.canvas.resize(container) {
            self.backend.resize(dims);
        }
        self.area_empty = cols == 0 || rows == 0;
        self.update_visibility();
    }

    /// Terminal focus changed.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.update_visibility();
    }

    fn update_visibility(&mut self) {
        let visible = !self.area_empty && (self.focused || !self.config.pause_when_unfocused);
        if visible != self.driver.is_visible() {
            log::debug!("{}: visible = {visible}", self.label);
        }
        self.driver.set_visible(visible);
    }

    /// Copy the canvas into `buf` at `area`.
    pub fn render(&self, buf: &mut Buffer, area: Rect) {
        self.canvas.surface().render(buf, area);
    }

    /// Join the worker and log the session totals.
    pub fn dispose(&mut self) {
        self.backend.dispose();
        log::info!("{}: {}", self.label, self.stats.report());
    }

    #[must_use]
    pub fn canvas(&self) -> &GlyphCanvas<TerminalSurface> {
        &self.canvas
    }

    #[must_use]
    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    #[must_use]
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use al_ascii::inline::InlineBackend;
    use al_ascii::worker::{OffloadedBackend, WorkerReply, WorkerRequest};
    use al_core::frame::{FrameBuffer, Seeked};

    /// In-memory clip: every seek lands on the next poll with a flat frame of
    /// luminance `luma`, or without a frame when `luma` is `None`.
    pub(crate) struct StillClip {
        pub duration: f64,
        pub luma: Option<u8>,
        pub pending: Option<f64>,
        pub requests: Arc<Mutex<Vec<f64>>>,
    }

    impl StillClip {
        pub(crate) fn new(luma: Option<u8>) -> Self {
            Self {
                duration: 2.0,
                luma,
                pending: None,
                requests: Arc::default(),
            }
        }
    }

    impl FrameSource for StillClip {
        fn duration(&self) -> f64 {
            self.duration
        }
        fn is_seeking(&self) -> bool {
            self.pending.is_some()
        }
        fn request_seek(&mut self, position: f64) {
            self.pending = Some(position);
            if let Ok(mut log) = self.requests.lock() {
                log.push(position);
            }
        }
        fn poll_seeked(&mut self) -> Option<Seeked> {
            let position = self.pending.take()?;
            let frame = self.luma.map(|v| {
                let mut frame = FrameBuffer::new(16, 16);
                for px in frame.data.chunks_exact_mut(4) {
                    px.copy_from_slice(&[v, v, v, 255]);
                }
                frame
            });
            Some(Seeked { position, frame })
        }
    }

    pub(crate) fn config() -> RenderConfig {
        RenderConfig {
            ramp: " .#".into(),
            ..RenderConfig::default()
        }
    }

    pub(crate) fn pane(luma: Option<u8>) -> (Pane, Arc<Mutex<Vec<f64>>>) {
        let config = config();
        let source = StillClip::new(luma);
        let requests = Arc::clone(&source.requests);
        let backend = Box::new(InlineBackend::new(&config).unwrap());
        let pane = Pane::new("clip", config, Box::new(source), backend).unwrap();
        (pane, requests)
    }

    #[test]
    fn first_frame_is_drawn_from_position_zero() {
        let (mut pane, requests) = pane(Some(0));
        pane.resize_to(20, 5);
        pane.start();
        assert!(pane.step(0.0));
        assert_eq!(pane.canvas().surface().get(0, 0), Some('#'));
        assert_eq!(pane.canvas().surface().get(19, 4), Some('#'));
        assert_eq!(requests.lock().unwrap()[0], 0.0);
    }

    #[test]
    fn ticks_scrub_forward() {
        let (mut pane, requests) = pane(Some(0));
        pane.resize_to(20, 5);
        pane.start();
        pane.step(0.0);
        pane.step(50.0);
        pane.step(100.0);
        let positions = requests.lock().unwrap().clone();
        assert_eq!(positions.len(), 3);
        assert!(positions[2] > positions[1]);
        assert!((pane.driver().position() - positions[2]).abs() < 1e-12);
        assert_eq!(pane.stats().report().drawn, 3);
        assert!((pane.stats().recent_fps() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn focus_loss_pauses_scrubbing() {
        let (mut pane, requests) = pane(Some(0));
        pane.resize_to(20, 5);
        pane.start();
        pane.step(0.0);
        pane.set_focused(false);
        for i in 1..20 {
            pane.step(f64::from(i) * 100.0);
        }
        assert_eq!(requests.lock().unwrap().len(), 1);
        pane.set_focused(true);
        pane.step(5000.0);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_area_is_hidden() {
        let (mut pane, _) = pane(Some(0));
        pane.resize_to(0, 0);
        assert!(!pane.driver().is_visible());
        pane.resize_to(10, 3);
        assert!(pane.driver().is_visible());
        assert_eq!(pane.canvas().surface().size(), (10, 3));
    }

    #[test]
    fn failed_captures_are_counted_not_drawn() {
        let (mut pane, _) = pane(None);
        pane.resize_to(20, 5);
        pane.start();
        assert!(!pane.step(0.0));
        assert!(!pane.step(50.0));
        let report = pane.stats().report();
        assert_eq!(report.missing, 2);
        assert_eq!(report.drawn, 0);
        assert_eq!(pane.canvas().surface().get(0, 0), Some(' '));
    }

    #[test]
    fn frames_landing_while_busy_are_counted_as_dropped() {
        let config = config();
        let (request_tx, requests) = flume::unbounded::<WorkerRequest>();
        let (replies, reply_rx) = flume::unbounded::<WorkerReply>();
        let (recycle_tx, _recycled) = flume::bounded(2);
        let backend = OffloadedBackend::with_channels(request_tx, reply_rx, recycle_tx);
        let source = StillClip::new(Some(0));
        let mut pane = Pane::new("busy", config, Box::new(source), Box::new(backend)).unwrap();
        pane.resize_to(20, 5);
        pane.start();

        assert!(!pane.step(0.0));
        assert!(!pane.step(50.0));
        assert!(!pane.step(100.0));
        let report = pane.stats().report();
        assert_eq!(report.dropped, 2);
        assert_eq!(report.drawn, 0);
        // Init and the single frame in flight.
        assert_eq!(requests.len(), 2);
        drop(replies);
    }
}
