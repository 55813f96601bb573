use std::collections::VecDeque;
use std::fmt;

/// Draw accounting for one pane.
///
/// Counts grids that reached the canvas, frames the backend turned away
/// while a grid was in flight, and seeks that landed without a frame.
/// Timestamps are the loop's monotonic milliseconds, so the clock stays with
/// the caller.
#[derive(Debug)]
pub struct RenderStats {
    target_fps: u32,
    window: usize,
    recent: VecDeque<f64>,
    first_ms: Option<f64>,
    last_ms: f64,
    drawn: u64,
    dropped: u64,
    missing: u64,
}

impl RenderStats {
    /// Stats against a scrub rate of `target_fps`, averaging the recent rate
    /// over the last `window` draws.
    #[must_use]
    pub fn new(target_fps: u32, window: usize) -> Self {
        let window = window.max(2);
        Self {
            target_fps: target_fps.max(1),
            window,
            recent: VecDeque::with_capacity(window + 1),
            first_ms: None,
            last_ms: 0.0,
            drawn: 0,
            dropped: 0,
            missing: 0,
        }
    }

    /// A grid reached the canvas at `now_ms`.
    pub fn record_drawn(&mut self, now_ms: f64) {
        self.drawn += 1;
        self.first_ms.get_or_insert(now_ms);
        self.last_ms = now_ms;
        self.recent.push_back(now_ms);
        if self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    /// The backend refused a frame because one was still in flight.
    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    /// A seek completed without a captured frame.
    pub fn record_missing(&mut self) {
        self.missing += 1;
    }

    /// Draw rate over the window, `0` until two draws are known.
    #[must_use]
    pub fn recent_fps(&self) -> f64 {
        match (self.recent.front(), self.recent.back()) {
            (Some(&first), Some(&last)) if last > first => {
                (self.recent.len() - 1) as f64 * 1000.0 / (last - first)
            }
            _ => 0.0,
        }
    }

    /// Recent draw rate as a fraction of the scrub rate.
    #[must_use]
    pub fn pace(&self) -> f64 {
        self.recent_fps() / f64::from(self.target_fps)
    }

    /// Totals for the whole session.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        let mean_fps = match self.first_ms {
            Some(first) if self.last_ms > first => {
                (self.drawn - 1) as f64 * 1000.0 / (self.last_ms - first)
            }
            _ => 0.0,
        };
        StatsReport {
            drawn: self.drawn,
            dropped: self.dropped,
            missing: self.missing,
            mean_fps,
            target_fps: self.target_fps,
        }
    }
}

/// End-of-session summary, logged when a pane is disposed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatsReport {
    pub drawn: u64,
    pub dropped: u64,
    pub missing: u64,
    /// Mean draw rate between the first and the last draw.
    pub mean_fps: f64,
    pub target_fps: u32,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} grids drawn at {:.1}/{} fps, {} frames dropped while busy, {} empty captures",
            self.drawn, self.mean_fps, self.target_fps, self.dropped, self.missing
        )
    }
}
