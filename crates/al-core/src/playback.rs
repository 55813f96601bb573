/// Scrub direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// Outcome of one scheduling tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// Not visible: no work at all.
    Hidden,
    /// Less than one frame interval since the last processed tick.
    Throttled,
    /// Clip not loaded yet, or a seek is still in flight.
    NotReady,
    /// Move the clip to this position (seconds).
    Seek(f64),
}

/// Ping-pong scrub clock.
///
/// Advances the position by `1 / target_fps` seconds per processed tick,
/// forward until `duration - end_buffer`, then backward until `end_buffer`,
/// independently of the media's own playback clock. All state is owned here
/// and only `tick`, `set_visible` and `reset` mutate it.
///
/// # Example
/// ```
/// use al_core::playback::{PlaybackDriver, Tick};
/// let mut driver = PlaybackDriver::new(20, 0.15);
/// assert_eq!(driver.tick(0.0, 10.0, false), Tick::Seek(0.15));
/// assert_eq!(driver.tick(10.0, 10.0, false), Tick::Throttled);
/// ```
#[derive(Clone, Debug)]
pub struct PlaybackDriver {
    /// Current scrub position in seconds.
    position: f64,
    direction: Direction,
    /// Timestamp (ms) of the last tick that passed the rate limiter.
    last_tick_ms: Option<f64>,
    visible: bool,
    frame_interval_ms: f64,
    step_secs: f64,
    end_buffer: f64,
}

impl PlaybackDriver {
    /// Create a driver at position 0, moving forward, visible.
    #[must_use]
    pub fn new(target_fps: u32, end_buffer: f64) -> Self {
        let fps = f64::from(target_fps.max(1));
        Self {
            position: 0.0,
            direction: Direction::Forward,
            last_tick_ms: None,
            visible: true,
            frame_interval_ms: 1000.0 / fps,
            step_secs: 1.0 / fps,
            end_buffer: end_buffer.max(0.0),
        }
    }

    /// Visibility signal from the host.
    #[inline]
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Back to the start of the clip (media loaded or reloaded).
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.direction = Direction::Forward;
        self.last_tick_ms = None;
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// One scheduling step.
    ///
    /// `now_ms` is a monotonic timestamp, `duration` the clip length
    /// (`0` = not loaded), `seeking` whether a previous request is pending.
    pub fn tick(&mut self, now_ms: f64, duration: f64, seeking: bool) -> Tick {
        if !self.visible {
            return Tick::Hidden;
        }
        if let Some(last) = self.last_tick_ms
            && now_ms - last < self.frame_interval_ms
        {
            return Tick::Throttled;
        }
        self.last_tick_ms = Some(now_ms);

        if !(duration.is_finite() && duration > 0.0) || seeking {
            return Tick::NotReady;
        }

        let low = self.end_buffer;
        let high = duration - self.end_buffer;
        if high <= low {
            // Clip shorter than both margins: hold the midpoint.
            let mid = duration / 2.0;
            if self.position == mid {
                return Tick::NotReady;
            }
            self.position = mid;
            return Tick::Seek(mid);
        }

        let mut next = self.position + self.direction.sign() * self.step_secs;
        if next >= high {
            next = high;
            self.direction = Direction::Backward;
        } else if next <= low {
            next = low;
            self.direction = Direction::Forward;
        }
        self.position = next;
        Tick::Seek(next)
    }
}
