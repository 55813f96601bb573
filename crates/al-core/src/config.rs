use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::frame::{Container, GridDims};

/// Complete render configuration.
///
/// Fixed when a render session starts and never mutated afterwards.
/// Every field has a sane default; cutoff and gamma were tuned by eye and
/// are meant to be adjusted per clip.
///
/// # Example
/// ```
/// use al_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.target_fps, 20);
/// assert_eq!(config.brightness_cutoff, 130.0);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RenderConfig {
    // === Glyphs ===
    /// Ramp from least ink to most ink.
    pub ramp: String,
    /// Pixels at or above this luminance [0, 255] become whitespace.
    pub brightness_cutoff: f32,
    /// Power curve exponent. Values > 1 push mid-tones toward light glyphs.
    pub contrast_gamma: f32,

    // === Cells ===
    /// Glyph size in device-independent pixels (cell height).
    pub font_size: f32,
    /// Monospace width / height ratio (cell width = font_size × char_aspect).
    pub char_aspect: f32,

    // === Colors ===
    /// Surface clear color.
    pub background: (u8, u8, u8),
    /// Glyph color.
    pub ink: (u8, u8, u8),

    // === Execution ===
    /// Which render backend to use.
    pub backend: BackendPreference,
    /// Maximum width of captured frames before sampling.
    pub capture_width: u32,

    // === Playback ===
    /// Logical scrub rate.
    pub target_fps: u32,
    /// Margin kept from both ends of the clip, in seconds.
    pub end_buffer: f64,
    /// Stop scrubbing while the terminal reports focus lost.
    pub pause_when_unfocused: bool,
}

/// Requested render backend.
///
/// # Example
/// ```
/// use al_core::config::BackendPreference;
/// assert_eq!(BackendPreference::default(), BackendPreference::Auto);
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum BackendPreference {
    /// Worker when the host supports it, inline otherwise.
    #[default]
    Auto,
    /// Worker thread (still falls back to inline if it cannot start).
    Offloaded,
    /// Always on the calling thread.
    Inline,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ramp: crate::ramp::RAMP_JADE.to_string(),
            brightness_cutoff: 130.0,
            contrast_gamma: 3.0,
            font_size: 12.0,
            char_aspect: 0.55,
            background: (255, 255, 255),
            ink: (0xcb, 0xcb, 0xcb),
            backend: BackendPreference::Auto,
            capture_width: 480,
            target_fps: 20,
            end_buffer: 0.15,
            pause_when_unfocused: true,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        if self.ramp.is_empty() {
            log::warn!("empty ramp in config, using the default ramp");
            self.ramp = crate::ramp::RAMP_JADE.to_string();
        }
        self.brightness_cutoff = clamp_or(self.brightness_cutoff, 1.0, 255.0, 130.0);
        self.contrast_gamma = clamp_or(self.contrast_gamma, 0.05, 10.0, 3.0);
        self.font_size = clamp_or(self.font_size, 4.0, 96.0, 12.0);
        self.char_aspect = clamp_or(self.char_aspect, 0.2, 2.0, 0.55);
        self.capture_width = self.capture_width.clamp(16, 3840);
        self.target_fps = self.target_fps.clamp(1, 60);
        self.end_buffer = if self.end_buffer.is_finite() {
            self.end_buffer.clamp(0.0, 5.0)
        } else {
            0.15
        };
    }

    /// Cell width in device-independent pixels.
    #[inline]
    #[must_use]
    pub fn cell_width(&self) -> f32 {
        self.font_size * self.char_aspect
    }

    /// Cell height in device-independent pixels.
    #[inline]
    #[must_use]
    pub fn cell_height(&self) -> f32 {
        self.font_size
    }

    /// Grid that fits in `container`: `floor(size / cell)` on each axis.
    ///
    /// A quotient within a few ulps of a whole number counts as that number,
    /// so a container of exactly `n` cells yields `n` despite `f32` rounding.
    ///
    /// # Example
    /// ```
    /// use al_core::config::RenderConfig;
    /// use al_core::frame::{Container, GridDims};
    /// let config = RenderConfig::default(); // 6.6 × 12 cells
    /// let dims = config.grid_dims(&Container::new(665.0, 240.0, 2.0));
    /// assert_eq!(dims, GridDims::new(100, 20));
    /// ```
    #[must_use]
    pub fn grid_dims(&self, container: &Container) -> GridDims {
        GridDims::new(
            whole_cells(container.width, self.cell_width()),
            whole_cells(container.height, self.cell_height()),
        )
    }
}

/// `floor(size / cell)`, snapping quotients that are off by rounding only.
fn whole_cells(size: f32, cell: f32) -> u32 {
    let n = size / cell;
    if !n.is_finite() || n <= 0.0 {
        return 0;
    }
    let nearest = n.round();
    let cells = if (n - nearest).abs() <= nearest * 4.0 * f32::EPSILON {
        nearest
    } else {
        n.floor()
    };
    cells as u32
}

fn clamp_or(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

/// Intermediate TOML structure, every section optional.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    playback: Option<PlaybackSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    ramp: Option<String>,
    brightness_cutoff: Option<f32>,
    contrast_gamma: Option<f32>,
    font_size: Option<f32>,
    char_aspect: Option<f32>,
    background: Option<(u8, u8, u8)>,
    ink: Option<(u8, u8, u8)>,
    backend: Option<BackendPreference>,
    capture_width: Option<u32>,
}

/// Playback section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PlaybackSection {
    target_fps: Option<u32>,
    end_buffer: Option<f64>,
    pause_when_unfocused: Option<bool>,
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error if the text is not valid TOML for this schema.
///
/// # Example
/// ```
/// use al_core::config::parse_config;
/// let config = parse_config("[render]\ncontrast_gamma = 1.5\n").unwrap();
/// assert_eq!(config.contrast_gamma, 1.5);
/// assert_eq!(config.brightness_cutoff, 130.0);
/// ```
pub fn parse_config(content: &str) -> Result<RenderConfig> {
    let file: ConfigFile = toml::from_str(content).context("TOML parse error")?;
    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.ramp {
            config.ramp = v;
        }
        if let Some(v) = r.brightness_cutoff {
            config.brightness_cutoff = v;
        }
        if let Some(v) = r.contrast_gamma {
            config.contrast_gamma = v;
        }
        if let Some(v) = r.font_size {
            config.font_size = v;
        }
        if let Some(v) = r.char_aspect {
            config.char_aspect = v;
        }
        if let Some(v) = r.background {
            config.background = v;
        }
        if let Some(v) = r.ink {
            config.ink = v;
        }
        if let Some(v) = r.backend {
            config.backend = v;
        }
        if let Some(v) = r.capture_width {
            config.capture_width = v;
        }
    }

    if let Some(p) = file.playback {
        if let Some(v) = p.target_fps {
            config.target_fps = v;
        }
        if let Some(v) = p.end_buffer {
            config.end_buffer = v;
        }
        if let Some(v) = p.pause_when_unfocused {
            config.pause_when_unfocused = v;
        }
    }

    config.clamp_all();
    Ok(config)
}

/// Load a TOML file and merge it over the defaults.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use al_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("invalid config in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn partial_sections_override() {
        let config = parse_config(
            "[render]\nramp = \" .#\"\nbackend = \"Inline\"\nink = [1, 2, 3]\n\n[playback]\ntarget_fps = 30\n",
        )
        .unwrap();
        assert_eq!(config.ramp, " .#");
        assert_eq!(config.backend, BackendPreference::Inline);
        assert_eq!(config.ink, (1, 2, 3));
        assert_eq!(config.target_fps, 30);
        assert!((config.end_buffer - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            "[render]\nbrightness_cutoff = 999.0\ncontrast_gamma = -1.0\nramp = \"\"\n\n[playback]\ntarget_fps = 0\nend_buffer = 100.0\n",
        )
        .unwrap();
        assert_eq!(config.brightness_cutoff, 255.0);
        assert_eq!(config.contrast_gamma, 0.05);
        assert_eq!(config.ramp, crate::ramp::RAMP_JADE);
        assert_eq!(config.target_fps, 1);
        assert!((config.end_buffer - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(parse_config("[render]\nbackend = \"Gpu\"\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nfont_size = 16.0").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.font_size, 16.0);
        assert!((config.cell_width() - 8.8).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/asciiloop.toml")).is_err());
    }

    #[test]
    fn shipped_configs_parse() {
        let default = parse_config(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(default, RenderConfig::default());
        for preset in [
            include_str!("../../../config/presets/jade.toml"),
            include_str!("../../../config/presets/compact.toml"),
            include_str!("../../../config/presets/blocks.toml"),
        ] {
            let config = parse_config(preset).unwrap();
            assert!(!config.ramp.is_empty());
        }
    }

    #[test]
    fn grid_dims_floor() {
        let config = RenderConfig::default();
        let dims = config.grid_dims(&Container::new(13.1, 11.9, 1.0));
        assert_eq!(dims, GridDims::new(1, 0));
        // 65.995 / 6.6 = 9.9992: still short of a tenth column.
        let dims = config.grid_dims(&Container::new(65.995, 24.0, 1.0));
        assert_eq!(dims, GridDims::new(9, 2));
    }

    #[test]
    fn whole_cell_containers_keep_every_cell() {
        for (font_size, char_aspect) in [(12.0, 0.55), (10.0, 0.6), (13.0, 0.45)] {
            let config = RenderConfig {
                font_size,
                char_aspect,
                ..RenderConfig::default()
            };
            for n in 1..500u16 {
                let container = Container::new(
                    f32::from(n) * config.cell_width(),
                    f32::from(n) * config.cell_height(),
                    1.0,
                );
                let dims = config.grid_dims(&container);
                assert_eq!(
                    dims,
                    GridDims::new(u32::from(n), u32::from(n)),
                    "{font_size}/{char_aspect}"
                );
            }
        }
    }

    #[test]
    fn degenerate_containers_have_no_cells() {
        let config = RenderConfig::default();
        assert!(config.grid_dims(&Container::new(-5.0, 10.0, 1.0)).is_empty());
        assert!(config.grid_dims(&Container::new(f32::NAN, 10.0, 1.0)).is_empty());
    }
}
