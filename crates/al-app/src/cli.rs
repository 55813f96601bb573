use std::path::PathBuf;

use al_core::config::{BackendPreference, RenderConfig};
use clap::{Parser, ValueEnum};

/// asciiloop: play a video back and forth as ASCII art in the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Video to scrub. Repeat to stack several clips, each in its own pane.
    /// Requires ffmpeg and ffprobe on PATH.
    #[arg(long, required = true)]
    pub video: Vec<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Load config/presets/<name>.toml instead of --config.
    #[arg(long)]
    pub preset: Option<String>,

    /// Scrub rate in frames per second.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Render backend.
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Render a single frame of the (single) video to this PNG file instead
    /// of playing.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Snapshot position in seconds.
    #[arg(long, default_value_t = 0.0)]
    pub at: f64,

    /// TrueType/OpenType font for the snapshot.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Snapshot width in device-independent pixels.
    #[arg(long, default_value_t = 960)]
    pub width: u32,

    /// Snapshot height in device-independent pixels.
    #[arg(long, default_value_t = 540)]
    pub height: u32,

    /// Snapshot device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f32,
}

/// `--backend` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    Offloaded,
    Inline,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::Offloaded => Self::Offloaded,
            BackendArg::Inline => Self::Inline,
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if let Some(backend) = self.backend {
            config.backend = backend.into();
        }
        config.clamp_all();
    }
}
