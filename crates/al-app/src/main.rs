use std::path::{Path, PathBuf};

use al_ascii::{detect_capabilities, select_backend};
use al_core::config::{RenderConfig, load_config};
use al_source::video::VideoSource;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableFocusChange, EnableFocusChange};

pub mod app;
pub mod cli;
pub mod pane;
pub mod snapshot;
pub mod stats;

fn main() -> Result<()> {
    // 1. CLI
    let cli = cli::Cli::parse();

    // 2. Logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Config, then command-line overrides
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Headless export
    if let Some(output) = cli.snapshot.clone() {
        let opts = snapshot::SnapshotOptions {
            output,
            at: cli.at,
            font: cli.font.clone().context("--snapshot needs --font <file.ttf>")?,
            width: cli.width,
            height: cli.height,
            dpr: cli.dpr,
        };
        let [video] = cli.video.as_slice() else {
            anyhow::bail!("--snapshot takes exactly one --video");
        };
        return snapshot::export(video, &config, &opts);
    }

    // 5. One capture thread and backend per clip, before touching the terminal
    let mut panes = Vec::with_capacity(cli.video.len());
    for video in &cli.video {
        panes.push(open_pane(video, &config)?);
    }
    let mut app_instance = app::App::new(panes);

    // 6. Terminal
    let terminal = ratatui::init();
    if let Err(e) = crossterm::execute!(std::io::stdout(), EnableFocusChange) {
        log::warn!("focus reporting unavailable: {e}");
    }

    // 7. Main loop
    let result = app_instance.run(terminal);

    // 8. Teardown: workers and capture threads joined, terminal restored
    drop(app_instance);
    let _ = crossterm::execute!(std::io::stdout(), DisableFocusChange);
    ratatui::restore();

    result
}

/// Probe `video`, start its capture thread and pick its backend.
fn open_pane(video: &Path, config: &RenderConfig) -> Result<pane::Pane> {
    let source = VideoSource::open(video, config.capture_width)
        .with_context(|| format!("cannot open {}", video.display()))?;
    let backend = select_backend(config, detect_capabilities())?;
    let label = video
        .file_name()
        .map_or_else(|| video.display().to_string(), |n| n.to_string_lossy().into_owned());
    pane::Pane::new(label, config.clone(), Box::new(source), backend)
}

/// Resolve config: preset takes priority over --config.
fn resolve_config(cli: &cli::Cli) -> Result<RenderConfig> {
    if let Some(ref name) = cli.preset {
        let path = PathBuf::from(format!("config/presets/{name}.toml"));
        if path.exists() {
            load_config(&path)
        } else {
            anyhow::bail!("unknown preset: {name}. See config/presets/ (jade, compact, blocks)");
        }
    } else if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::warn!(
            "config not found: {}. Using defaults.",
            cli.config.display()
        );
        Ok(RenderConfig::default())
    }
}
