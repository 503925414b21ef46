use std::{fs::File, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;

use neurobeats::{
    app::App,
    audio::{Analyser, CpalMicrophone, MusicPlayer, SignalSource},
    cli::Cli,
    config::{self, Config, DEFAULT_CONFIG_FILE},
    ui,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The UI owns the terminal, so logs go to a file
    let log_path = cli.log_path();
    let log_file = File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    // Explicit --config, or auto-detect neurobeats.toml in the working directory
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    });
    let mut config = match &config_path {
        Some(path) => {
            let cfg = config::load_config(path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    // Command line values win over the file
    if let Some(theme) = cli.theme {
        config.display.theme = theme;
    }
    if let Some(mode) = cli.mode {
        config.display.mode = mode;
    }
    if let Some(fps) = cli.fps {
        config.display.fps = fps;
    }
    if cli.seed.is_some() {
        config.display.seed = cli.seed;
    }
    config.validate().context("invalid configuration")?;

    let catalog = config
        .resolve_catalog(cli.catalog.as_deref())
        .context("failed to load track catalog")?;

    if cli.list_tracks {
        for track in &catalog {
            println!(
                "{:<10} {:<28} {:<24} {}",
                track.id,
                track.title,
                track.artist,
                track.duration_label()
            );
        }
        return Ok(());
    }

    log::info!(
        "{} tracks, fft {} ({} bins), {} fps, mode {}, theme {}",
        catalog.len(),
        config.audio.fft_size,
        config.audio.fft_size / 2,
        config.display.fps,
        config.display.mode.name(),
        config.display.theme.name()
    );

    let analyser = Analyser::new(config.audio.fft_size, config.audio.buffer_capacity);
    let source = SignalSource::new(
        analyser,
        catalog,
        Box::new(MusicPlayer::new()),
        Box::new(CpalMicrophone),
        config.audio.volume,
    );
    let app = App::new(source, &config, Instant::now());

    ui::run(app)
}
