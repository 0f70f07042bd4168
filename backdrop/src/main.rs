//! Backdrop
//!
//! Background video player for resource-constrained displays. Cycles through
//! a list of video sources while keeping at most one live player; sources that
//! are not playing are represented by the screenshot taken when they paused.

mod controls;
mod host;
mod prefs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bd_common::{SourceKey, Viewport};
use bd_playback::{ManagerConfig, VideoManager, DEFAULT_RESIZE_DEBOUNCE_MS};
use bd_player::{PlayerBackend, SyntheticOptions};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::controls::{spawn_stdin_reader, HELP};
use crate::host::Host;
use crate::prefs::Preferences;

const DEMO_SOURCE: &str =
    "https://stream.mux.com/7YtWnCpXIt014uMcBK65ZjGfnScdcAneU9TjM9nGAJhk.m3u8";

/// Backdrop - background video with a single shared player
#[derive(Parser, Debug)]
#[command(name = "backdrop")]
#[command(about = "Cycle background videos through one shared player resource")]
#[command(version)]
struct Args {
    /// Video source URLs, played in order
    #[arg(default_values_t = [DEMO_SOURCE.to_string()])]
    sources: Vec<String>,

    /// Player backend (synthetic, black)
    #[arg(long, default_value = "synthetic")]
    backend: PlayerBackend,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Seconds before switching to the next source
    #[arg(long, default_value_t = 30)]
    interval_secs: u64,

    /// Forget least-recently-played sources beyond this many
    #[arg(long)]
    max_sources: Option<usize>,

    /// Quiet period before a resize is applied, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RESIZE_DEBOUNCE_MS)]
    resize_debounce_ms: u64,

    /// Preferences file (defaults to the user config directory)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Write the screenshot of every paused source into this directory
    #[arg(long)]
    screenshot_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not read controls from stdin
    #[arg(long)]
    no_controls: bool,
}

fn init_logging(log_level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .init();
        return;
    }

    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let prefs_path = args.prefs.clone().or_else(Preferences::default_path);
    let prefs = match &prefs_path {
        Some(path) => Preferences::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable preferences");
            Preferences::default()
        }),
        None => Preferences::default(),
    };

    let viewport = Viewport::new(args.width.max(1), args.height.max(1));
    let sources: Vec<SourceKey> = args
        .sources
        .iter()
        .map(SourceKey::new)
        .filter(|k| !k.as_str().is_empty())
        .collect();

    let config = ManagerConfig {
        max_sources: args.max_sources,
        resize_debounce_ms: args.resize_debounce_ms,
    };
    let factory = args.backend.factory(SyntheticOptions::default());
    let manager = Arc::new(VideoManager::with_settings(factory, config, prefs.settings()));

    info!(
        backend = %args.backend,
        %viewport,
        sources = sources.len(),
        interval_secs = args.interval_secs,
        "Backdrop starting"
    );

    let (tx, rx) = mpsc::channel(16);
    let _reader = if args.no_controls {
        None
    } else {
        eprintln!("{HELP}");
        Some(spawn_stdin_reader(tx.clone()))
    };
    // Kept alive so a closed stdin does not end the command stream early.
    let _tx = tx;

    let host = Host::new(
        manager.clone(),
        sources,
        viewport,
        Duration::from_secs(args.interval_secs.max(1)),
        args.screenshot_dir.clone(),
    );
    host.run(rx).await?;

    if let Some(path) = &prefs_path {
        let settings = manager.settings().await;
        Preferences::from_settings(&settings)
            .save(path)
            .with_context(|| format!("Failed to save preferences to {}", path.display()))?;
        info!(path = %path.display(), "Preferences saved");
    }

    Ok(())
}
