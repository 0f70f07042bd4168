//! Playlist host: cycles through sources and reacts to viewer controls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bd_common::{RenderTarget, SourceKey, Viewport};
use bd_playback::{PlayOutcome, ResizeDebouncer, VideoManager};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::controls::Command;

pub struct Host {
    manager: Arc<VideoManager>,
    debouncer: ResizeDebouncer,
    sources: Vec<SourceKey>,
    index: usize,
    /// Startup viewport; resizes reach new targets through the manager.
    viewport: Viewport,
    interval: Duration,
    screenshot_dir: Option<PathBuf>,
    paused: bool,
}

impl Host {
    pub fn new(
        manager: Arc<VideoManager>,
        sources: Vec<SourceKey>,
        viewport: Viewport,
        interval: Duration,
        screenshot_dir: Option<PathBuf>,
    ) -> Self {
        let debouncer = ResizeDebouncer::spawn(manager.clone(), manager.config().resize_debounce());
        Self {
            manager,
            debouncer,
            sources,
            index: 0,
            viewport,
            interval,
            screenshot_dir,
            paused: false,
        }
    }

    /// Run until `q`, Ctrl-C, or forever when neither arrives.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> anyhow::Result<()> {
        if self.sources.is_empty() {
            anyhow::bail!("No sources to play");
        }

        self.play_current().await;

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut controls_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.paused && self.sources.len() > 1 {
                        self.next().await;
                    }
                }
                command = commands.recv(), if controls_open => match command {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        let restarts_playlist = matches!(command, Command::Next | Command::PauseAll);
                        self.handle(command).await;
                        if restarts_playlist {
                            ticker.reset();
                        }
                    }
                    None => controls_open = false,
                },
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        warn!(error = %e, "Ctrl-C handler failed");
                    }
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.manager.pause_all().await;
        if let Some(key) = self.sources.get(self.index).cloned() {
            self.write_screenshot(&key).await;
        }
        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::ToggleMute => {
                let muted = self.manager.toggle_muted().await;
                info!(muted, "Mute toggled");
            }
            Command::CycleBrightness => {
                let brightness = self.manager.cycle_brightness().await;
                info!(brightness = brightness.label(), "Brightness changed");
            }
            Command::Volume(volume) => {
                let volume = self.manager.set_volume(volume).await;
                info!(volume, "Volume set");
            }
            // The manager fits later targets once the debouncer applies it.
            Command::Resize(viewport) => self.debouncer.notify(viewport),
            Command::Next => self.next().await,
            Command::PauseAll => {
                if self.paused {
                    self.paused = false;
                    self.play_current().await;
                } else {
                    self.manager.pause_all().await;
                    self.paused = true;
                    info!("Paused, press p to resume");
                }
            }
            Command::Quit => {}
        }
    }

    async fn next(&mut self) {
        let previous = self.sources[self.index].clone();
        self.index = (self.index + 1) % self.sources.len();
        self.paused = false;
        if previous != self.sources[self.index] {
            // Written before the switch: a registry cap may evict the record on play.
            self.manager.pause_active().await;
            self.write_screenshot(&previous).await;
        }
        self.play_current().await;
    }

    async fn play_current(&mut self) {
        let key = self.sources[self.index].clone();
        let outcome = self
            .manager
            .play(key.clone(), RenderTarget::cover(self.viewport))
            .await;
        match outcome {
            PlayOutcome::Started | PlayOutcome::AlreadyActive => {
                info!(source = %key, index = self.index, "Now playing");
            }
            PlayOutcome::AutoplayBlocked(e) => {
                warn!(source = %key, error = %e, "Autoplay blocked, press m to unmute and n to retry");
            }
            PlayOutcome::Failed(e) => {
                warn!(source = %key, error = %e, "Source unavailable, showing its last screenshot");
            }
        }
    }

    async fn write_screenshot(&self, key: &SourceKey) {
        let Some(dir) = &self.screenshot_dir else {
            return;
        };
        let Some(shot) = self.manager.screenshot(key).await else {
            return;
        };

        let path = dir.join(screenshot_file_name(key));
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "Failed to create screenshot directory");
            return;
        }
        match tokio::fs::write(&path, shot.png_bytes()).await {
            Ok(()) => debug!(path = %path.display(), bytes = shot.png_bytes().len(), "Screenshot written"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write screenshot"),
        }
    }
}

/// File-system safe name derived from a source URL.
fn screenshot_file_name(key: &SourceKey) -> String {
    let mut name: String = key
        .as_str()
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("source")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect();
    if name.is_empty() {
        name.push_str("source");
    }
    name.push_str(".png");
    name
}
