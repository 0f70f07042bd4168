//! Wall-clock playback position for backends without a real decoder.
//!
//! Uses `tokio::time::Instant`, so tests running on a paused runtime can move
//! the position forward with `tokio::time::advance`.

use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    /// Position accumulated up to the last start/stop.
    base_secs: f64,
    /// Set while running.
    started_at: Option<Instant>,
    /// Wrap the position at this length (looping media).
    loop_secs: Option<f64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that wraps around every `loop_secs` seconds.
    pub fn looping(loop_secs: f64) -> Self {
        Self {
            loop_secs: (loop_secs > 0.0).then_some(loop_secs),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.base_secs += started.elapsed().as_secs_f64();
        }
    }

    /// Jump to `secs`, keeping the running state.
    pub fn seek(&mut self, secs: f64) {
        let running = self.is_running();
        self.base_secs = secs.max(0.0);
        self.started_at = running.then(Instant::now);
    }

    pub fn position_secs(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let pos = self.base_secs + elapsed;
        match self.loop_secs {
            Some(len) => pos % len,
            None => pos,
        }
    }
}
