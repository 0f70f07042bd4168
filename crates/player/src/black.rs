//! Black backend: renders nothing but solid black frames.
//!
//! Used for the "screen off" mode, where the host wants the coordinator's
//! lifecycle without any media actually decoding.

use std::sync::Arc;

use async_trait::async_trait;
use bd_common::{PlayerError, RenderTarget};
use tokio::sync::watch;

use crate::clock::PlaybackClock;
use crate::frame::{capture_size, Frame, MAX_CAPTURE_WIDTH};
use crate::player::{Player, PlayerFactory};

const BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, Default)]
pub struct BlackFactory;

impl PlayerFactory for BlackFactory {
    fn create(&self, target: &RenderTarget) -> Result<Box<dyn Player>, PlayerError> {
        let (ready_tx, _) = watch::channel(false);
        Ok(Box::new(BlackPlayer {
            target: *target,
            clock: PlaybackClock::new(),
            loaded: false,
            ready_tx: Arc::new(ready_tx),
        }))
    }

    fn name(&self) -> &'static str {
        "black"
    }
}

pub struct BlackPlayer {
    target: RenderTarget,
    clock: PlaybackClock,
    loaded: bool,
    ready_tx: Arc<watch::Sender<bool>>,
}

#[async_trait]
impl Player for BlackPlayer {
    async fn load(&mut self, _url: &str, start_secs: f64) -> Result<(), PlayerError> {
        self.clock.seek(start_secs);
        self.loaded = true;
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        self.clock.start();
        self.ready_tx.send_replace(true);
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.clock.stop();
        self.ready_tx.send_replace(false);
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), PlayerError> {
        self.clock.stop();
        self.loaded = false;
        self.ready_tx.send_replace(false);
        Ok(())
    }

    fn current_time_secs(&self) -> f64 {
        self.clock.position_secs()
    }

    fn capture_frame(&self) -> Option<Frame> {
        if !self.loaded {
            return None;
        }
        let (w, h) = capture_size(&self.target, MAX_CAPTURE_WIDTH);
        Some(Frame::filled(w, h, BLACK, self.clock.position_secs()))
    }

    fn set_muted(&mut self, _muted: bool) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_size(&mut self, width: u32, height: u32) {
        self.target.width = width;
        self.target.height = height;
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.target.x = x;
        self.target.y = y;
    }

    fn set_brightness(&mut self, _level: f32) {}

    fn frame_ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_common::Viewport;

    #[tokio::test]
    async fn any_url_loads_and_frames_are_black() {
        let mut p = BlackFactory
            .create(&RenderTarget::cover(Viewport::new(64, 32)))
            .unwrap();
        assert!(p.capture_frame().is_none());

        p.load("not even a url", 3.0).await.unwrap();
        p.play().await.unwrap();
        assert!(*p.frame_ready().borrow());

        let frame = p.capture_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 32));
        assert!(frame.rgba.chunks_exact(4).all(|px| px == BLACK));
    }
}
