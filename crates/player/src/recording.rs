//! Call-recording backend for tests.
//!
//! Every façade call is appended to a shared log so tests can assert what the
//! coordinator asked the platform to do. Failures (load errors, autoplay
//! rejections, teardown errors) are scripted up front, and the frame-ready
//! signal can be fired by hand to test the screenshot hand-off.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bd_common::{PlayerError, RenderTarget};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::clock::PlaybackClock;
use crate::frame::Frame;
use crate::player::{Player, PlayerFactory};

pub type HandleId = u64;

/// One recorded façade call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Create { handle: HandleId, target: RenderTarget },
    Load { handle: HandleId, url: String, start_secs: f64 },
    Play { handle: HandleId },
    Pause { handle: HandleId },
    Destroy { handle: HandleId },
    SetMuted { handle: HandleId, muted: bool },
    SetVolume { handle: HandleId, volume: f32 },
    SetSize { handle: HandleId, width: u32, height: u32 },
    SetPosition { handle: HandleId, x: i32, y: i32 },
    SetBrightness { handle: HandleId, level: f32 },
}

#[derive(Default)]
struct Script {
    failing_urls: HashSet<String>,
    autoplay_blocks: usize,
    fail_teardown: bool,
    manual_frame_ready: bool,
}

#[derive(Default)]
struct Shared {
    calls: Vec<PlayerCall>,
    next_handle: HandleId,
    live: HashSet<HandleId>,
    max_live: usize,
    ready: HashMap<HandleId, Weak<watch::Sender<bool>>>,
    script: Script,
}

/// Factory whose handles log every call into one shared journal.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `load()` of `url` fail.
    pub fn fail_load(&self, url: &str) {
        self.shared.lock().script.failing_urls.insert(url.to_string());
    }

    /// Reject the next `times` calls to `play()` with `AutoplayBlocked`.
    pub fn block_autoplay(&self, times: usize) {
        self.shared.lock().script.autoplay_blocks = times;
    }

    /// Make `destroy()` report a teardown error (the handle still counts as released).
    pub fn fail_teardown(&self, fail: bool) {
        self.shared.lock().script.fail_teardown = fail;
    }

    /// When set, frame-ready only fires through [`RecordingFactory::fire_frame_ready`].
    pub fn manual_frame_ready(&self, manual: bool) {
        self.shared.lock().script.manual_frame_ready = manual;
    }

    /// Raise the frame-ready signal of `handle`. Returns false if it is gone.
    pub fn fire_frame_ready(&self, handle: HandleId) -> bool {
        let tx = self.shared.lock().ready.get(&handle).and_then(Weak::upgrade);
        match tx {
            Some(tx) => {
                tx.send_replace(true);
                true
            }
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.shared.lock().calls.clone()
    }

    /// `(url, start_secs)` of every `load()` in call order.
    pub fn loads(&self) -> Vec<(String, f64)> {
        self.shared
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                PlayerCall::Load { url, start_secs, .. } => Some((url.clone(), *start_secs)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&PlayerCall) -> bool) -> usize {
        self.shared.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn handles_created(&self) -> u64 {
        self.shared.lock().next_handle
    }

    /// Handle id of the most recently created player.
    pub fn last_handle(&self) -> Option<HandleId> {
        let next = self.shared.lock().next_handle;
        next.checked_sub(1)
    }

    /// Handles created and not yet destroyed or dropped.
    pub fn live_count(&self) -> usize {
        self.shared.lock().live.len()
    }

    /// Highest number of simultaneously live handles ever observed.
    pub fn max_live(&self) -> usize {
        self.shared.lock().max_live
    }

    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }
}

impl PlayerFactory for RecordingFactory {
    fn create(&self, target: &RenderTarget) -> Result<Box<dyn Player>, PlayerError> {
        let (tx, _) = watch::channel(false);
        let ready_tx = Arc::new(tx);

        let mut shared = self.shared.lock();
        let handle = shared.next_handle;
        shared.next_handle += 1;
        shared.live.insert(handle);
        shared.max_live = shared.max_live.max(shared.live.len());
        shared.ready.insert(handle, Arc::downgrade(&ready_tx));
        shared.calls.push(PlayerCall::Create {
            handle,
            target: *target,
        });

        Ok(Box::new(RecordingPlayer {
            handle,
            shared: self.shared.clone(),
            clock: PlaybackClock::new(),
            url: None,
            destroyed: false,
            ready_tx,
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub struct RecordingPlayer {
    handle: HandleId,
    shared: Arc<Mutex<Shared>>,
    clock: PlaybackClock,
    url: Option<String>,
    destroyed: bool,
    ready_tx: Arc<watch::Sender<bool>>,
}

impl RecordingPlayer {
    fn record(&self, call: PlayerCall) {
        self.shared.lock().calls.push(call);
    }

    fn release(&self) {
        self.shared.lock().live.remove(&self.handle);
    }
}

#[async_trait]
impl Player for RecordingPlayer {
    async fn load(&mut self, url: &str, start_secs: f64) -> Result<(), PlayerError> {
        self.record(PlayerCall::Load {
            handle: self.handle,
            url: url.to_string(),
            start_secs,
        });
        if self.shared.lock().script.failing_urls.contains(url) {
            return Err(PlayerError::load(url, "scripted failure"));
        }
        self.clock.stop();
        self.clock.seek(start_secs);
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Play {
            handle: self.handle,
        });
        let manual = {
            let mut shared = self.shared.lock();
            if shared.script.autoplay_blocks > 0 {
                shared.script.autoplay_blocks -= 1;
                return Err(PlayerError::AutoplayBlocked("scripted".into()));
            }
            shared.script.manual_frame_ready
        };
        self.clock.start();
        if !manual {
            self.ready_tx.send_replace(true);
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Pause {
            handle: self.handle,
        });
        self.clock.stop();
        self.ready_tx.send_replace(false);
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Destroy {
            handle: self.handle,
        });
        self.clock.stop();
        self.ready_tx.send_replace(false);
        if !self.destroyed {
            self.destroyed = true;
            self.release();
        }
        if self.shared.lock().script.fail_teardown {
            return Err(PlayerError::Teardown("scripted".into()));
        }
        Ok(())
    }

    fn current_time_secs(&self) -> f64 {
        self.clock.position_secs()
    }

    fn capture_frame(&self) -> Option<Frame> {
        if self.destroyed || self.url.is_none() {
            return None;
        }
        Some(Frame::filled(8, 4, [32, 64, 96, 255], self.clock.position_secs()))
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(PlayerCall::SetMuted {
            handle: self.handle,
            muted,
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(PlayerCall::SetVolume {
            handle: self.handle,
            volume,
        });
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.record(PlayerCall::SetSize {
            handle: self.handle,
            width,
            height,
        });
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.record(PlayerCall::SetPosition {
            handle: self.handle,
            x,
            y,
        });
    }

    fn set_brightness(&mut self, level: f32) {
        self.record(PlayerCall::SetBrightness {
            handle: self.handle,
            level,
        });
    }

    fn frame_ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }
}

impl Drop for RecordingPlayer {
    fn drop(&mut self) {
        self.release();
    }
}
