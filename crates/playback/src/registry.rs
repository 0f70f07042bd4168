//! Source registry with least-recently-played ordering.

use bd_common::{Layer, SourceKey};
use linked_hash_map::LinkedHashMap;
use tracing::debug;

use crate::video::ManagedVideo;

/// Records ordered from least to most recently played.
#[derive(Default)]
pub(crate) struct Registry {
    videos: LinkedHashMap<SourceKey, ManagedVideo>,
}

impl Registry {
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn get(&self, key: &SourceKey) -> Option<&ManagedVideo> {
        self.videos.get(key)
    }

    pub fn get_mut(&mut self, key: &SourceKey) -> Option<&mut ManagedVideo> {
        self.videos.get_mut(key)
    }

    /// Mark `key` most recently played, creating its record if needed.
    pub fn touch_or_insert(&mut self, key: &SourceKey, layer: Layer) -> &mut ManagedVideo {
        // get_refresh moves an existing entry to the back
        let _ = self.videos.get_refresh(key);
        self.videos
            .entry(key.clone())
            .or_insert_with(|| ManagedVideo::new(key.clone(), layer))
    }

    pub fn keys(&self) -> Vec<SourceKey> {
        self.videos.keys().cloned().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &ManagedVideo> {
        self.videos.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ManagedVideo> {
        self.videos.iter_mut().map(|(_, v)| v)
    }

    /// Drop least-recently-played records until at most `max` remain.
    ///
    /// `keep` and any record still holding a player are never evicted.
    pub fn evict_over(&mut self, max: usize, keep: &SourceKey) -> Vec<SourceKey> {
        let mut evicted = Vec::new();
        while self.videos.len() > max {
            let victim = self
                .videos
                .iter()
                .find(|(k, v)| *k != keep && !v.has_player())
                .map(|(k, _)| k.clone());

            let Some(key) = victim else {
                break;
            };
            self.videos.remove(&key);
            debug!(source = %key, "Evicted from registry");
            evicted.push(key);
        }
        evicted
    }
}
