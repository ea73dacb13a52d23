//! In-memory synthesis cache
//!
//! Holds synthesized replies until the telephony provider fetches them. Clips
//! expire after a TTL, are dropped after a fixed number of successful fetches,
//! and the oldest clips are evicted first when the store is full. Cleanup is
//! opportunistic: it runs on `register` and on `fetch`, never on a timer.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    time::Duration,
};

use application::{
    error::ApplicationError,
    ports::{ClipStats, ClipStorePort, SynthesizedAudio},
};
use domain::ClipId;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::ClipConfig;

struct StoredClip {
    audio: SynthesizedAudio,
    expires_at: Instant,
    fetches: u32,
}

#[derive(Default)]
struct ClipTable {
    clips: HashMap<ClipId, StoredClip>,
    /// Registration order; may still name clips that were already removed
    order: VecDeque<ClipId>,
    registered: u64,
    served: u64,
    evicted: u64,
    misses: u64,
}

impl ClipTable {
    /// Drop expired clips from the front of the registration queue
    fn purge_expired(&mut self, now: Instant) {
        while let Some(id) = self.order.front().copied() {
            match self.clips.get(&id) {
                Some(clip) if clip.expires_at > now => break,
                Some(_) => {
                    self.clips.remove(&id);
                    self.evicted += 1;
                    self.order.pop_front();
                },
                None => {
                    self.order.pop_front();
                },
            }
        }
    }

    /// Evict the oldest clips until one more fits
    fn make_room(&mut self, max_clips: usize) {
        while self.clips.len() >= max_clips {
            let Some(id) = self.order.pop_front() else {
                break;
            };
            if self.clips.remove(&id).is_some() {
                self.evicted += 1;
            }
        }
    }
}

/// Process-local clip store guarded by a single lock
pub struct InMemoryClipStore {
    table: Mutex<ClipTable>,
    ttl: Duration,
    max_clips: usize,
    max_fetches: u32,
}

impl fmt::Debug for InMemoryClipStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryClipStore")
            .field("held", &self.table.lock().clips.len())
            .field("ttl", &self.ttl)
            .field("max_clips", &self.max_clips)
            .field("max_fetches", &self.max_fetches)
            .finish()
    }
}

impl InMemoryClipStore {
    pub fn new(ttl: Duration, max_clips: usize, max_fetches: u32) -> Self {
        Self {
            table: Mutex::new(ClipTable::default()),
            ttl,
            max_clips: max_clips.max(1),
            max_fetches: max_fetches.max(1),
        }
    }

    pub fn from_config(config: &ClipConfig) -> Self {
        Self::new(config.ttl(), config.max_clips, config.max_fetches)
    }
}

impl Default for InMemoryClipStore {
    fn default() -> Self {
        Self::from_config(&ClipConfig::default())
    }
}

impl ClipStorePort for InMemoryClipStore {
    fn register(&self, audio: SynthesizedAudio) -> ClipId {
        let id = ClipId::new();
        let now = Instant::now();
        let size = audio.len();

        let mut table = self.table.lock();
        table.purge_expired(now);
        table.make_room(self.max_clips);
        table.clips.insert(
            id,
            StoredClip {
                audio,
                expires_at: now + self.ttl,
                fetches: 0,
            },
        );
        table.order.push_back(id);
        table.registered += 1;
        let held = table.clips.len();
        drop(table);

        debug!(clip_id = %id, bytes = size, held, "Registered clip");
        id
    }

    fn fetch(&self, id: &ClipId) -> Result<SynthesizedAudio, ApplicationError> {
        let now = Instant::now();
        let mut table = self.table.lock();

        let Some(clip) = table.clips.get_mut(id) else {
            table.misses += 1;
            return Err(ApplicationError::ClipNotFound(id.to_string()));
        };

        if clip.expires_at <= now {
            table.clips.remove(id);
            table.evicted += 1;
            table.misses += 1;
            return Err(ApplicationError::ClipNotFound(id.to_string()));
        }

        clip.fetches += 1;
        let audio = clip.audio.clone();
        let exhausted = clip.fetches >= self.max_fetches;
        table.served += 1;
        if exhausted {
            table.clips.remove(id);
        }
        drop(table);

        debug!(clip_id = %id, exhausted, "Served clip");
        Ok(audio)
    }

    fn len(&self) -> usize {
        self.table.lock().clips.len()
    }

    fn stats(&self) -> ClipStats {
        let table = self.table.lock();
        ClipStats {
            held: table.clips.len(),
            registered: table.registered,
            served: table.served,
            evicted: table.evicted,
            misses: table.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(bytes: &'static [u8]) -> SynthesizedAudio {
        SynthesizedAudio::new(bytes, "audio/mpeg")
    }

    fn store(max_clips: usize, max_fetches: u32) -> InMemoryClipStore {
        InMemoryClipStore::new(Duration::from_secs(300), max_clips, max_fetches)
    }

    #[test]
    fn fetch_returns_registered_bytes() {
        let store = store(8, 2);
        let id = store.register(audio(b"b1"));

        let fetched = store.fetch(&id).unwrap();
        assert_eq!(fetched.data.as_ref(), b"b1");
        assert_eq!(fetched.content_type, "audio/mpeg");
    }

    #[test]
    fn clip_removed_after_max_fetches() {
        let store = store(8, 2);
        let id = store.register(audio(b"b1"));

        assert!(store.fetch(&id).is_ok());
        assert!(store.fetch(&id).is_ok());
        assert!(matches!(
            store.fetch(&id),
            Err(ApplicationError::ClipNotFound(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_clip_is_not_found() {
        let store = store(8, 2);
        let err = store.fetch(&ClipId::new()).unwrap_err();
        assert!(matches!(err, ApplicationError::ClipNotFound(_)));
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn oldest_clip_evicted_when_full() {
        let store = store(2, 2);
        let first = store.register(audio(b"1"));
        let second = store.register(audio(b"2"));
        let third = store.register(audio(b"3"));

        assert_eq!(store.len(), 2);
        assert!(store.fetch(&first).is_err());
        assert_eq!(store.fetch(&second).unwrap().data.as_ref(), b"2");
        assert_eq!(store.fetch(&third).unwrap().data.as_ref(), b"3");
        assert_eq!(store.stats().evicted, 1);
    }

    #[test]
    fn fetched_out_clips_free_their_slot() {
        let store = store(2, 1);
        let first = store.register(audio(b"1"));
        store.fetch(&first).unwrap();
        let second = store.register(audio(b"2"));
        let third = store.register(audio(b"3"));

        assert!(store.fetch(&second).is_ok());
        assert!(store.fetch(&third).is_ok());
        assert_eq!(store.stats().evicted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_clip_is_not_found() {
        let store = InMemoryClipStore::new(Duration::from_secs(60), 8, 2);
        let id = store.register(audio(b"b1"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.fetch(&id).is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(matches!(
            store.fetch(&id),
            Err(ApplicationError::ClipNotFound(_))
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn register_purges_expired_clips() {
        let store = InMemoryClipStore::new(Duration::from_secs(10), 8, 2);
        store.register(audio(b"old-1"));
        store.register(audio(b"old-2"));

        tokio::time::advance(Duration::from_secs(11)).await;
        let fresh = store.register(audio(b"new"));

        assert_eq!(store.len(), 1);
        assert!(store.fetch(&fresh).is_ok());
        let stats = store.stats();
        assert_eq!(stats.registered, 3);
        assert_eq!(stats.evicted, 2);
    }

    #[test]
    fn stats_track_activity() {
        let store = store(8, 2);
        let id = store.register(audio(b"x"));
        store.fetch(&id).unwrap();
        let _ = store.fetch(&ClipId::new());

        assert_eq!(
            store.stats(),
            ClipStats {
                held: 1,
                registered: 1,
                served: 1,
                evicted: 0,
                misses: 1,
            }
        );
    }

    #[test]
    fn zero_limits_are_clamped() {
        let store = InMemoryClipStore::new(Duration::from_secs(1), 0, 0);
        let id = store.register(audio(b"x"));
        assert!(store.fetch(&id).is_ok());
        assert!(store.fetch(&id).is_err());
    }

    #[test]
    fn concurrent_registration_keeps_bound() {
        let store = std::sync::Arc::new(store(16, 2));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        store.register(audio(b"c"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 16);
        let stats = store.stats();
        assert_eq!(stats.registered, 160);
        assert_eq!(stats.evicted, 144);
    }
}
