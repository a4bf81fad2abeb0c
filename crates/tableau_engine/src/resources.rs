//! Timers and audio playbacks owned by the current slide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tableau_interface::Playback;
use tokio::task::AbortHandle;
use tracing::debug;

enum Resource {
    Timer(AbortHandle),
    Audio(Box<dyn Playback>),
}

impl Resource {
    fn release(self) {
        match self {
            Resource::Timer(handle) => handle.abort(),
            Resource::Audio(playback) => playback.stop(),
        }
    }
}

struct Entry {
    id: u64,
    transitional: bool,
    resource: Resource,
}

/// Scoped set of live timers and audio playbacks.
///
/// [`purge`](Self::purge) runs on every slide-changing navigation. It
/// releases everything except entries flagged transitional; those lose the
/// flag and are released by the following purge.
#[derive(Default)]
pub struct ResourceRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<Entry>>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("live", &self.len())
            .finish()
    }
}

impl ResourceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserves an id before the resource exists.
    pub fn reserve(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Tracks a timer task under a reserved id.
    pub fn track_timer(&self, id: u64, handle: AbortHandle, transitional: bool) {
        if handle.is_finished() {
            return;
        }
        self.insert(id, Resource::Timer(handle), transitional);
    }

    /// Tracks an audio playback and returns its id.
    pub fn track_audio(&self, playback: Box<dyn Playback>, transitional: bool) -> u64 {
        let id = self.reserve();
        self.insert(id, Resource::Audio(playback), transitional);
        id
    }

    fn insert(&self, id: u64, resource: Resource, transitional: bool) {
        self.lock().push(Entry {
            id,
            transitional,
            resource,
        });
    }

    /// Drops an entry without releasing it, for resources that finished on their own.
    pub fn forget(&self, id: u64) {
        self.lock().retain(|entry| entry.id != id);
    }

    /// Releases every non-transitional entry; returns how many were released.
    pub fn purge(&self) -> usize {
        let released: Vec<Entry> = {
            let mut entries = self.lock();
            let (keep, release): (Vec<Entry>, Vec<Entry>) =
                entries.drain(..).partition(|entry| entry.transitional);
            *entries = keep
                .into_iter()
                .map(|entry| Entry {
                    transitional: false,
                    ..entry
                })
                .collect();
            release
        };
        let count = released.len();
        for entry in released {
            entry.resource.release();
        }
        debug!(released = count, kept = self.len(), "Purged slide resources");
        count
    }

    /// Releases everything, transitional or not.
    pub fn clear(&self) {
        let released: Vec<Entry> = self.lock().drain(..).collect();
        for entry in released {
            entry.resource.release();
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
