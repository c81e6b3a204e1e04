//! Time-boxed per-question hint cache.
//!
//! Entries are independent and keyed by question id, so no cross-entry
//! locking is needed; staleness is checked at read time and expired entries
//! are simply overwritten by the next lookup.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// How long a cached hint stays fresh.
pub const DEFAULT_HINT_TTL: Duration = Duration::from_secs(5 * 60);

/// Supplementary per-question data served on the hint path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintPayload {
    /// Hint prose, falling back to a fixed in-character default.
    pub fallback_hint: String,
    /// Pre-rendered narration script, when one has been generated.
    pub cached_script: Option<String>,
}

struct HintEntry {
    payload: HintPayload,
    stored_at: Instant,
}

/// In-memory TTL cache for hint payloads.
pub struct HintCache {
    entries: DashMap<String, HintEntry>,
    ttl: Duration,
}

impl HintCache {
    /// Build an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached payload for `id` if it exists and is still fresh.
    pub fn fresh(&self, id: &str) -> Option<HintPayload> {
        let entry = self.entries.get(id)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Store a payload for `id` stamped with the current time.
    pub fn store(&self, id: String, payload: HintPayload) {
        self.entries.insert(
            id,
            HintEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Record a freshly generated script for `id`.
    ///
    /// An existing entry keeps its hint prose and gets a refreshed timestamp;
    /// otherwise a new entry is created around the script with the given
    /// default hint, so the script is servable without a backing-store read.
    /// Returns whether a new entry was created, so the caller can backfill
    /// the placeholder prose from storage.
    pub fn upsert_script(&self, id: &str, script: &str, default_hint: &str) -> bool {
        let mut created = false;
        let mut entry = self.entries.entry(id.to_owned()).or_insert_with(|| {
            created = true;
            HintEntry {
                payload: HintPayload {
                    fallback_hint: default_hint.to_owned(),
                    cached_script: None,
                },
                stored_at: Instant::now(),
            }
        });
        entry.payload.cached_script = Some(script.to_owned());
        entry.stored_at = Instant::now();
        drop(entry);
        created
    }

    /// Drop every entry. Used by the question write path to keep hints
    /// consistent with the corpus.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for HintCache {
    fn default() -> Self {
        Self::new(DEFAULT_HINT_TTL)
    }
}
