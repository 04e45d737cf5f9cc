//! Optional cache of resolver decisions.

use dashmap::DashMap;
use helix_core::PermissionLevel;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Expired entries are swept at most this often, lazily on `set()`.
const EVICTION_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub actor: String,
    pub context_id: String,
    pub level: PermissionLevel,
}

impl CacheKey {
    pub fn new(actor: &str, context_id: &str, level: PermissionLevel) -> Self {
        Self {
            actor: actor.to_string(),
            context_id: context_id.to_string(),
            level,
        }
    }
}

struct CachedDecision {
    allowed: bool,
    expires_at: Instant,
}

/// TTL-bounded map from `(actor, context, level)` to a decision.
///
/// The directory clears it synchronously on every catalog, registry and
/// assignment write. Team membership is not tracked: a membership change
/// becomes visible once the affected entries expire.
///
/// Every [`clear`](Self::clear) starts a new generation. A decision computed
/// under an older generation is never stored, so a write that lands while a
/// check is walking cannot be masked by that check's result.
///
/// When full after an eviction pass, new entries are dropped and the
/// resolver simply runs uncached.
pub struct DecisionCache {
    entries: DashMap<CacheKey, CachedDecision>,
    generation: AtomicU64,
    ttl: Duration,
    max_entries: usize,
    len: AtomicUsize,
    last_eviction: std::sync::Mutex<Instant>,
}

impl DecisionCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_capacity(ttl_secs, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
            len: AtomicUsize::new(0),
            last_eviction: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Cached decision, if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.allowed)
    }

    /// Read before computing a decision, then hand to [`set`](Self::set).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `allowed` unless the cache was cleared since `generation`.
    pub fn set(&self, key: CacheKey, allowed: bool, generation: u64) {
        if self.generation() != generation {
            return;
        }
        self.maybe_evict();

        if self.len.load(Ordering::Relaxed) >= self.max_entries {
            self.evict_expired();
            if self.len.load(Ordering::Relaxed) >= self.max_entries {
                return;
            }
        }

        let was_absent = self
            .entries
            .insert(
                key.clone(),
                CachedDecision {
                    allowed,
                    expires_at: Instant::now() + self.ttl,
                },
            )
            .is_none();
        if was_absent {
            self.len.fetch_add(1, Ordering::Relaxed);
        }
        // A clear between the check above and the insert.
        if self.generation() != generation && self.entries.remove(&key).is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        self.len.store(0, Ordering::Relaxed);
    }

    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, v| {
            let keep = v.expires_at > now;
            if !keep {
                self.len.fetch_sub(1, Ordering::Relaxed);
            }
            keep
        });
        if let Ok(mut last) = self.last_eviction.lock() {
            *last = Instant::now();
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn maybe_evict(&self) {
        let should_evict = self
            .last_eviction
            .lock()
            .map(|last| last.elapsed() >= EVICTION_CHECK_INTERVAL)
            .unwrap_or(false);
        if should_evict {
            self.evict_expired();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = DecisionCache::new(60);
        let key = CacheKey::new("alice", "ctx-1", PermissionLevel::Read);
        assert_eq!(cache.get(&key), None);
        cache.set(key.clone(), true, 0);
        assert_eq!(cache.get(&key), Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_level_is_part_of_the_key() {
        let cache = DecisionCache::new(60);
        cache.set(CacheKey::new("alice", "ctx-1", PermissionLevel::Read), true, 0);
        assert_eq!(
            cache.get(&CacheKey::new("alice", "ctx-1", PermissionLevel::Delete)),
            None
        );
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = DecisionCache::new(0);
        let key = CacheKey::new("alice", "ctx-1", PermissionLevel::Read);
        cache.set(key.clone(), true, 0);
        assert_eq!(cache.get(&key), None);
        cache.evict_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_limit() {
        let cache = DecisionCache::with_capacity(60, 2);
        cache.set(CacheKey::new("a", "c", PermissionLevel::Read), true, 0);
        cache.set(CacheKey::new("b", "c", PermissionLevel::Read), true, 0);
        cache.set(CacheKey::new("c", "c", PermissionLevel::Read), true, 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::new("c", "c", PermissionLevel::Read)), None);
    }

    #[test]
    fn test_decision_from_before_clear_is_dropped() {
        let cache = DecisionCache::new(60);
        let key = CacheKey::new("alice", "ctx-1", PermissionLevel::Read);
        let stale = cache.generation();
        cache.clear();
        cache.set(key.clone(), true, stale);
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());

        cache.set(key.clone(), false, cache.generation());
        assert_eq!(cache.get(&key), Some(false));
    }

    #[test]
    fn test_clear_empties() {
        let cache = DecisionCache::new(60);
        let generation = cache.generation();
        cache.set(CacheKey::new("alice", "ctx-1", PermissionLevel::Read), true, generation);
        cache.set(CacheKey::new("bob", "ctx-1", PermissionLevel::Read), false, generation);
        cache.clear();
        assert!(cache.is_empty());
        assert_ne!(cache.generation(), generation);
    }
}
