use crate::{candidate::InternableStr, interned::InternedString};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Number of weak handles the cache may accumulate before the first
/// scavenge pass. Also the floor the threshold is re-armed to, so tiny
/// tables never scavenge on every call.
const INITIAL_SCAVENGE_THRESHOLD: usize = 256;

/// A content-addressed store of previously interned strings, held only
/// weakly.
///
/// The table maps a candidate's structural hash to the chain of entries
/// sharing exactly that hash. Each entry is a non-owning [`Weak`] handle:
/// the cache never keeps a string alive, it only observes whether some
/// other holder still does. A handle that no longer resolves is not an
/// error but the expected signal that its slot is reusable.
///
/// All operations on one cache instance are serialized by a single mutex.
/// Lookups are bounded by collision-chain length; the periodic scavenge
/// pass is O(table size) but only triggered after the table has grown by
/// a multiplicative factor since the last pass, so its cost is amortized
/// against the insertions that caused the growth.
pub struct WeakStringCache {
    state: Mutex<State>,
}

struct State {
    /// Structural hash to the entries sharing exactly that hash.
    ///
    /// Chains longer than one element only arise from true 64-bit hash
    /// collisions; distinct strings with equal hash all stay retrievable.
    buckets: HashMap<u64, Vec<Weak<str>>>,
    /// Total number of weak handles across all chains.
    handles: usize,
    /// Handle count that arms the next scavenge pass.
    scavenge_threshold: usize,
    /// Lower bound the threshold is re-armed to after each pass.
    scavenge_floor: usize,
}

/// Snapshot of the cache's entries classified by liveness.
///
/// Produced by [`WeakStringCache::debug_info`] for diagnostics; never used
/// on a hot path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheDebugInfo {
    /// Number of entries whose weak handle still resolves.
    pub live: usize,
    /// Number of entries whose string has been dropped.
    pub collected: usize,
}

impl CacheDebugInfo {
    /// Total number of entries in the cache.
    pub fn total(&self) -> usize {
        self.live + self.collected
    }
}

impl Default for WeakStringCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WeakStringCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::with_scavenge_threshold(INITIAL_SCAVENGE_THRESHOLD)
    }

    /// Creates a new empty cache that scavenges once `threshold` handles
    /// have accumulated.
    ///
    /// After each pass the threshold is re-armed to twice the number of
    /// surviving handles (but never below `threshold`), so a full walk is
    /// only paid once the table has at least doubled again.
    pub fn with_scavenge_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            state: Mutex::new(State {
                buckets: HashMap::new(),
                handles: 0,
                scavenge_threshold: threshold,
                scavenge_floor: threshold,
            }),
        }
    }

    /// Returns the canonical string for `candidate`, creating it if no
    /// live entry matches.
    ///
    /// The boolean is `true` on a cache hit and `false` when the candidate
    /// had to be materialized into a new allocation.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get_or_create(&self, candidate: &InternableStr<'_>) -> (InternedString, bool) {
        self.get_or_create_with_hash(candidate.structural_hash(), candidate)
    }

    fn get_or_create_with_hash(
        &self,
        hash: u64,
        candidate: &InternableStr<'_>,
    ) -> (InternedString, bool) {
        let mut state = self.state.lock();
        let (interned, hit) = state.get_or_create(hash, candidate);
        if !hit && state.handles > state.scavenge_threshold {
            state.scavenge();
            state.scavenge_threshold = (state.handles * 2).max(state.scavenge_floor);
        }
        (interned, hit)
    }

    /// Classifies every entry as live or collected.
    pub fn debug_info(&self) -> CacheDebugInfo {
        let state = self.state.lock();
        let mut info = CacheDebugInfo {
            live: 0,
            collected: 0,
        };
        for handle in state.buckets.values().flatten() {
            if handle.strong_count() > 0 {
                info.live += 1;
            } else {
                info.collected += 1;
            }
        }
        info
    }

    /// Drops all entries, leaving the cache empty and reusable.
    ///
    /// The strings themselves are unaffected: their lifetime is governed
    /// entirely by their remaining strong holders.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.handles;
        state.buckets.clear();
        state.handles = 0;
        tracing::debug!(dropped, "cleared weak string cache");
    }
}

impl State {
    fn get_or_create(
        &mut self,
        hash: u64,
        candidate: &InternableStr<'_>,
    ) -> (InternedString, bool) {
        let chain = self.buckets.entry(hash).or_default();
        let mut dead_slot = None;
        for (index, handle) in chain.iter().enumerate() {
            match handle.upgrade() {
                // A live entry with matching content is the hit we are
                // looking for.
                Some(live) if candidate.equals_materialized(&live) => {
                    return (InternedString::from_arc(live), true);
                }
                // Same hash, different content: keep walking the chain.
                Some(_) => {}
                // Dead handle: remember the first one for reuse, but keep
                // scanning since a live sibling may still follow.
                None => {
                    if dead_slot.is_none() {
                        dead_slot = Some(index);
                    }
                }
            }
        }
        let interned = candidate.materialize_shared();
        match dead_slot {
            Some(index) => chain[index] = Arc::downgrade(&interned),
            None => {
                chain.push(Arc::downgrade(&interned));
                self.handles += 1;
            }
        }
        (InternedString::from_arc(interned), false)
    }

    fn scavenge(&mut self) {
        let before = self.handles;
        self.buckets.retain(|_, chain| {
            chain.retain(|handle| handle.strong_count() > 0);
            !chain.is_empty()
        });
        self.handles = self.buckets.values().map(Vec::len).sum();
        tracing::debug!(before, after = self.handles, "scavenged weak string cache");
    }
}
