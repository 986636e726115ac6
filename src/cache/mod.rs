//! Bounded, time-expiring, thread-safe keyed cache with negative caching.
//!
//! One generic [`TtlCache`] is instantiated per data source (item data,
//! description sets, unit map), each with its own [`CachePolicy`].
//!
//! - Entries are fresh while `now - created < ttl`; stale entries are misses.
//! - Positive and negative ("not found") entries are bounded separately.
//! - Eviction on overflow is FIFO by insertion time within an entry class.
//! - Loader errors are never cached.
//! - Values are stored as `Arc<V>` and never mutated; entries are replaced
//!   wholesale.
//!
//! The internal lock covers lookup and insert but not the loader call, so
//! concurrent misses on one key may both load; the last insert wins.

mod clock;
mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::{CacheMetrics, CacheReport};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL and capacity for one entry class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLimits {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl EntryLimits {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries }
    }
}

/// Configuration of one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub positive: EntryLimits,
    /// `None` disables negative caching: "not found" is returned but not stored.
    pub negative: Option<EntryLimits>,
}

impl CachePolicy {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            positive: EntryLimits::new(ttl, max_entries),
            negative: None,
        }
    }

    /// Also cache "not found" results.
    pub fn with_negative(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.negative = Some(EntryLimits::new(ttl, max_entries));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryClass {
    Positive,
    Negative,
}

/// A cached value, or the absent marker (`None`) for negative entries.
struct CacheEntry<V> {
    value: Option<Arc<V>>,
    created: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn class(&self) -> EntryClass {
        if self.value.is_some() {
            EntryClass::Positive
        } else {
            EntryClass::Negative
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) < self.ttl
    }
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    positive_order: VecDeque<K>,
    negative_order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> CacheState<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            positive_order: VecDeque::new(),
            negative_order: VecDeque::new(),
        }
    }

    fn order_mut(&mut self, class: EntryClass) -> &mut VecDeque<K> {
        match class {
            EntryClass::Positive => &mut self.positive_order,
            EntryClass::Negative => &mut self.negative_order,
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        let order = self.order_mut(entry.class());
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
        true
    }

    /// Drop the oldest entry of `class`.
    fn evict_oldest(&mut self, class: EntryClass) -> Option<K> {
        let oldest = self.order_mut(class).pop_front()?;
        self.entries.remove(&oldest);
        Some(oldest)
    }
}

/// Generic keyed TTL cache. See the module docs for semantics.
pub struct TtlCache<K, V> {
    name: &'static str,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<K, V>>,
    metrics: CacheMetrics,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Create an empty cache. `name` only shows up in logs and reports.
    pub fn new(name: &'static str, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            policy,
            clock,
            state: Mutex::new(CacheState::new()),
            metrics: CacheMetrics::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Return the cached value for `key`, or call `load` and cache its result.
    ///
    /// `load` returns `Ok(Some(v))` for found, `Ok(None)` for not found and
    /// `Err` for anything else. Errors propagate unchanged and leave the
    /// cache untouched.
    ///
    /// # Returns
    /// * `Ok(Some(value))` on a fresh hit or a successful load
    /// * `Ok(None)` on a fresh negative hit or a "not found" load
    /// * `Err(e)` if `load` failed
    pub fn get_or_load<E, F>(&self, key: &K, load: F) -> Result<Option<Arc<V>>, E>
    where
        F: FnOnce(&K) -> Result<Option<V>, E>,
    {
        if let Some(cached) = self.lookup(key) {
            return Ok(cached);
        }

        self.metrics.record_miss();
        debug!(cache = self.name, key = ?key, "Cache miss, loading");

        let loaded = match load(key) {
            Ok(loaded) => loaded.map(Arc::new),
            Err(e) => {
                self.metrics.record_load_failure();
                return Err(e);
            }
        };

        self.insert(key.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Fresh entry for `key`: `Some(Some(v))` positive, `Some(None)` negative.
    fn lookup(&self, key: &K) -> Option<Option<Arc<V>>> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        match state.entries.get(key) {
            None => return None,
            Some(entry) if entry.is_fresh(now) => {
                match entry.value {
                    Some(_) => self.metrics.record_hit(),
                    None => self.metrics.record_negative_hit(),
                }
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        state.remove(key);
        self.metrics.record_expiration();
        debug!(cache = self.name, key = ?key, "Cache entry expired");
        None
    }

    fn insert(&self, key: K, value: Option<Arc<V>>) {
        let class = if value.is_some() {
            EntryClass::Positive
        } else {
            EntryClass::Negative
        };
        let limits = match class {
            EntryClass::Positive => self.policy.positive,
            EntryClass::Negative => match self.policy.negative {
                Some(limits) => limits,
                None => return,
            },
        };
        if limits.max_entries == 0 {
            return;
        }

        let entry = CacheEntry {
            value,
            created: self.clock.now(),
            ttl: limits.ttl,
        };

        let mut state = self.state.lock();
        state.remove(&key);

        while state.order_mut(class).len() >= limits.max_entries {
            match state.evict_oldest(class) {
                Some(evicted) => {
                    self.metrics.record_eviction();
                    debug!(cache = self.name, key = ?evicted, "Evicted oldest cache entry");
                }
                None => break,
            }
        }

        state.order_mut(class).push_back(key.clone());
        state.entries.insert(key, entry);
    }

    /// Drop `key` regardless of freshness. Returns whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.state.lock().remove(key)
    }

    /// Number of entries held, stale ones included until they are noticed.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn report(&self) -> CacheReport {
        self.metrics.report(self.name, self.len())
    }
}
