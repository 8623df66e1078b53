//! Visitor Counter - Durable visit count, deduplicated per session
//!
//! Two stores are involved:
//! - durable: holds the count as a decimal string, shared by every session
//! - session: holds a sentinel marking "this session was already counted"
//!
//! The session flag, not in-memory state, gates the increment, so a view
//! that is torn down and rebuilt within one session never counts twice.
//!
//! # Failure handling
//!
//! Storage errors are logged and swallowed. The counter falls back to an
//! ephemeral value (last known, or the base count) and stops persisting.
//! A malformed stored value is treated as absent and reseeded.
//!
//! # Known limitation
//!
//! Tabs of the same client share the durable count and race on its
//! read-modify-write with no locking. Last write wins; two tabs opened
//! together may both read `N` and both write `N + 1`.
//!
//! # Example
//!
//! ```ignore
//! use spark_motion::state::visitor::{VisitorConfig, VisitorCounter};
//! use spark_motion::storage::MemoryStore;
//!
//! let mut counter = VisitorCounter::new(durable, MemoryStore::new(), VisitorConfig::default());
//! let resolution = counter.resolve();
//! assert!(resolution.settled);
//! ```

use serde::{Deserialize, Serialize};
use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Seed used the first time no count has been stored.
pub const DEFAULT_BASE_COUNT: u64 = 1250;

/// Durable key holding the count.
pub const DEFAULT_COUNT_KEY: &str = "visit-count";

/// Session key holding the "already counted" flag.
pub const DEFAULT_SESSION_KEY: &str = "visit-counted";

/// Value written under the session key.
pub const SESSION_SENTINEL: &str = "true";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Visitor counter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorConfig {
    pub base_count: u64,
    pub count_key: String,
    pub session_key: String,
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            base_count: DEFAULT_BASE_COUNT,
            count_key: DEFAULT_COUNT_KEY.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Result of resolving the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisitResolution {
    pub count: u64,
    /// False until the first resolution; views show a placeholder meanwhile.
    pub settled: bool,
}

impl VisitResolution {
    /// The unsettled placeholder.
    pub const fn pending() -> Self {
        Self {
            count: 0,
            settled: false,
        }
    }

    pub const fn settled(count: u64) -> Self {
        Self {
            count,
            settled: true,
        }
    }
}

/// Parse a stored count. Anything but a non-negative decimal integer is absent.
fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

// =============================================================================
// COUNTER
// =============================================================================

/// Resolves the visit count against a durable and a session store.
pub struct VisitorCounter<D: KeyValueStore, S: KeyValueStore> {
    durable: D,
    session: S,
    config: VisitorConfig,
    /// Count shown when storage fails
    last_known: Option<u64>,
    /// This instance already incremented (guards against a broken session store)
    counted_here: bool,
    resolution: Signal<VisitResolution>,
}

impl<D: KeyValueStore, S: KeyValueStore> VisitorCounter<D, S> {
    pub fn new(durable: D, session: S, config: VisitorConfig) -> Self {
        Self {
            durable,
            session,
            config,
            last_known: None,
            counted_here: false,
            resolution: signal(VisitResolution::pending()),
        }
    }

    /// Resolve the count, incrementing at most once per session.
    ///
    /// Never fails: storage errors degrade to an unpersisted count.
    pub fn resolve(&mut self) -> VisitResolution {
        let count = match self.try_resolve() {
            Ok(count) => {
                self.last_known = Some(count);
                count
            }
            Err(err) => {
                let fallback = self.fallback_count();
                warn!(error = %err, count = fallback, "visit counter storage failed, count not persisted");
                self.last_known = Some(fallback);
                fallback
            }
        };

        debug!(count, "visit count resolved");
        let resolution = VisitResolution::settled(count);
        self.resolution.set(resolution);
        resolution
    }

    fn try_resolve(&mut self) -> Result<u64, StorageError> {
        let stored = self
            .durable
            .get(&self.config.count_key)?
            .as_deref()
            .and_then(parse_count)
            .unwrap_or(0);

        // 0 means never initialized (or unreadable)
        let mut count = if stored == 0 {
            self.config.base_count
        } else {
            stored
        };

        let already_counted = self.session.get(&self.config.session_key)?.is_some();
        if !already_counted {
            if self.counted_here {
                // Flag never made it into the session store; stay on the
                // count this view already showed
                return Ok(self.fallback_count());
            }

            count = count.saturating_add(1);
            self.counted_here = true;
            self.last_known = Some(count);

            self.durable
                .set(&self.config.count_key, &count.to_string())?;
            self.session
                .set(&self.config.session_key, SESSION_SENTINEL)?;
        }

        Ok(count)
    }

    fn fallback_count(&self) -> u64 {
        self.last_known.unwrap_or(self.config.base_count)
    }

    /// Forget the stored count and this session's flag.
    ///
    /// Best effort: failures are logged. The next [`resolve`](Self::resolve)
    /// reseeds from the base count.
    pub fn reset(&mut self) {
        if let Err(err) = self.durable.remove(&self.config.count_key) {
            warn!(error = %err, "failed to clear stored visit count");
        }
        if let Err(err) = self.session.remove(&self.config.session_key) {
            warn!(error = %err, "failed to clear session visit flag");
        }
        self.last_known = None;
        self.counted_here = false;
        self.resolution.set(VisitResolution::pending());
    }

    /// Latest resolution (pending until the first `resolve`).
    pub fn resolution(&self) -> VisitResolution {
        self.resolution.get()
    }

    /// Signal carrying the latest resolution, for binding views.
    pub fn resolution_signal(&self) -> Signal<VisitResolution> {
        self.resolution.clone()
    }

    pub fn config(&self) -> &VisitorConfig {
        &self.config
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Tear down, handing the stores back.
    pub fn into_parts(self) -> (D, S) {
        (self.durable, self.session)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    /// Reads work, every write is rejected.
    #[derive(Default)]
    struct QuotaStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for QuotaStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            })
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn counter(durable: MemoryStore, session: MemoryStore) -> VisitorCounter<MemoryStore, MemoryStore> {
        VisitorCounter::new(durable, session, VisitorConfig::default())
    }

    fn stored_count(store: &MemoryStore) -> Option<String> {
        store.get(DEFAULT_COUNT_KEY).unwrap()
    }

    #[test]
    fn test_first_visit_seeds_and_increments() {
        let mut counter = counter(MemoryStore::new(), MemoryStore::new());
        assert_eq!(counter.resolution(), VisitResolution::pending());

        let resolution = counter.resolve();
        assert_eq!(resolution, VisitResolution::settled(1251));
        assert_eq!(stored_count(counter.durable()).as_deref(), Some("1251"));
        assert_eq!(
            counter.session().get(DEFAULT_SESSION_KEY).unwrap().as_deref(),
            Some(SESSION_SENTINEL)
        );
    }

    #[test]
    fn test_remount_same_session_no_double_count() {
        let mut first = counter(MemoryStore::new(), MemoryStore::new());
        assert_eq!(first.resolve().count, 1251);

        let (durable, session) = first.into_parts();
        let mut second = counter(durable, session);
        assert_eq!(second.resolve().count, 1251);

        let (durable, session) = second.into_parts();
        let mut third = counter(durable, session);
        assert_eq!(third.resolve().count, 1251);
        assert_eq!(third.resolve().count, 1251);
    }

    #[test]
    fn test_new_session_increments() {
        let mut counter = counter(MemoryStore::new(), MemoryStore::new());
        assert_eq!(counter.resolve().count, 1251);

        // Session ends
        counter.session_mut().clear();
        let (durable, session) = counter.into_parts();

        let mut next = VisitorCounter::new(durable, session, VisitorConfig::default());
        assert_eq!(next.resolve().count, 1252);
    }

    #[test]
    fn test_existing_count_is_used() {
        let mut durable = MemoryStore::new();
        durable.set(DEFAULT_COUNT_KEY, "4000").unwrap();

        let mut counter = counter(durable, MemoryStore::new());
        assert_eq!(counter.resolve().count, 4001);
    }

    #[test]
    fn test_malformed_value_reseeds() {
        for garbage in ["abc", "-7", "12.5", "", "0"] {
            let mut durable = MemoryStore::new();
            durable.set(DEFAULT_COUNT_KEY, garbage).unwrap();

            let mut counter = counter(durable, MemoryStore::new());
            assert_eq!(counter.resolve().count, 1251, "value {garbage:?}");
        }
    }

    #[test]
    fn test_custom_base_and_keys() {
        let config = VisitorConfig {
            base_count: 10,
            count_key: "hits".into(),
            session_key: "seen".into(),
        };
        let mut counter = VisitorCounter::new(MemoryStore::new(), MemoryStore::new(), config);

        assert_eq!(counter.resolve().count, 11);
        assert_eq!(counter.durable().get("hits").unwrap().as_deref(), Some("11"));
        assert!(counter.session().get("seen").unwrap().is_some());
    }

    #[test]
    fn test_write_failure_does_not_raise() {
        let mut counter = VisitorCounter::new(QuotaStore::default(), MemoryStore::new(), VisitorConfig::default());

        let first = counter.resolve();
        assert!(first.settled);
        assert!(first.count >= DEFAULT_BASE_COUNT);

        // Stable within the view even though nothing persisted
        assert_eq!(counter.resolve(), first);
        assert_eq!(counter.resolve(), first);
    }

    #[test]
    fn test_disabled_storage_falls_back_to_base() {
        let mut counter = VisitorCounter::new(
            MemoryStore::disabled(),
            MemoryStore::disabled(),
            VisitorConfig::default(),
        );

        assert_eq!(counter.resolve(), VisitResolution::settled(DEFAULT_BASE_COUNT));
    }

    #[test]
    fn test_session_write_failure_no_double_count() {
        let mut counter = VisitorCounter::new(MemoryStore::new(), QuotaStore::default(), VisitorConfig::default());

        assert_eq!(counter.resolve().count, 1251);
        assert_eq!(counter.resolve().count, 1251);
        assert_eq!(stored_count(counter.durable()).as_deref(), Some("1251"));
    }

    #[test]
    fn test_reset_reseeds() {
        let mut counter = counter(MemoryStore::new(), MemoryStore::new());
        counter.resolve();
        counter.resolve();

        counter.reset();
        assert_eq!(counter.resolution(), VisitResolution::pending());
        assert_eq!(stored_count(counter.durable()), None);

        assert_eq!(counter.resolve().count, 1251);
    }

    #[test]
    fn test_resolution_signal_tracks_resolve() {
        let mut counter = counter(MemoryStore::new(), MemoryStore::new());
        let signal = counter.resolution_signal();
        assert!(!signal.get().settled);

        counter.resolve();
        assert_eq!(signal.get(), VisitResolution::settled(1251));
    }
}
