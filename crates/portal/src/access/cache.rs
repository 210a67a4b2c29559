//! Per-principal cache of the three account reads.
//!
//! Entries are keyed by `(principal, query kind)`. Invalidation is explicit
//! and per principal; once `invalidate_principal` returns, no earlier value
//! for that principal is served, and reads that were already in flight
//! when it ran are not written back.
//!
//! A backend read is bracketed by a [`ReadTicket`]. Tickets are counted per
//! principal together with an invalidation epoch; the count is dropped once
//! the last ticket for a principal goes away, so only principals with reads
//! in flight are tracked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use moka::sync::Cache;
use serde::Serialize;
use tracing::debug;

use estate_crm_core::{Principal, UserRole};

use crate::config::CacheConfig;
use crate::models::{AgentRecord, UserProfile};

/// The account reads the resolver depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    Role,
    Profile,
    AgentRecord,
}

impl QueryKind {
    pub const ALL: [Self; 3] = [Self::Role, Self::Profile, Self::AgentRecord];
}

/// Cache key.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub principal: Principal,
    pub kind: QueryKind,
}

/// Cached value types.
///
/// `None` payloads are loaded-but-absent, not misses.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Role(UserRole),
    Profile(Option<UserProfile>),
    AgentRecord(Option<AgentRecord>),
}

impl CacheValue {
    /// The query this value answers.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Role(_) => QueryKind::Role,
            Self::Profile(_) => QueryKind::Profile,
            Self::AgentRecord(_) => QueryKind::AgentRecord,
        }
    }
}

/// Cache of account reads, shared across requests.
#[derive(Clone)]
pub struct AccountCache {
    inner: Arc<AccountCacheInner>,
}

struct AccountCacheInner {
    entries: Cache<CacheKey, CacheValue>,
    /// Principals with backend reads in flight.
    in_flight: Mutex<HashMap<Principal, InFlight>>,
}

#[derive(Debug, Default)]
struct InFlight {
    /// Bumped on every invalidation while reads are outstanding.
    epoch: u64,
    readers: usize,
}

impl AccountCacheInner {
    fn in_flight(&self) -> MutexGuard<'_, HashMap<Principal, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An outstanding backend read for one principal.
///
/// Take it before issuing the read and hand it to [`AccountCache::insert`].
/// Dropping it without inserting (a failed read) just releases it.
pub struct ReadTicket {
    cache: Arc<AccountCacheInner>,
    principal: Principal,
    epoch: u64,
}

impl Drop for ReadTicket {
    fn drop(&mut self) {
        let mut in_flight = self.cache.in_flight();
        if let Some(slot) = in_flight.get_mut(&self.principal) {
            slot.readers = slot.readers.saturating_sub(1);
            if slot.readers == 0 {
                in_flight.remove(&self.principal);
            }
        }
    }
}

impl AccountCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();
        Self {
            inner: Arc::new(AccountCacheInner {
                entries,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a backend read for `principal`.
    #[must_use]
    pub fn begin_read(&self, principal: &Principal) -> ReadTicket {
        let mut in_flight = self.inner.in_flight();
        let slot = in_flight.entry(principal.clone()).or_default();
        slot.readers += 1;
        ReadTicket {
            cache: Arc::clone(&self.inner),
            principal: principal.clone(),
            epoch: slot.epoch,
        }
    }

    /// Look up a cached read.
    pub fn get(&self, principal: &Principal, kind: QueryKind) -> Option<CacheValue> {
        let key = CacheKey {
            principal: principal.clone(),
            kind,
        };
        let hit = self.inner.entries.get(&key);
        if hit.is_some() {
            debug!(principal = %principal, ?kind, "Cache hit");
        }
        hit
    }

    /// Store the result of the read behind `ticket`.
    ///
    /// Returns `false`, storing nothing, if the principal was invalidated
    /// after the ticket was taken.
    pub fn insert(&self, ticket: ReadTicket, value: CacheValue) -> bool {
        let kind = value.kind();
        let stored = {
            let in_flight = self.inner.in_flight();
            let current = in_flight.get(&ticket.principal).map(|slot| slot.epoch);
            if current == Some(ticket.epoch) {
                // Under the lock, so an invalidation cannot land between the
                // check and the write.
                let key = CacheKey {
                    principal: ticket.principal.clone(),
                    kind,
                };
                self.inner.entries.insert(key, value);
                true
            } else {
                false
            }
        };
        if !stored {
            debug!(principal = %ticket.principal, ?kind, "Discarding stale read");
        }
        stored
    }

    /// Drop every cached read for `principal` and void its reads in flight.
    pub fn invalidate_principal(&self, principal: &Principal) {
        {
            let mut in_flight = self.inner.in_flight();
            if let Some(slot) = in_flight.get_mut(principal) {
                slot.epoch += 1;
            }
            for kind in QueryKind::ALL {
                let key = CacheKey {
                    principal: principal.clone(),
                    kind,
                };
                self.inner.entries.invalidate(&key);
            }
        }
        debug!(principal = %principal, "Invalidated account cache");
    }

    /// Number of principals with reads in flight.
    #[must_use]
    pub fn reads_in_flight(&self) -> usize {
        self.inner.in_flight().len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn principal(s: &str) -> Principal {
        Principal::parse(s).unwrap()
    }

    fn cache() -> AccountCache {
        AccountCache::new(&CacheConfig::default())
    }

    fn store(cache: &AccountCache, p: &Principal, value: CacheValue) -> bool {
        let ticket = cache.begin_read(p);
        cache.insert(ticket, value)
    }

    #[test]
    fn test_insert_and_get() {
        let cache = cache();
        let p = principal("aaaaa-aa");
        assert!(store(&cache, &p, CacheValue::Role(UserRole::Admin)));

        assert!(matches!(
            cache.get(&p, QueryKind::Role),
            Some(CacheValue::Role(UserRole::Admin))
        ));
        assert!(cache.get(&p, QueryKind::Profile).is_none());
    }

    #[test]
    fn test_absent_values_are_hits() {
        let cache = cache();
        let p = principal("aaaaa-aa");
        store(&cache, &p, CacheValue::AgentRecord(None));
        assert!(matches!(
            cache.get(&p, QueryKind::AgentRecord),
            Some(CacheValue::AgentRecord(None))
        ));
    }

    #[test]
    fn test_invalidate_principal_is_scoped() {
        let cache = cache();
        let a = principal("aaaaa-aa");
        let b = principal("bbbbb-bb");
        store(&cache, &a, CacheValue::Role(UserRole::User));
        store(&cache, &a, CacheValue::Profile(None));
        store(&cache, &b, CacheValue::Role(UserRole::Admin));

        cache.invalidate_principal(&a);

        assert!(cache.get(&a, QueryKind::Role).is_none());
        assert!(cache.get(&a, QueryKind::Profile).is_none());
        assert!(cache.get(&b, QueryKind::Role).is_some());
    }

    #[test]
    fn test_read_started_before_invalidation_is_dropped() {
        let cache = cache();
        let p = principal("aaaaa-aa");
        let ticket = cache.begin_read(&p);

        cache.invalidate_principal(&p);

        assert!(!cache.insert(ticket, CacheValue::Role(UserRole::Guest)));
        assert!(cache.get(&p, QueryKind::Role).is_none());
    }

    #[test]
    fn test_read_started_after_invalidation_is_kept() {
        let cache = cache();
        let p = principal("aaaaa-aa");
        let stale = cache.begin_read(&p);
        cache.invalidate_principal(&p);
        let fresh = cache.begin_read(&p);

        assert!(cache.insert(fresh, CacheValue::Role(UserRole::User)));
        assert!(!cache.insert(stale, CacheValue::Role(UserRole::Guest)));
        assert!(matches!(
            cache.get(&p, QueryKind::Role),
            Some(CacheValue::Role(UserRole::User))
        ));
    }

    #[test]
    fn test_tracking_released_with_last_ticket() {
        let cache = cache();
        for n in 0..5000 {
            let p = principal(&format!("agent-{n}"));
            let ticket = cache.begin_read(&p);
            cache.invalidate_principal(&p);
            drop(ticket);
            cache.invalidate_principal(&p);
        }
        assert_eq!(cache.reads_in_flight(), 0);

        let p = principal("aaaaa-aa");
        let first = cache.begin_read(&p);
        let second = cache.begin_read(&p);
        assert_eq!(cache.reads_in_flight(), 1);
        drop(first);
        assert_eq!(cache.reads_in_flight(), 1);
        assert!(cache.insert(second, CacheValue::Profile(None)));
        assert_eq!(cache.reads_in_flight(), 0);
    }

    #[test]
    fn test_concurrent_invalidation_leaves_no_stale_value() {
        let cache = cache();
        let p = principal("aaaaa-aa");

        for _ in 0..500 {
            let ticket = cache.begin_read(&p);
            let writer = {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache.insert(ticket, CacheValue::Role(UserRole::Guest))
                })
            };
            cache.invalidate_principal(&p);
            let stored = writer.join().unwrap();

            // Either the write landed before the invalidation and was
            // removed by it, or it was discarded.
            assert!(!stored || cache.get(&p, QueryKind::Role).is_none());
            cache.invalidate_principal(&p);
        }
        assert_eq!(cache.reads_in_flight(), 0);
    }
}
