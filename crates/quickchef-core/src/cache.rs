//! In-memory plan cache with a fixed TTL and a capacity bound.
//!
//! Entries expire lazily: an expired entry is dropped by the first read that
//! sees it. Inserting into a full cache first sweeps expired entries, then
//! evicts the oldest one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::identity::RequestIdentity;
use crate::model::{CookingRequest, MealPlan};

/// How long a generated plan stays servable from the cache.
pub const PLAN_TTL: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of cached plans.
pub const DEFAULT_CAPACITY: usize = 256;

struct CacheEntry {
    plan: Arc<MealPlan>,
    created: Instant,
}

/// Process-wide plan cache keyed by [`RequestIdentity`].
///
/// Not partitioned by user: equivalent requests from different callers share
/// one entry.
pub struct PlanCache {
    entries: Mutex<HashMap<RequestIdentity, CacheEntry>>,
    capacity: usize,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PlanCache {
    /// Create a cache holding at most `capacity` plans (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, request: &CookingRequest) -> Option<Arc<MealPlan>> {
        self.lookup(&RequestIdentity::of(request))
    }

    pub fn set(&self, request: &CookingRequest, plan: Arc<MealPlan>) {
        self.insert(RequestIdentity::of(request), plan);
    }

    /// Look up by precomputed identity, evicting the entry if it has expired.
    pub fn lookup(&self, identity: &RequestIdentity) -> Option<Arc<MealPlan>> {
        let mut entries = self.lock();
        let entry = entries.get(identity)?;
        if entry.created.elapsed() > PLAN_TTL {
            entries.remove(identity);
            tracing::debug!(identity = %identity.fingerprint(), "evicted expired plan");
            return None;
        }
        Some(Arc::clone(&entry.plan))
    }

    /// Store a plan under a precomputed identity, overwriting any prior entry.
    pub fn insert(&self, identity: RequestIdentity, plan: Arc<MealPlan>) {
        let mut entries = self.lock();
        if !entries.contains_key(&identity) && entries.len() >= self.capacity {
            entries.retain(|_, e| e.created.elapsed() <= PLAN_TTL);
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.created)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                    tracing::debug!(
                        identity = %oldest.fingerprint(),
                        capacity = self.capacity,
                        "cache full, evicted oldest plan"
                    );
                }
            }
        }
        entries.insert(
            identity,
            CacheEntry {
                plan,
                created: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether an entry is physically present, expired or not.
    pub fn contains(&self, identity: &RequestIdentity) -> bool {
        self.lock().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestIdentity, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
