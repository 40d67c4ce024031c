//! LRU cache for request authorization decisions
//!
//! The key includes the policy epoch: decisions cached under an older
//! configuration can never be replayed after a swap. Only request decisions
//! are cached; instance admission is a single map lookup and gains nothing.

use super::request::{AuthorizationDecision, Method, RequestDescriptor};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: Method,
    uri: String,
    identity: String,
    epoch: u64,
}

impl CacheKey {
    fn for_request(request: &RequestDescriptor, epoch: u64) -> Self {
        CacheKey {
            method: request.method.clone(),
            uri: request.uri.clone(),
            identity: request.identity.clone(),
            epoch,
        }
    }
}

/// Shared LRU cache over authorization decisions
pub struct DecisionCache {
    cache: Mutex<LruCache<CacheKey, AuthorizationDecision, ahash::RandomState>>,
}

impl DecisionCache {
    /// Create a cache with the given capacity (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        DecisionCache {
            cache: Mutex::new(LruCache::with_hasher(capacity, ahash::RandomState::new())),
        }
    }

    /// Look up a decision for this request under the given epoch
    pub fn get(&self, request: &RequestDescriptor, epoch: u64) -> Option<AuthorizationDecision> {
        let key = CacheKey::for_request(request, epoch);
        self.cache.lock().get(&key).cloned()
    }

    /// Store a decision for this request under the given epoch
    pub fn put(&self, request: &RequestDescriptor, epoch: u64, decision: AuthorizationDecision) {
        let key = CacheKey::for_request(request, epoch);
        self.cache.lock().put(key, decision);
    }

    /// Number of cached decisions
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Drop all cached decisions
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RuleKind;

    fn request(identity: &str) -> RequestDescriptor {
        RequestDescriptor::new("POST", "/instances", "10.0.0.1", identity)
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = DecisionCache::new(10);
        let req = request("admin");

        assert!(cache.get(&req, 0).is_none());

        cache.put(&req, 0, AuthorizationDecision::allowed(RuleKind::PrivilegedIdentity));
        let hit = cache.get(&req, 0).unwrap();
        assert!(hit.allow);
        assert_eq!(hit.rule, RuleKind::PrivilegedIdentity);
    }

    #[test]
    fn test_epoch_partitions_entries() {
        let cache = DecisionCache::new(10);
        let req = request("admin");

        cache.put(&req, 0, AuthorizationDecision::allowed(RuleKind::PrivilegedIdentity));

        // Same request, newer configuration: no hit
        assert!(cache.get(&req, 1).is_none());
    }

    #[test]
    fn test_identity_part_of_key() {
        let cache = DecisionCache::new(10);

        cache.put(
            &request("admin"),
            0,
            AuthorizationDecision::allowed(RuleKind::PrivilegedIdentity),
        );

        assert!(cache.get(&request("guest"), 0).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = DecisionCache::new(2);

        for identity in ["a", "b", "c"] {
            cache.put(
                &request(identity),
                0,
                AuthorizationDecision::allowed(RuleKind::PrivilegedIdentity),
            );
        }

        assert!(cache.get(&request("a"), 0).is_none());
        assert!(cache.get(&request("b"), 0).is_some());
        assert!(cache.get(&request("c"), 0).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = DecisionCache::new(10);
        cache.put(
            &request("admin"),
            0,
            AuthorizationDecision::allowed(RuleKind::PrivilegedIdentity),
        );

        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
