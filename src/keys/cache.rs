//! # Relationship Key Cache
//!
//! Memoizes master keys per DID and pairwise keys per relationship on a
//! single root key.
//!
//! ## Memoization Barrier
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ONE DERIVATION PER KEY                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  caller A ──┐                                                          │
//! │             ├──► lock map ──► entry(key) ──► Arc<OnceCell> ──► unlock  │
//! │  caller B ──┘                                     │                    │
//! │                                                    ▼                    │
//! │                              first caller runs the derivation          │
//! │                              others await the same cell                │
//! │                                                    │                    │
//! │                                                    ▼                    │
//! │                              every caller gets the same Arc            │
//! │                                                                         │
//! │  A failed derivation leaves the cell empty; the next caller runs it    │
//! │  again. Nothing retries on its own.                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map lock is held only to fetch or insert a cell, never across an
//! await.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::crypto::KeyType;
use crate::error::Result;
use crate::keys::DeterministicKey;

/// Raw master key bytes for one DID
pub type MasterKey = Zeroizing<Vec<u8>>;

/// Which inputs identify a cached pairwise key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PairwiseCacheScope {
    /// One key per (key type, DID, peer)
    #[default]
    KeyTypeDidPeer,
    /// One key per peer, whatever the DID or key type
    PeerOnly,
}

/// Cache key for a derived pairwise key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PairwiseCacheKey {
    /// Scoped to key type, DID and peer
    Relationship {
        /// Key type of the derived key
        key_type: KeyType,
        /// Owner DID
        did: String,
        /// Peer identifier
        peer_id: String,
    },
    /// Scoped to the peer alone
    Peer(String),
}

impl PairwiseCacheKey {
    /// Build the cache key for a relationship under the given scope
    pub fn new(scope: PairwiseCacheScope, key_type: KeyType, did: &str, peer_id: &str) -> Self {
        match scope {
            PairwiseCacheScope::KeyTypeDidPeer => PairwiseCacheKey::Relationship {
                key_type,
                did: did.to_string(),
                peer_id: peer_id.to_string(),
            },
            PairwiseCacheScope::PeerOnly => PairwiseCacheKey::Peer(peer_id.to_string()),
        }
    }
}

type CellMap<K, V> = Mutex<HashMap<K, Arc<OnceCell<V>>>>;

/// Master-key and pairwise-key caches of a root key
#[derive(Default)]
pub struct RelationshipKeyCache {
    master_keys: CellMap<String, Arc<MasterKey>>,
    pairwise_keys: CellMap<PairwiseCacheKey, Arc<DeterministicKey>>,
}

impl RelationshipKeyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Master key for `did`, running `derive` only if none is cached yet
    pub async fn master_key<F, Fut>(&self, did: &str, derive: F) -> Result<Arc<MasterKey>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<MasterKey>>>,
    {
        memoize(&self.master_keys, did.to_string(), derive).await
    }

    /// Pairwise key for `key`, running `derive` only if none is cached yet
    pub async fn pairwise_key<F, Fut>(
        &self,
        key: PairwiseCacheKey,
        derive: F,
    ) -> Result<Arc<DeterministicKey>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<DeterministicKey>>>,
    {
        memoize(&self.pairwise_keys, key, derive).await
    }

    /// Cached master key for `did`, if derived
    pub fn cached_master_key(&self, did: &str) -> Option<Arc<MasterKey>> {
        self.master_keys
            .lock()
            .get(did)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of derived master keys
    pub fn master_key_count(&self) -> usize {
        count_initialized(&self.master_keys)
    }

    /// Number of derived pairwise keys
    pub fn pairwise_key_count(&self) -> usize {
        count_initialized(&self.pairwise_keys)
    }
}

impl std::fmt::Debug for RelationshipKeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipKeyCache")
            .field("master_keys", &self.master_key_count())
            .field("pairwise_keys", &self.pairwise_key_count())
            .finish()
    }
}

async fn memoize<K, V, F, Fut>(map: &CellMap<K, V>, key: K, init: F) -> Result<V>
where
    K: Eq + Hash,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let cell = map.lock().entry(key).or_default().clone();
    let value = cell.get_or_try_init(init).await?.clone();
    Ok(value)
}

fn count_initialized<K, V>(map: &CellMap<K, V>) -> usize {
    map.lock().values().filter(|cell| cell.initialized()).count()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_key_scope() {
        let full = PairwiseCacheScope::KeyTypeDidPeer;
        let full_a = PairwiseCacheKey::new(full, KeyType::EllipticCurve, "did:a", "peer");
        let full_b = PairwiseCacheKey::new(full, KeyType::Rsa, "did:a", "peer");
        assert_ne!(full_a, full_b);

        let peer = PairwiseCacheScope::PeerOnly;
        let peer_a = PairwiseCacheKey::new(peer, KeyType::EllipticCurve, "did:a", "peer");
        let peer_b = PairwiseCacheKey::new(peer, KeyType::Rsa, "did:b", "peer");
        assert_eq!(peer_a, peer_b);
    }

    #[test]
    fn test_default_scope() {
        assert_eq!(PairwiseCacheScope::default(), PairwiseCacheScope::KeyTypeDidPeer);
    }

    #[tokio::test]
    async fn test_master_key_derived_once() {
        let cache = RelationshipKeyCache::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let key = cache
                .master_key("did:test", || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(Zeroizing::new(vec![7u8; 64])))
                })
                .await
                .unwrap();
            assert_eq!(key.as_slice(), &[7u8; 64]);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.master_key_count(), 1);
        assert!(cache.cached_master_key("did:test").is_some());
        assert!(cache.cached_master_key("did:other").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_master_key_single_derivation() {
        let cache = Arc::new(RelationshipKeyCache::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let runs = runs.clone();
                tokio::spawn(async move {
                    cache
                        .master_key("did:test", || async move {
                            runs.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                            Ok(Arc::new(Zeroizing::new(vec![1u8; 64])))
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        let keys: Vec<_> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(keys.iter().all(|key| Arc::ptr_eq(key, &keys[0])));
    }

    #[tokio::test]
    async fn test_failed_derivation_is_not_cached() {
        let cache = RelationshipKeyCache::new();

        let failed = cache
            .master_key("did:test", || async { Err(Error::Internal("boom".into())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.master_key_count(), 0);

        let key = cache
            .master_key("did:test", || async { Ok(Arc::new(Zeroizing::new(vec![2u8; 64]))) })
            .await
            .unwrap();
        assert_eq!(key[0], 2);
    }
}
