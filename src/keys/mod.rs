//! # Keys
//!
//! Key material classification, the deterministic key entity and its
//! relationship caches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DeterministicKey (root, one seed)                                     │
//! │     ├── KeyMaterial          native handles, classified once           │
//! │     ├── handle / export caches, keyed by KeyIdentifier                 │
//! │     └── RelationshipKeyCache                                           │
//! │            ├── did ──► master key                                      │
//! │            └── (key type, did, peer) ──► Arc<DeterministicKey>         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod deterministic;
mod material;

pub use cache::{MasterKey, PairwiseCacheKey, PairwiseCacheScope, RelationshipKeyCache};
pub use deterministic::{key_operations_for, DeterministicKey, KeyIdentifier, RawKey};
pub use material::KeyMaterial;
