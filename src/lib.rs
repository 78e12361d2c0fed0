//! # Pairwise Core
//!
//! Deterministic pairwise key derivation for decentralized identities.
//!
//! Given a master seed and a relationship (owner DID + peer id), derive a
//! key pair unique to that relationship. The same inputs always produce the
//! same key, so nothing is ever persisted.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PAIRWISE CORE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌───────────────┐                                                     │
//! │  │  MasterSeed   │  raw bytes or BIP39 phrase                          │
//! │  └───────┬───────┘                                                     │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │  DeterministicKey (root)                                      │     │
//! │  │                                                               │     │
//! │  │  derive_master_key(seed, did)   HMAC-SHA512   cached per DID  │     │
//! │  │  generate_pairwise(seed, did, peer)           cached per peer │     │
//! │  └───────┬───────────────────────────────────────────────────────┘     │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │  PairwiseKey(did, peer)                                       │     │
//! │  │                                                               │     │
//! │  │  EC  : HMAC-SHA256 → scalar mod n → d·G   (secp256k1)        │     │
//! │  │  RSA : HMAC-SHA512 chain → nearest probable primes → n, d    │     │
//! │  └───────┬───────────────────────────────────────────────────────┘     │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │  DeterministicKey (pairwise)  sign / verify / export JWK      │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! │                                                                         │
//! │  Every primitive goes through the async CryptoProvider trait.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Algorithm catalog, JWK, native crypto provider
//! - [`keys`] - Key material, deterministic keys, relationship caches
//! - [`pairwise`] - Pairwise EC/RSA derivation and prime search
//! - [`seed`] - Master seeds and BIP39 recovery phrases
//!
//! ## Example
//!
//! ```ignore
//! use pairwise_core::{crypto::Algorithm, DeterministicKey, RustCryptoProvider};
//!
//! let root = DeterministicKey::new(
//!     RustCryptoProvider::shared(),
//!     Algorithm::ecdsa("P-256K", "SHA-256"),
//!     None,
//!     true,
//! )?;
//! let pairwise = root.generate_pairwise(seed, "did:example:alice", "bob").await?;
//! let signature = pairwise.sign(b"hello").await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod error;
pub mod keys;
pub mod pairwise;
pub mod seed;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use crypto::{Algorithm, CryptoProvider, Jwk, KeyExport, KeyType, KeyUse, RustCryptoProvider};
pub use error::{Error, Result};
pub use keys::{DeterministicKey, KeyMaterial, PairwiseCacheScope, RawKey};
pub use pairwise::PairwiseKey;
pub use seed::{MasterSeed, RecoveryPhrase};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// RSA modulus length used when an algorithm descriptor omits one
pub const DEFAULT_RSA_MODULUS_LENGTH: usize = 2048;

/// Configuration for deterministic keys and their pairwise derivations
///
/// Pairwise keys inherit the configuration of the root key that derived them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationConfig {
    /// Modulus length for pairwise RSA keys when the algorithm has none
    pub default_rsa_modulus_length: usize,
    /// Which inputs identify a cached pairwise key
    pub pairwise_cache_scope: PairwiseCacheScope,
    /// Miller-Rabin rounds per prime candidate
    pub miller_rabin_rounds: usize,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            default_rsa_modulus_length: DEFAULT_RSA_MODULUS_LENGTH,
            pairwise_cache_scope: PairwiseCacheScope::default(),
            miller_rabin_rounds: pairwise::DEFAULT_MILLER_RABIN_ROUNDS,
        }
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Pairwise Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        #[cfg(target_os = "macos")]
        target: "macos",
        #[cfg(target_os = "linux")]
        target: "linux",
        #[cfg(target_os = "windows")]
        target: "windows",
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        target: "unknown",
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        verbose_logging: cfg!(feature = "verbose-logging"),
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target OS
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
    /// Whether per-candidate prime search tracing is compiled in
    pub verbose_logging: bool,
}

// ============================================================================
// TESTS
// ============================================================================
