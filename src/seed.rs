//! # Master Seed
//!
//! The root secret every master key is derived from, either supplied as raw
//! bytes or recovered from a BIP39 phrase.
//!
//! ## Seed Sources
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          MASTER SEED SOURCES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Raw bytes ─────────────────────────────────────────┐                  │
//! │  (e.g. an extended private key string)              │                  │
//! │                                                      ▼                  │
//! │  BIP39 phrase (24 words)                      ┌─────────────┐          │
//! │      │                                        │ MasterSeed  │          │
//! │      ▼                                        └──────┬──────┘          │
//! │  PBKDF2-HMAC-SHA512(                                 │                  │
//! │    password = mnemonic,                              ▼                  │
//! │    salt = "mnemonic" + passphrase,        HMAC-SHA512(seed, did)       │
//! │    2048 rounds) ──► 64 bytes ──────────►  = master key per DID         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The full 64-byte BIP39 seed is used as the HMAC key.
//!
//! ## Security Considerations
//!
//! | Aspect | Measure |
//! |--------|---------|
//! | Entropy | 256 bits from OS CSPRNG |
//! | Checksum | 8 bits prevents typos |
//! | Memory | Seed bytes are zeroized on drop |
//! | Display | Debug output is redacted |

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::{Zeroizing, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Number of words in a recovery phrase
pub const WORD_COUNT: usize = 24;

/// Entropy size in bytes for 24 words (256 bits)
const ENTROPY_BYTES: usize = 32;

/// Size of a generated or BIP39-derived seed
pub const SEED_SIZE: usize = 64;

/// Root secret for master key derivation
#[derive(Clone)]
pub struct MasterSeed {
    bytes: Zeroizing<Vec<u8>>,
}

impl MasterSeed {
    /// Wrap existing seed bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(Error::InvalidKey("Master seed must not be empty".into()));
        }
        Ok(Self { bytes })
    }

    /// A fresh random seed
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; SEED_SIZE]);
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Seed from a recovery phrase and optional passphrase
    pub fn from_phrase(phrase: &str, passphrase: &str) -> Result<Self> {
        RecoveryPhrase::from_phrase(phrase)?.to_master_seed(passphrase)
    }

    /// Seed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Seed length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a constructed seed
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for MasterSeed {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Prevent accidental logging
impl std::fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterSeed([REDACTED; {} bytes])", self.bytes.len())
    }
}

/// A BIP39 recovery phrase
///
/// ## Security Warning
///
/// - This phrase recovers every pairwise key of every DID it seeds
/// - Should never be logged or stored in plaintext
#[derive(ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    #[zeroize(skip)] // bip39::Mnemonic doesn't implement Zeroize
    mnemonic: Mnemonic,
}

impl RecoveryPhrase {
    /// Generate a new random 24-word phrase
    pub fn generate() -> Result<Self> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
        rand::rngs::OsRng.fill_bytes(&mut entropy[..]);

        let mnemonic = Mnemonic::from_entropy(&entropy[..]).map_err(|e| {
            Error::InvalidRecoveryPhrase(format!("Failed to generate mnemonic: {}", e))
        })?;

        Ok(Self { mnemonic })
    }

    /// Parse and validate a 24-word phrase
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse_normalized(phrase)
            .map_err(|e| Error::InvalidRecoveryPhrase(format!("{}", e)))?;

        if mnemonic.word_count() != WORD_COUNT {
            return Err(Error::InvalidRecoveryPhrase(format!(
                "Expected {} words, got {}",
                WORD_COUNT,
                mnemonic.word_count()
            )));
        }

        Ok(Self { mnemonic })
    }

    /// The words
    pub fn words(&self) -> Vec<&'static str> {
        self.mnemonic.words().collect()
    }

    /// The phrase as a single space-separated string
    ///
    /// Only for display to the user. Never log or store.
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    /// Derive the 64-byte BIP39 seed
    pub fn to_master_seed(&self, passphrase: &str) -> Result<MasterSeed> {
        MasterSeed::from_bytes(self.mnemonic.to_seed(passphrase).to_vec())
    }

    /// Check a word against the English wordlist
    pub fn is_valid_word(word: &str) -> bool {
        let word_lower = word.to_lowercase();
        Language::English.word_list().iter().any(|w| *w == word_lower)
    }
}

impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoveryPhrase([REDACTED])")
    }
}

// ============================================================================
// TESTS
// ============================================================================
