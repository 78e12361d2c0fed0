//! # Error Handling
//!
//! Error types for the pairwise key derivation core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Algorithm Errors                                                  │
//! │  │   ├── InvalidAlgorithm      - Missing/inconsistent descriptor       │
//! │  │   ├── UnsupportedAlgorithm  - Name not in the catalog               │
//! │  │   └── UnsupportedCurve      - Curve not accepted for derivation     │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   ├── UnsupportedKeyType    - Export/generate for unknown type      │
//! │  │   ├── UnsupportedPairwiseKeyType - Pairwise for symmetric keys      │
//! │  │   ├── MissingKeyMaterial    - No private/secret handle to sign      │
//! │  │   ├── MalformedKeyObject    - Handle is neither pair nor half       │
//! │  │   └── InvalidKey            - Bad JWK member or key bytes           │
//! │  │                                                                      │
//! │  ├── Provider Errors                                                   │
//! │  │   ├── KeyGenerationFailed   - Native generate/import/export failed  │
//! │  │   └── SigningFailed         - Native sign failed                    │
//! │  │                                                                      │
//! │  ├── Seed Errors                                                       │
//! │  │   └── InvalidRecoveryPhrase - Invalid BIP39 phrase                  │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── Internal              - Should not happen                     │
//! │      └── SerializationError    - JWK (de)serialization                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate retries on error. Key material that fails to derive
//! is reported to the caller as-is.

use thiserror::Error;

/// Result type alias for derivation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the derivation core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Algorithm Errors (100-199)
    // ========================================================================

    /// Algorithm descriptor is missing its name or is inconsistent
    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// Algorithm name is not in the catalog
    #[error("The algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    /// Named curve is not accepted for this operation
    #[error("Curve '{0}' is not supported")]
    UnsupportedCurve(String),

    // ========================================================================
    // Key Errors (200-299)
    // ========================================================================

    /// Key type cannot be exported or generated
    #[error("Key type '{0}' is not supported")]
    UnsupportedKeyType(String),

    /// Pairwise derivation requested for a key type without a derivation
    #[error("Pairwise key for type '{0}' is not supported.")]
    UnsupportedPairwiseKeyType(String),

    /// Sign attempted without a private or secret key
    #[error("A private key with id of '{0}' required to validate the signature cannot be found.")]
    MissingKeyMaterial(String),

    /// Native key handle is neither a pair nor a tagged half
    #[error("Key with type '{0}' is expected to have the type public or private")]
    MalformedKeyObject(String),

    /// Invalid key format or member
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Provider Errors (300-399)
    // ========================================================================

    /// Native generate, import or export failed
    #[error("Key generation failed during {step}: {reason}")]
    KeyGenerationFailed {
        /// The provider step that failed
        step: &'static str,
        /// Underlying reason
        reason: String,
    },

    /// Native signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // ========================================================================
    // Seed Errors (400-499)
    // ========================================================================

    /// Invalid recovery phrase
    #[error("Invalid recovery phrase: {0}")]
    InvalidRecoveryPhrase(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Shorthand for a failed provider step
    pub(crate) fn generation(step: &'static str, reason: impl std::fmt::Display) -> Self {
        Error::KeyGenerationFailed {
            step,
            reason: reason.to_string(),
        }
    }

    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Algorithm
    /// - 200-299: Key
    /// - 300-399: Provider
    /// - 400-499: Seed
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Algorithm (100-199)
            Error::InvalidAlgorithm(_) => 100,
            Error::UnsupportedAlgorithm(_) => 101,
            Error::UnsupportedCurve(_) => 102,

            // Key (200-299)
            Error::UnsupportedKeyType(_) => 200,
            Error::UnsupportedPairwiseKeyType(_) => 201,
            Error::MissingKeyMaterial(_) => 202,
            Error::MalformedKeyObject(_) => 203,
            Error::InvalidKey(_) => 204,

            // Provider (300-399)
            Error::KeyGenerationFailed { .. } => 300,
            Error::SigningFailed(_) => 301,

            // Seed (400-499)
            Error::InvalidRecoveryPhrase(_) => 400,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 901,
        }
    }

    /// Check if this error is caused by caller configuration
    ///
    /// Configuration errors will fail identically on every call until the
    /// algorithm descriptor or key input is fixed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidAlgorithm(_)
                | Error::UnsupportedAlgorithm(_)
                | Error::UnsupportedCurve(_)
                | Error::UnsupportedKeyType(_)
                | Error::UnsupportedPairwiseKeyType(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::InvalidKey(format!("Invalid base64url member: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================
