//! # Cryptography Module
//!
//! Algorithm descriptors, the JWK interchange form and the native provider
//! every key operation goes through.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  algorithm    Algorithm descriptor → KeyType / KeyUse           │   │
//! │  │               Curve alias normalization (P-256K → K-256)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  jwk          JSON Web Key members, base64url big-endian        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  provider     CryptoProvider trait (async)                      │   │
//! │  │               RustCryptoProvider: hmac, k256, p256, rsa         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose | Backend |
//! |-----------|---------|---------|
//! | HMAC-SHA512 | Master key per DID, RSA prime rounds | `hmac` + `sha2` |
//! | HMAC-SHA256 | EC pairwise scalar | `hmac` + `sha2` |
//! | ECDSA / ECDH secp256k1 | Pairwise EC keys | `k256` |
//! | ECDSA / ECDH P-256 | Imported or generated keys | `p256` |
//! | RSASSA-PKCS1-v1_5 | Pairwise RSA keys | `rsa` |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Raw secrets are held in `Zeroizing` buffers
//! 2. **Secure Random**: Non-deterministic keys use `rand::rngs::OsRng`
//! 3. **Redacted Debug**: Private JWK members never reach logs

pub mod algorithm;
pub mod jwk;
pub mod provider;

pub use algorithm::{
    classify_key_type, classify_key_use, is_secp256k1_alias, normalize_algorithm,
    normalize_curve_name, Algorithm, KeyExport, KeyOperation, KeyType, KeyUse, CURVE_K256,
    CURVE_P256, CURVE_P256K, CURVE_SECP256K1, RSA_PUBLIC_EXPONENT,
};
pub use jwk::{decode_b64, encode_b64, Jwk};
pub use provider::{
    CryptoKey, CryptoKeyPair, CryptoProvider, CrtParameters, KeyKind, NativeKey,
    RustCryptoProvider,
};

/// Length of a master key in bytes (HMAC-SHA512 output)
pub const MASTER_KEY_SIZE: usize = 64;

/// Length of a secp256k1 scalar and coordinate in bytes
pub const EC_KEY_SIZE: usize = 32;
