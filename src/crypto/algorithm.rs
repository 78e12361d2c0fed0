//! # Algorithm Catalog
//!
//! Maps an algorithm descriptor to the key type and key use it implies, and
//! normalizes curve aliases for the provider.
//!
//! ## Classification
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ALGORITHM → KEY TYPE / KEY USE                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Algorithm name          Key type          Key use                      │
//! │  ─────────────────────────────────────────────────────────              │
//! │  hmac                    Symmetric (oct)   Signature (sig)              │
//! │  ecdsa                   EllipticCurve     Signature (sig)              │
//! │  ecdh                    EllipticCurve     Encryption (enc)             │
//! │  rsassa-pkcs1-v1_5       Rsa               Signature (sig)              │
//! │  rsa-oaep                Rsa               Encryption (enc)             │
//! │                                                                         │
//! │  Names are matched case-insensitively. Anything else is rejected.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Curve Aliases
//!
//! The W3C name for secp256k1 (`P-256K`) is not the one the provider knows
//! (`K-256`). Every descriptor and JWK goes through [`normalize_curve_name`]
//! before it reaches the provider.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical provider name for secp256k1
pub const CURVE_K256: &str = "K-256";

/// W3C alias for secp256k1
pub const CURVE_P256K: &str = "P-256K";

/// SEC name for secp256k1
pub const CURVE_SECP256K1: &str = "secp256k1";

/// NIST P-256
pub const CURVE_P256: &str = "P-256";

/// Curve names accepted for pairwise elliptic-curve derivation
pub const SECP256K1_ALIASES: [&str; 3] = [CURVE_K256, CURVE_P256K, CURVE_SECP256K1];

/// Fixed RSA public exponent (65537)
pub const RSA_PUBLIC_EXPONENT: [u8; 3] = [0x01, 0x00, 0x01];

/// Key type implied by an algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Symmetric secret (JWK `oct`)
    #[serde(rename = "oct")]
    Symmetric,
    /// Elliptic curve key pair (JWK `EC`)
    #[serde(rename = "EC")]
    EllipticCurve,
    /// RSA key pair (JWK `RSA`)
    #[serde(rename = "RSA")]
    Rsa,
}

impl KeyType {
    /// JWK `kty` value
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Symmetric => "oct",
            KeyType::EllipticCurve => "EC",
            KeyType::Rsa => "RSA",
        }
    }

    /// Parse a JWK `kty` value
    pub fn parse(kty: &str) -> Option<Self> {
        match kty {
            "oct" => Some(KeyType::Symmetric),
            "EC" => Some(KeyType::EllipticCurve),
            "RSA" => Some(KeyType::Rsa),
            _ => None,
        }
    }

    /// Whether keys of this type are public-key crypto (have two halves)
    pub fn is_public_key_crypto(&self) -> bool {
        match self {
            KeyType::EllipticCurve | KeyType::Rsa => true,
            KeyType::Symmetric => false,
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended use of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUse {
    /// Signing and verification (JWK `sig`)
    #[serde(rename = "sig")]
    Signature,
    /// Encryption or key agreement (JWK `enc`)
    #[serde(rename = "enc")]
    Encryption,
}

impl KeyUse {
    /// JWK `use` value
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUse::Signature => "sig",
            KeyUse::Encryption => "enc",
        }
    }
}

impl std::fmt::Display for KeyUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the key material an export represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyExport {
    /// The secret of a symmetric key
    Secret,
    /// The private part of a key pair
    Private,
    /// The public part of a key pair
    Public,
}

impl KeyExport {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyExport::Secret => "secret",
            KeyExport::Private => "private",
            KeyExport::Public => "public",
        }
    }
}

impl std::fmt::Display for KeyExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations a key handle may be used for (WebCrypto usages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyOperation {
    /// Create signatures
    Sign,
    /// Verify signatures
    Verify,
    /// Encrypt data
    Encrypt,
    /// Decrypt data
    Decrypt,
    /// Wrap another key
    WrapKey,
    /// Unwrap another key
    UnwrapKey,
    /// Derive a key through key agreement
    DeriveKey,
    /// Derive raw bits through key agreement
    DeriveBits,
}

impl KeyOperation {
    /// WebCrypto usage name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyOperation::Sign => "sign",
            KeyOperation::Verify => "verify",
            KeyOperation::Encrypt => "encrypt",
            KeyOperation::Decrypt => "decrypt",
            KeyOperation::WrapKey => "wrapKey",
            KeyOperation::UnwrapKey => "unwrapKey",
            KeyOperation::DeriveKey => "deriveKey",
            KeyOperation::DeriveBits => "deriveBits",
        }
    }
}

/// A cryptographic algorithm descriptor
///
/// Mirrors the WebCrypto algorithm dictionaries: the `name` selects the
/// algorithm, the optional members parameterize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    /// Algorithm name (e.g. "ECDSA", "hmac")
    pub name: String,

    /// Hash name (e.g. "SHA-256")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Named curve for EC algorithms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<String>,

    /// RSA modulus length in bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus_length: Option<usize>,

    /// RSA public exponent as big-endian bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_exponent: Option<Vec<u8>>,
}

impl Algorithm {
    /// A descriptor with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: None,
            named_curve: None,
            modulus_length: None,
            public_exponent: None,
        }
    }

    /// HMAC with the given hash
    pub fn hmac(hash: &str) -> Self {
        Self {
            hash: Some(hash.to_string()),
            ..Self::named("hmac")
        }
    }

    /// ECDSA on the given curve with the given hash
    pub fn ecdsa(named_curve: &str, hash: &str) -> Self {
        Self {
            hash: Some(hash.to_string()),
            named_curve: Some(named_curve.to_string()),
            ..Self::named("ECDSA")
        }
    }

    /// ECDH on the given curve
    pub fn ecdh(named_curve: &str) -> Self {
        Self {
            named_curve: Some(named_curve.to_string()),
            ..Self::named("ECDH")
        }
    }

    /// RSASSA-PKCS1-v1_5 with exponent 65537
    pub fn rsassa_pkcs1_v1_5(modulus_length: usize, hash: &str) -> Self {
        Self {
            hash: Some(hash.to_string()),
            modulus_length: Some(modulus_length),
            public_exponent: Some(RSA_PUBLIC_EXPONENT.to_vec()),
            ..Self::named("RSASSA-PKCS1-v1_5")
        }
    }

    /// RSA-OAEP with exponent 65537
    pub fn rsa_oaep(modulus_length: usize, hash: &str) -> Self {
        Self {
            hash: Some(hash.to_string()),
            modulus_length: Some(modulus_length),
            public_exponent: Some(RSA_PUBLIC_EXPONENT.to_vec()),
            ..Self::named("RSA-OAEP")
        }
    }

    /// Lowercased algorithm name
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Canonical hash name, defaulting to SHA-256
    pub fn hash_name(&self) -> Result<&'static str> {
        let Some(hash) = self.hash.as_deref() else {
            return Ok("SHA-256");
        };
        match hash.to_uppercase().replace('_', "-").as_str() {
            "SHA-256" | "SHA256" => Ok("SHA-256"),
            "SHA-384" | "SHA384" => Ok("SHA-384"),
            "SHA-512" | "SHA512" => Ok("SHA-512"),
            _ => Err(Error::UnsupportedAlgorithm(format!("{}/{}", self.name, hash))),
        }
    }
}

/// Determine the key type for an algorithm
pub fn classify_key_type(algorithm: &Algorithm) -> Result<KeyType> {
    match algorithm.normalized_name().as_str() {
        "hmac" => Ok(KeyType::Symmetric),
        "ecdsa" | "ecdh" => Ok(KeyType::EllipticCurve),
        "rsassa-pkcs1-v1_5" | "rsa-oaep" => Ok(KeyType::Rsa),
        _ => Err(Error::UnsupportedAlgorithm(algorithm.name.clone())),
    }
}

/// Determine the key use for an algorithm
pub fn classify_key_use(algorithm: &Algorithm) -> Result<KeyUse> {
    match algorithm.normalized_name().as_str() {
        "hmac" | "ecdsa" | "rsassa-pkcs1-v1_5" => Ok(KeyUse::Signature),
        "ecdh" | "rsa-oaep" => Ok(KeyUse::Encryption),
        _ => Err(Error::UnsupportedAlgorithm(algorithm.name.clone())),
    }
}

/// Rewrite a secp256k1 alias to the provider's canonical name
pub fn normalize_curve_name(name: &str) -> &str {
    if name == CURVE_P256K || name == CURVE_SECP256K1 {
        CURVE_K256
    } else {
        name
    }
}

/// Whether a curve name denotes secp256k1
pub fn is_secp256k1_alias(name: &str) -> bool {
    SECP256K1_ALIASES.contains(&name)
}

/// Copy of the descriptor with its curve name normalized
pub fn normalize_algorithm(algorithm: &Algorithm) -> Algorithm {
    let mut normalized = algorithm.clone();
    if let Some(curve) = normalized.named_curve.as_deref() {
        let canonical = normalize_curve_name(curve);
        if canonical != curve {
            normalized.named_curve = Some(canonical.to_string());
        }
    }
    normalized
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_key_type() {
        assert_eq!(classify_key_type(&Algorithm::named("hmac")).unwrap(), KeyType::Symmetric);
        assert_eq!(classify_key_type(&Algorithm::named("ecdsa")).unwrap(), KeyType::EllipticCurve);
        assert_eq!(classify_key_type(&Algorithm::named("ecdh")).unwrap(), KeyType::EllipticCurve);
        assert_eq!(
            classify_key_type(&Algorithm::named("rsassa-pkcs1-v1_5")).unwrap(),
            KeyType::Rsa
        );
        assert_eq!(classify_key_type(&Algorithm::named("RSA-OAEP")).unwrap(), KeyType::Rsa);
    }

    #[test]
    fn test_classify_key_type_unknown() {
        let err = classify_key_type(&Algorithm::named("xxx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
        assert_eq!(err.to_string(), "The algorithm 'xxx' is not supported");
    }

    #[test]
    fn test_classify_key_use() {
        assert_eq!(classify_key_use(&Algorithm::named("HMAC")).unwrap(), KeyUse::Signature);
        assert_eq!(classify_key_use(&Algorithm::named("ECDSA")).unwrap(), KeyUse::Signature);
        assert_eq!(classify_key_use(&Algorithm::named("ECDH")).unwrap(), KeyUse::Encryption);
        assert_eq!(
            classify_key_use(&Algorithm::named("RSASSA-PKCS1-v1_5")).unwrap(),
            KeyUse::Signature
        );
        assert!(matches!(
            classify_key_use(&Algorithm::named("aes-gcm")),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_normalize_curve_name() {
        assert_eq!(normalize_curve_name("P-256K"), "K-256");
        assert_eq!(normalize_curve_name("secp256k1"), "K-256");
        assert_eq!(normalize_curve_name("K-256"), "K-256");
        assert_eq!(normalize_curve_name("P-256"), "P-256");
    }

    #[test]
    fn test_normalize_algorithm_leaves_original() {
        let alg = Algorithm::ecdsa("P-256K", "SHA-256");
        let normalized = normalize_algorithm(&alg);

        assert_eq!(normalized.named_curve.as_deref(), Some("K-256"));
        assert_eq!(alg.named_curve.as_deref(), Some("P-256K"));
    }

    #[test]
    fn test_hash_name() {
        assert_eq!(Algorithm::hmac("sha-512").hash_name().unwrap(), "SHA-512");
        assert_eq!(Algorithm::named("ECDSA").hash_name().unwrap(), "SHA-256");
        assert!(Algorithm::hmac("MD5").hash_name().is_err());
    }

    #[test]
    fn test_algorithm_serde_camel_case() {
        let alg = Algorithm::rsassa_pkcs1_v1_5(1024, "SHA-256");
        let json = serde_json::to_value(&alg).unwrap();

        assert_eq!(json["modulusLength"], 1024);
        assert_eq!(json["publicExponent"], serde_json::json!([1, 0, 1]));
        assert!(json.get("namedCurve").is_none());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(KeyType::EllipticCurve.to_string(), "EC");
        assert_eq!(KeyUse::Encryption.to_string(), "enc");
        assert_eq!(KeyOperation::DeriveBits.as_str(), "deriveBits");
        assert_eq!(KeyType::parse("oct"), Some(KeyType::Symmetric));
        assert_eq!(KeyType::parse("OKP"), None);
    }
}
