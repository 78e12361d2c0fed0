//! # Key Material
//!
//! Classification of a native key handle by the key type it was created for.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      NATIVE HANDLE → KEY MATERIAL                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Symmetric     Single(secret)   ──► secret_key                         │
//! │                                                                         │
//! │  EC / RSA      Pair(pub, priv)  ──► public_key + private_key           │
//! │                Single(private)  ──► private_key   (is_private_key)     │
//! │                Single(public)   ──► public_key                         │
//! │                anything else    ──► MalformedKeyObject                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::crypto::{CryptoKey, KeyKind, KeyType, NativeKey};
use crate::error::{Error, Result};

/// A classified native key
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    key_type: KeyType,
    secret_key: Option<CryptoKey>,
    public_key: Option<CryptoKey>,
    private_key: Option<CryptoKey>,
}

impl KeyMaterial {
    /// Classify a native handle
    pub fn new(key_type: KeyType, native: NativeKey) -> Result<Self> {
        let mut material = Self {
            key_type,
            secret_key: None,
            public_key: None,
            private_key: None,
        };

        match (key_type, native) {
            (KeyType::Symmetric, NativeKey::Single(key)) => material.secret_key = Some(key),
            (KeyType::Symmetric, NativeKey::Pair(_)) => {
                return Err(Error::MalformedKeyObject(key_type.to_string()))
            }
            (_, NativeKey::Pair(pair)) => {
                material.public_key = Some(pair.public_key);
                material.private_key = Some(pair.private_key);
            }
            (_, NativeKey::Single(key)) => match key.kind() {
                KeyKind::Private => material.private_key = Some(key),
                KeyKind::Public => material.public_key = Some(key),
                KeyKind::Secret => return Err(Error::MalformedKeyObject(key_type.to_string())),
            },
        }

        Ok(material)
    }

    /// Key type the material was classified as
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Symmetric secret handle
    pub fn secret_key(&self) -> Option<&CryptoKey> {
        self.secret_key.as_ref()
    }

    /// Public handle
    pub fn public_key(&self) -> Option<&CryptoKey> {
        self.public_key.as_ref()
    }

    /// Private handle
    pub fn private_key(&self) -> Option<&CryptoKey> {
        self.private_key.as_ref()
    }

    /// True for elliptic-curve and RSA material
    pub fn is_public_key_crypto(&self) -> bool {
        self.key_type.is_public_key_crypto()
    }

    /// True when both halves are present
    pub fn is_key_pair(&self) -> bool {
        self.public_key.is_some() && self.private_key.is_some()
    }

    /// True for an imported private-only key
    pub fn is_private_key(&self) -> bool {
        self.private_key.is_some() && self.public_key.is_none()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Algorithm, CryptoProvider, Jwk, KeyOperation, KeyUse, RustCryptoProvider};

    async fn hmac_key() -> CryptoKey {
        RustCryptoProvider::new()
            .import_key(
                &Jwk::oct(b"secret", KeyUse::Signature),
                &Algorithm::hmac("SHA-256"),
                true,
                &[KeyOperation::Sign, KeyOperation::Verify],
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_symmetric_material() {
        let native = NativeKey::Single(hmac_key().await);
        let material = KeyMaterial::new(KeyType::Symmetric, native).unwrap();

        assert!(material.secret_key().is_some());
        assert!(!material.is_key_pair());
        assert!(!material.is_private_key());
        assert!(!material.is_public_key_crypto());
    }

    #[tokio::test]
    async fn test_pair_material() {
        let native = RustCryptoProvider::new()
            .generate_key(
                &Algorithm::ecdsa("K-256", "SHA-256"),
                true,
                &[KeyOperation::Sign, KeyOperation::Verify],
            )
            .await
            .unwrap();
        let material = KeyMaterial::new(KeyType::EllipticCurve, native).unwrap();

        assert!(material.is_key_pair());
        assert!(!material.is_private_key());
        assert!(material.is_public_key_crypto());
        assert!(material.secret_key().is_none());
    }

    #[tokio::test]
    async fn test_private_only_material() {
        let provider = RustCryptoProvider::new();
        let alg = Algorithm::ecdsa("K-256", "SHA-256");
        let usages = [KeyOperation::Sign, KeyOperation::Verify];
        let NativeKey::Pair(pair) = provider.generate_key(&alg, true, &usages).await.unwrap() else {
            panic!("expected a key pair");
        };
        let jwk = provider.export_key(&pair.private_key).await.unwrap();
        let private = provider.import_key(&jwk, &alg, true, &usages).await.unwrap();

        let material =
            KeyMaterial::new(KeyType::EllipticCurve, NativeKey::Single(private)).unwrap();

        assert!(material.is_private_key());
        assert!(!material.is_key_pair());
        assert!(material.public_key().is_none());
    }

    #[tokio::test]
    async fn test_untagged_asymmetric_handle_is_malformed() {
        let result = KeyMaterial::new(KeyType::Rsa, NativeKey::Single(hmac_key().await));

        match result {
            Err(Error::MalformedKeyObject(kty)) => assert_eq!(kty, "RSA"),
            other => panic!("expected MalformedKeyObject, got {:?}", other),
        }
    }
}
