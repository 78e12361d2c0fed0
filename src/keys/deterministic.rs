//! # Deterministic Key
//!
//! A key that is either generated, imported from raw bytes, or imported from
//! a JWK, materialized lazily and at most once, and able to derive pairwise
//! keys for relationships under any DID it manages.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DETERMINISTIC KEY LIFECYCLE                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  new(provider, algorithm, raw, exportable)                             │
//! │     │   classify key type / key use, normalize curve                   │
//! │     ▼                                                                   │
//! │  Uninitialized                                                          │
//! │     │   first sign / verify / export                                   │
//! │     ▼                                                                   │
//! │  Materializing ──► raw = None   : provider.generate_key                │
//! │     │              raw = Bytes  : provider.import_key (oct)            │
//! │     │              raw = Jwk    : provider.import_key                  │
//! │     ▼                                                                   │
//! │  Materialized  ──► handles cached by KeyIdentifier                     │
//! │                    exports cached by KeyIdentifier on demand           │
//! │                                                                         │
//! │  There is no way back to Uninitialized.                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pairwise Derivation
//!
//! ```text
//! generate_pairwise(seed, did, peer)
//!     │
//!     ├──► derive_master_key(seed, did)   HMAC-SHA512, cached per DID
//!     │
//!     └──► PairwiseKey(did, peer).generate(master, ...)
//!              EC  : HMAC-SHA256 scalar mod n
//!              RSA : chained HMAC-SHA512 prime search
//!
//! Same (did, peer) on the same root key ──► the same Arc
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

use crate::crypto::{
    classify_key_type, classify_key_use, normalize_algorithm, Algorithm, CryptoKey, CryptoProvider,
    Jwk, KeyExport, KeyOperation, KeyType, KeyUse, NativeKey,
};
use crate::error::{Error, Result};
use crate::keys::cache::{MasterKey, PairwiseCacheKey, RelationshipKeyCache};
use crate::keys::material::KeyMaterial;
use crate::pairwise::PairwiseKey;
use crate::DerivationConfig;

/// Key input supplied at construction
pub enum RawKey {
    /// Raw secret bytes for a symmetric key
    Bytes(Zeroizing<Vec<u8>>),
    /// A JWK of the algorithm's key type
    Jwk(Jwk),
}

impl RawKey {
    /// Raw secret bytes
    pub fn bytes(secret: impl Into<Vec<u8>>) -> Self {
        RawKey::Bytes(Zeroizing::new(secret.into()))
    }
}

impl std::fmt::Debug for RawKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawKey::Bytes(_) => write!(f, "RawKey::Bytes([REDACTED])"),
            RawKey::Jwk(jwk) => f.debug_tuple("RawKey::Jwk").field(jwk).finish(),
        }
    }
}

/// Identifies a cached handle or export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyIdentifier {
    /// Key type
    pub key_type: KeyType,
    /// Key use
    pub key_use: KeyUse,
    /// Which half
    pub export: KeyExport,
}

impl std::fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.key_type, self.key_use, self.export)
    }
}

/// Operations a key of `key_type` may perform for `key_use`
pub fn key_operations_for(key_type: KeyType, key_use: KeyUse) -> Vec<KeyOperation> {
    match key_use {
        KeyUse::Encryption if key_type.is_public_key_crypto() => {
            vec![KeyOperation::DeriveKey, KeyOperation::DeriveBits]
        }
        KeyUse::Encryption => vec![KeyOperation::Encrypt, KeyOperation::Decrypt],
        KeyUse::Signature => vec![KeyOperation::Sign, KeyOperation::Verify],
    }
}

/// A lazily materialized key with pairwise derivation
pub struct DeterministicKey {
    provider: Arc<dyn CryptoProvider>,
    algorithm: Algorithm,
    native_algorithm: Algorithm,
    key_type: KeyType,
    key_use: KeyUse,
    exportable: bool,
    raw: Option<RawKey>,
    config: DerivationConfig,
    material: OnceCell<KeyMaterial>,
    handles: Mutex<HashMap<KeyIdentifier, CryptoKey>>,
    exports: Mutex<HashMap<KeyIdentifier, Jwk>>,
    relationships: RelationshipKeyCache,
}

impl DeterministicKey {
    /// Create a key with the default configuration
    ///
    /// `raw = None` generates a fresh key on first use.
    pub fn new(
        provider: Arc<dyn CryptoProvider>,
        algorithm: Algorithm,
        raw: Option<RawKey>,
        exportable: bool,
    ) -> Result<Self> {
        Self::with_config(provider, algorithm, raw, exportable, DerivationConfig::default())
    }

    /// Create a key with an explicit configuration
    pub fn with_config(
        provider: Arc<dyn CryptoProvider>,
        mut algorithm: Algorithm,
        raw: Option<RawKey>,
        exportable: bool,
        config: DerivationConfig,
    ) -> Result<Self> {
        if algorithm.name.trim().is_empty() {
            return Err(Error::InvalidAlgorithm("Algorithm name is required".into()));
        }

        let key_type = classify_key_type(&algorithm)?;
        let key_use = classify_key_use(&algorithm)?;

        match &raw {
            Some(RawKey::Bytes(_)) if key_type != KeyType::Symmetric => {
                return Err(Error::InvalidKey(format!(
                    "Raw bytes cannot seed a key of type '{}'",
                    key_type
                )));
            }
            Some(RawKey::Jwk(jwk)) => {
                if jwk.key_type()? != key_type {
                    return Err(Error::InvalidAlgorithm(format!(
                        "JWK of type '{}' cannot be used with algorithm '{}'",
                        jwk.kty, algorithm.name
                    )));
                }
                if algorithm.named_curve.is_none() {
                    algorithm.named_curve = jwk.crv.clone();
                }
            }
            _ => {}
        }

        let native_algorithm = normalize_algorithm(&algorithm);

        tracing::debug!(
            "Created {} {} key for {} (exportable: {})",
            key_type,
            key_use,
            algorithm.name,
            exportable
        );

        Ok(Self {
            provider,
            algorithm,
            native_algorithm,
            key_type,
            key_use,
            exportable,
            raw,
            config,
            material: OnceCell::new(),
            handles: Mutex::new(HashMap::new()),
            exports: Mutex::new(HashMap::new()),
            relationships: RelationshipKeyCache::new(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Algorithm as supplied by the caller
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Key type
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Key use
    pub fn key_use(&self) -> KeyUse {
        self.key_use
    }

    /// Whether secret material may be exported
    pub fn exportable(&self) -> bool {
        self.exportable
    }

    /// Configuration
    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    /// Master-key and pairwise-key caches
    pub fn relationships(&self) -> &RelationshipKeyCache {
        &self.relationships
    }

    /// Whether the native key has been generated or imported
    pub fn is_materialized(&self) -> bool {
        self.material.initialized()
    }

    /// Cache identifier for an export form of this key
    pub fn identifier(&self, export: KeyExport) -> KeyIdentifier {
        KeyIdentifier {
            key_type: self.key_type,
            key_use: self.key_use,
            export,
        }
    }

    /// Operations this key may perform for `key_use`
    pub fn key_operations(&self, key_use: KeyUse) -> Vec<KeyOperation> {
        key_operations_for(self.key_type, key_use)
    }

    fn private_form(&self) -> KeyExport {
        match self.key_type {
            KeyType::Symmetric => KeyExport::Secret,
            KeyType::EllipticCurve | KeyType::Rsa => KeyExport::Private,
        }
    }

    fn public_form(&self) -> KeyExport {
        match self.key_type {
            KeyType::Symmetric => KeyExport::Secret,
            KeyType::EllipticCurve | KeyType::Rsa => KeyExport::Public,
        }
    }

    fn public_usages(&self) -> Vec<KeyOperation> {
        self.key_operations(self.key_use)
            .into_iter()
            .filter(|op| {
                matches!(
                    op,
                    KeyOperation::Verify | KeyOperation::Encrypt | KeyOperation::WrapKey
                )
            })
            .collect()
    }

    fn cached_handle(&self, export: KeyExport) -> Option<CryptoKey> {
        self.handles.lock().get(&self.identifier(export)).cloned()
    }

    // ========================================================================
    // MATERIALIZATION
    // ========================================================================

    /// Generate or import the native key, once
    pub async fn materialize(&self) -> Result<&KeyMaterial> {
        self.material
            .get_or_try_init(|| async {
                let usages = self.key_operations(self.key_use);
                let algorithm = &self.native_algorithm;

                let native = match &self.raw {
                    None => {
                        tracing::debug!("Generating {} key for {}", self.key_type, algorithm.name);
                        self.provider
                            .generate_key(algorithm, self.exportable, &usages)
                            .await?
                    }
                    Some(RawKey::Bytes(secret)) => {
                        let jwk = Jwk::oct(secret, self.key_use);
                        NativeKey::Single(
                            self.provider
                                .import_key(&jwk, algorithm, self.exportable, &usages)
                                .await?,
                        )
                    }
                    Some(RawKey::Jwk(jwk)) => NativeKey::Single(
                        self.provider
                            .import_key(&jwk.normalized(), algorithm, self.exportable, &usages)
                            .await?,
                    ),
                };

                let material = KeyMaterial::new(self.key_type, native)?;
                self.register_handles(&material);
                Ok(material)
            })
            .await
    }

    fn register_handles(&self, material: &KeyMaterial) {
        let mut handles = self.handles.lock();
        let halves = [
            (KeyExport::Secret, material.secret_key()),
            (KeyExport::Private, material.private_key()),
            (KeyExport::Public, material.public_key()),
        ];
        for (export, handle) in halves {
            if let Some(handle) = handle {
                handles.insert(self.identifier(export), handle.clone());
            }
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Export one half of the key as a JWK
    ///
    /// A private export also caches the matching public export and its native
    /// handle, so a later verify does not touch the private key again.
    pub async fn get_exported_key(&self, export: KeyExport) -> Result<Jwk> {
        let id = self.identifier(export);
        let cached = self.exports.lock().get(&id).cloned();
        if let Some(jwk) = cached {
            return Ok(jwk);
        }

        match (self.key_type, export) {
            (KeyType::Symmetric, KeyExport::Secret)
            | (KeyType::EllipticCurve | KeyType::Rsa, KeyExport::Private | KeyExport::Public) => {}
            _ => return Err(Error::UnsupportedKeyType(id.to_string())),
        }

        self.materialize().await?;

        let mut jwk = match self.cached_handle(export) {
            Some(handle) => self.provider.export_key(&handle).await?,
            None if export == KeyExport::Public => self.public_from_private().await?,
            None => return Err(Error::MissingKeyMaterial(id.to_string())),
        };
        self.present(&mut jwk);

        if export == KeyExport::Private {
            self.cache_public_half(&jwk).await?;
        }

        self.exports.lock().insert(id, jwk.clone());
        Ok(jwk)
    }

    /// Public JWK for the identity document layer
    pub async fn public_jwk(&self) -> Result<Jwk> {
        if !self.key_type.is_public_key_crypto() {
            return Err(Error::UnsupportedKeyType(self.identifier(KeyExport::Public).to_string()));
        }
        self.get_exported_key(KeyExport::Public).await
    }

    /// Caller-facing curve name and key use
    fn present(&self, jwk: &mut Jwk) {
        if self.key_type == KeyType::EllipticCurve {
            if let Some(curve) = self.algorithm.named_curve.as_ref() {
                jwk.crv = Some(curve.clone());
            }
        }
        jwk.key_use = Some(self.key_use.as_str().to_string());
    }

    /// Public export of a private-only key
    async fn public_from_private(&self) -> Result<Jwk> {
        let mut public = match &self.raw {
            Some(RawKey::Jwk(jwk)) => jwk.to_public(),
            _ => {
                let private = self.cached_handle(KeyExport::Private).ok_or_else(|| {
                    Error::MissingKeyMaterial(self.identifier(KeyExport::Private).to_string())
                })?;
                self.provider.export_key(&private).await?.to_public()
            }
        };
        public.key_ops = Some(self.public_usages());

        let handle = self.import_public(&public).await?;
        self.handles
            .lock()
            .entry(self.identifier(KeyExport::Public))
            .or_insert(handle);
        Ok(public)
    }

    async fn cache_public_half(&self, private: &Jwk) -> Result<()> {
        let mut public = private.to_public();
        public.key_ops = Some(self.public_usages());

        if self.cached_handle(KeyExport::Public).is_none() {
            let handle = self.import_public(&public).await?;
            self.handles
                .lock()
                .entry(self.identifier(KeyExport::Public))
                .or_insert(handle);
        }

        self.exports
            .lock()
            .entry(self.identifier(KeyExport::Public))
            .or_insert(public);
        Ok(())
    }

    async fn import_public(&self, public: &Jwk) -> Result<CryptoKey> {
        self.provider
            .import_key(&public.normalized(), &self.native_algorithm, true, &self.public_usages())
            .await
    }

    // ========================================================================
    // SIGN / VERIFY / AGREE
    // ========================================================================

    /// Sign `data` with the private or secret key
    pub async fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let id = self.identifier(self.private_form());
        self.materialize().await?;

        let handle = self
            .cached_handle(id.export)
            .ok_or_else(|| Error::MissingKeyMaterial(id.to_string()))?;
        self.provider.sign(&self.native_algorithm, &handle, data).await
    }

    /// Verify `signature` over `data` with the public or secret key
    pub async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let export = self.public_form();

        let handle = if self.key_type == KeyType::Symmetric && !self.exportable {
            // a non-exportable secret verifies with its own handle
            self.materialize().await?;
            self.cached_handle(export)
                .ok_or_else(|| Error::MissingKeyMaterial(self.identifier(export).to_string()))?
        } else {
            let jwk = self.get_exported_key(export).await?;
            self.provider
                .import_key(
                    &jwk.normalized(),
                    &self.native_algorithm,
                    true,
                    &[KeyOperation::Verify],
                )
                .await?
        };

        self.provider
            .verify(&self.native_algorithm, &handle, signature, data)
            .await
    }

    /// Key agreement with `peer`'s public key, truncated to `length` bits
    pub async fn derive_bits(&self, peer: &DeterministicKey, length: usize) -> Result<Vec<u8>> {
        if self.key_type != KeyType::EllipticCurve || self.key_use != KeyUse::Encryption {
            return Err(Error::InvalidAlgorithm(format!(
                "Key agreement needs an ECDH key, not '{}'",
                self.algorithm.name
            )));
        }

        let id = self.identifier(KeyExport::Private);
        self.materialize().await?;
        let private = self
            .cached_handle(KeyExport::Private)
            .ok_or_else(|| Error::MissingKeyMaterial(id.to_string()))?;

        let peer_jwk = peer.get_exported_key(KeyExport::Public).await?;
        let peer_public = self
            .provider
            .import_key(&peer_jwk.normalized(), &self.native_algorithm, true, &[])
            .await?;

        self.provider
            .derive_bits(&self.native_algorithm, &peer_public, &private, length)
            .await
    }

    // ========================================================================
    // PAIRWISE
    // ========================================================================

    /// Master key for `did`: HMAC-SHA512 over the DID, keyed by `seed`
    ///
    /// Cached per DID on this key. A root key serves one seed.
    pub async fn derive_master_key(&self, seed: &[u8], did: &str) -> Result<Arc<MasterKey>> {
        self.relationships
            .master_key(did, || async {
                let hmac = DeterministicKey::with_config(
                    self.provider.clone(),
                    Algorithm::hmac("SHA-512"),
                    Some(RawKey::bytes(seed)),
                    false,
                    self.config.clone(),
                )?;
                let master = hmac.sign(did.as_bytes()).await?;
                tracing::debug!("Derived master key for {}", did);
                Ok(Arc::new(Zeroizing::new(master)))
            })
            .await
    }

    /// Pairwise key for the relationship between `did` and `peer_id`
    ///
    /// Repeat calls with the same inputs return the same `Arc`, and
    /// concurrent calls run the derivation once.
    pub async fn generate_pairwise(
        &self,
        seed: &[u8],
        did: &str,
        peer_id: &str,
    ) -> Result<Arc<DeterministicKey>> {
        let cache_key =
            PairwiseCacheKey::new(self.config.pairwise_cache_scope, self.key_type, did, peer_id);

        self.relationships
            .pairwise_key(cache_key, || async {
                let master = self.derive_master_key(seed, did).await?;
                let pairwise = PairwiseKey::new(did, peer_id);

                let key = pairwise
                    .generate(
                        &master,
                        self.provider.clone(),
                        &self.algorithm,
                        self.key_type,
                        self.key_use,
                        self.exportable,
                        &self.config,
                    )
                    .await?;

                if key.exportable() {
                    key.get_exported_key(KeyExport::Private).await?;
                } else {
                    key.materialize().await?;
                }

                tracing::info!("Derived pairwise {} key {}", self.key_type, pairwise.id());
                Ok(Arc::new(key))
            })
            .await
    }
}

impl std::fmt::Debug for DeterministicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicKey")
            .field("algorithm", &self.algorithm.name)
            .field("key_type", &self.key_type)
            .field("key_use", &self.key_use)
            .field("exportable", &self.exportable)
            .field("materialized", &self.is_materialized())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RustCryptoProvider;

    fn provider() -> Arc<dyn CryptoProvider> {
        RustCryptoProvider::shared()
    }

    fn ecdsa_key(curve: &str) -> DeterministicKey {
        DeterministicKey::new(provider(), Algorithm::ecdsa(curve, "SHA-256"), None, true).unwrap()
    }

    fn ecdh_key(curve: &str) -> DeterministicKey {
        DeterministicKey::new(provider(), Algorithm::ecdh(curve), None, true).unwrap()
    }

    fn hmac_key(secret: &[u8], exportable: bool) -> DeterministicKey {
        DeterministicKey::new(
            provider(),
            Algorithm::hmac("SHA-256"),
            Some(RawKey::bytes(secret)),
            exportable,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_algorithm_name() {
        let result = DeterministicKey::new(provider(), Algorithm::named(""), None, true);
        assert!(matches!(result, Err(Error::InvalidAlgorithm(_))));
    }

    #[test]
    fn test_unsupported_algorithm_name() {
        let err =
            DeterministicKey::new(provider(), Algorithm::named("xxx"), None, true).unwrap_err();
        assert_eq!(err.to_string(), "The algorithm 'xxx' is not supported");
    }

    #[test]
    fn test_raw_bytes_need_symmetric_algorithm() {
        let result = DeterministicKey::new(
            provider(),
            Algorithm::ecdsa("K-256", "SHA-256"),
            Some(RawKey::bytes(vec![1u8; 32])),
            true,
        );
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_key_operations() {
        let ec = ecdh_key("P-256K");
        assert_eq!(
            ec.key_operations(KeyUse::Encryption),
            vec![KeyOperation::DeriveKey, KeyOperation::DeriveBits]
        );
        assert_eq!(
            ec.key_operations(KeyUse::Signature),
            vec![KeyOperation::Sign, KeyOperation::Verify]
        );

        let oct = hmac_key(b"secret", true);
        assert_eq!(
            oct.key_operations(KeyUse::Encryption),
            vec![KeyOperation::Encrypt, KeyOperation::Decrypt]
        );
    }

    #[test]
    fn test_key_identifier_display() {
        let id = KeyIdentifier {
            key_type: KeyType::EllipticCurve,
            key_use: KeyUse::Signature,
            export: KeyExport::Private,
        };
        assert_eq!(id.to_string(), "EC-sig-private");
    }

    #[tokio::test]
    async fn test_hmac_sign_and_verify() {
        let key = hmac_key(b"1234567890", true);

        let tag = key.sign(b"abcdefghij").await.unwrap();
        assert_eq!(
            hex::encode(&tag),
            "22fb2485712345f6ce6913e09f19245a0a9d499465763566a92e7f10630eaf20"
        );
        assert!(key.verify(b"abcdefghij", &tag).await.unwrap());
        assert!(!key.verify(b"abcdefghiJ", &tag).await.unwrap());
    }

    #[tokio::test]
    async fn test_hmac_non_exportable_still_verifies() {
        let key = hmac_key(b"1234567890", false);

        let tag = key.sign(b"data").await.unwrap();
        assert!(key.verify(b"data", &tag).await.unwrap());
        assert!(key.get_exported_key(KeyExport::Secret).await.is_err());
    }

    #[tokio::test]
    async fn test_symmetric_public_export_unsupported() {
        let key = hmac_key(b"secret", true);
        let result = key.get_exported_key(KeyExport::Public).await;

        assert!(matches!(result, Err(Error::UnsupportedKeyType(_))));
        assert!(matches!(key.public_jwk().await, Err(Error::UnsupportedKeyType(_))));
    }

    #[tokio::test]
    async fn test_generated_ec_key_materializes_once() {
        let key = ecdsa_key("P-256K");
        assert!(!key.is_materialized());

        let private = key.get_exported_key(KeyExport::Private).await.unwrap();
        assert!(key.is_materialized());
        let public = key.get_exported_key(KeyExport::Public).await.unwrap();

        assert_eq!(private.crv.as_deref(), Some("P-256K"));
        assert_eq!(public.crv.as_deref(), Some("P-256K"));
        assert_eq!(private.x, public.x);
        assert_eq!(private.y, public.y);
        assert!(public.d.is_none());
        assert_eq!(public.key_ops, Some(vec![KeyOperation::Verify]));

        let again = key.get_exported_key(KeyExport::Private).await.unwrap();
        assert_eq!(again, private);
    }

    #[tokio::test]
    async fn test_generated_ec_sign_verify() {
        let key = ecdsa_key("K-256");

        let signature = key.sign(b"message").await.unwrap();
        assert!(key.verify(b"message", &signature).await.unwrap());
        assert!(!key.verify(b"other", &signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_public_only_key_cannot_sign() {
        let signer = ecdsa_key("K-256");
        let public = signer.get_exported_key(KeyExport::Public).await.unwrap();

        let verifier = DeterministicKey::new(
            provider(),
            Algorithm::ecdsa("K-256", "SHA-256"),
            Some(RawKey::Jwk(public)),
            true,
        )
        .unwrap();

        let signature = signer.sign(b"message").await.unwrap();
        assert!(verifier.verify(b"message", &signature).await.unwrap());

        let err = verifier.sign(b"message").await.unwrap_err();
        assert!(matches!(err, Error::MissingKeyMaterial(_)));
        assert_eq!(
            err.to_string(),
            "A private key with id of 'EC-sig-private' required to validate the signature \
             cannot be found."
        );
    }

    #[tokio::test]
    async fn test_private_only_key_serves_public_export() {
        let source = ecdsa_key("K-256");
        let private_jwk = source.get_exported_key(KeyExport::Private).await.unwrap();

        let imported = DeterministicKey::new(
            provider(),
            Algorithm::ecdsa("K-256", "SHA-256"),
            Some(RawKey::Jwk(private_jwk.clone())),
            false,
        )
        .unwrap();

        let public = imported.get_exported_key(KeyExport::Public).await.unwrap();
        assert!(public.d.is_none());
        assert_eq!(public.x, private_jwk.x);

        let signature = imported.sign(b"message").await.unwrap();
        assert!(imported.verify(b"message", &signature).await.unwrap());
        assert!(imported.materialize().await.unwrap().is_private_key());
    }

    #[tokio::test]
    async fn test_master_key_reference_vector() {
        let seed: &[u8] = b"xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvN\
            KmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
        let root = ecdsa_key("P-256K");

        let master = root.derive_master_key(seed, "did:test").await.unwrap();
        assert_eq!(master.len(), crate::crypto::MASTER_KEY_SIZE);
        assert_eq!(
            hex::encode(master.as_slice()),
            "f8927df0dac7d0de8f0c2e247e5970b8c7b9333dc4359bbcfde4f4da7d1702d6\
             ccf30760145e239958520008a2058d33a4c84ab76f9aea6d3d46d9e25e4e4581"
        );

        let again = root.derive_master_key(seed, "did:test").await.unwrap();
        assert!(Arc::ptr_eq(&master, &again));
        assert_eq!(root.relationships().master_key_count(), 1);
    }

    #[tokio::test]
    async fn test_ecdh_derive_bits() {
        let alice = ecdh_key("P-256K");
        let bob = ecdh_key("P-256K");

        let ab = alice.derive_bits(&bob, 256).await.unwrap();
        let ba = bob.derive_bits(&alice, 256).await.unwrap();

        assert_eq!(ab.len(), 32);
        assert_eq!(ab, ba);
    }

    #[tokio::test]
    async fn test_derive_bits_needs_ecdh() {
        let signer = ecdsa_key("K-256");
        let other = ecdh_key("K-256");

        assert!(matches!(
            signer.derive_bits(&other, 256).await,
            Err(Error::InvalidAlgorithm(_))
        ));
    }
}
