//! # Native Crypto Provider
//!
//! The seam between the derivation logic and the primitives that actually
//! generate, import, export, sign, verify and agree on keys.
//!
//! ## Provider Contract
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       CRYPTO PROVIDER                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  generate_key(alg, extractable, usages) ──► NativeKey (single | pair)  │
//! │  import_key(jwk, alg, extractable, usages) ──► CryptoKey               │
//! │  export_key(key) ──► Jwk                                               │
//! │  sign(alg, key, data) ──► signature bytes                              │
//! │  verify(alg, key, signature, data) ──► bool                            │
//! │  derive_bits(alg, public, private, bits) ──► shared bits               │
//! │                                                                         │
//! │  Every call is async. Algorithms arrive already normalized             │
//! │  (P-256K → K-256).                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## RustCrypto Backend
//!
//! | Algorithm | Curves / sizes | Crate |
//! |-----------|----------------|-------|
//! | HMAC | SHA-256/384/512 | `hmac`, `sha2` |
//! | ECDSA / ECDH | K-256 | `k256` |
//! | ECDSA / ECDH | P-256 | `p256` |
//! | RSASSA-PKCS1-v1_5 | any modulus | `rsa` |
//! | RSA-OAEP | key handling only | `rsa` |

use std::sync::Arc;

use async_trait::async_trait;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::crypto::algorithm::{
    classify_key_type, classify_key_use, normalize_curve_name, Algorithm, KeyOperation, KeyType,
    CURVE_K256, CURVE_P256, RSA_PUBLIC_EXPONENT,
};
use crate::crypto::jwk::{encode_b64, pad_be, Jwk};
use crate::error::{Error, Result};

/// Size of an EC field element / scalar for both supported curves
const EC_FIELD_SIZE: usize = 32;

/// Modulus length used when an RSA descriptor omits one
const DEFAULT_GENERATED_RSA_BITS: usize = 2048;

/// Role tag of a native key handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Symmetric secret
    Secret,
    /// Private half of a key pair
    Private,
    /// Public half of a key pair
    Public,
}

/// Backend key storage
enum KeyInner {
    Hmac(Zeroizing<Vec<u8>>),
    K256Private(k256::SecretKey),
    K256Public(k256::PublicKey),
    P256Private(p256::SecretKey),
    P256Public(p256::PublicKey),
    RsaPrivate(RsaPrivateKey),
    RsaPublic(RsaPublicKey),
}

/// An opaque native key handle
///
/// Handles are immutable once created and cheap to clone.
#[derive(Clone)]
pub struct CryptoKey {
    kind: KeyKind,
    algorithm: Algorithm,
    extractable: bool,
    usages: Vec<KeyOperation>,
    inner: Arc<KeyInner>,
}

impl CryptoKey {
    fn new(
        kind: KeyKind,
        algorithm: &Algorithm,
        extractable: bool,
        usages: Vec<KeyOperation>,
        inner: KeyInner,
    ) -> Self {
        Self {
            kind,
            algorithm: algorithm.clone(),
            extractable,
            usages,
            inner: Arc::new(inner),
        }
    }

    /// Role tag (secret, private or public)
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Algorithm the handle was created for
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Whether secret material may leave the provider
    pub fn extractable(&self) -> bool {
        self.extractable
    }

    /// Permitted operations
    pub fn usages(&self) -> &[KeyOperation] {
        &self.usages
    }

    fn permits(&self, operation: KeyOperation) -> Result<()> {
        if self.usages.contains(&operation) {
            Ok(())
        } else {
            Err(Error::InvalidKey(format!(
                "Key usages {:?} do not permit '{}'",
                self.usages.iter().map(|u| u.as_str()).collect::<Vec<_>>(),
                operation.as_str()
            )))
        }
    }
}

impl std::fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoKey")
            .field("kind", &self.kind)
            .field("algorithm", &self.algorithm.name)
            .field("extractable", &self.extractable)
            .field("usages", &self.usages)
            .finish_non_exhaustive()
    }
}

/// A generated key pair
#[derive(Debug, Clone)]
pub struct CryptoKeyPair {
    /// Public half
    pub public_key: CryptoKey,
    /// Private half
    pub private_key: CryptoKey,
}

/// What a provider hands back: a single handle or a pair
#[derive(Debug, Clone)]
pub enum NativeKey {
    /// A secret, private-only or public-only handle
    Single(CryptoKey),
    /// A freshly generated key pair
    Pair(CryptoKeyPair),
}

/// Asynchronous native cryptographic primitives
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    /// Generate a new key (a pair for asymmetric algorithms)
    async fn generate_key(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyOperation],
    ) -> Result<NativeKey>;

    /// Import a key from its JWK form
    async fn import_key(
        &self,
        jwk: &Jwk,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyOperation],
    ) -> Result<CryptoKey>;

    /// Export a key to its JWK form
    async fn export_key(&self, key: &CryptoKey) -> Result<Jwk>;

    /// Sign data with a secret or private key
    async fn sign(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature with a secret or public key
    async fn verify(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool>;

    /// Derive `length` bits from a key agreement between `private` and `public`
    async fn derive_bits(
        &self,
        algorithm: &Algorithm,
        public: &CryptoKey,
        private: &CryptoKey,
        length: usize,
    ) -> Result<Vec<u8>>;
}

/// Provider backed by the RustCrypto crates
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    /// Create a provider
    pub fn new() -> Self {
        Self
    }

    /// Convenience for the common `Arc<dyn CryptoProvider>` form
    pub fn shared() -> Arc<dyn CryptoProvider> {
        Arc::new(Self)
    }
}

#[async_trait]
impl CryptoProvider for RustCryptoProvider {
    async fn generate_key(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyOperation],
    ) -> Result<NativeKey> {
        let key_type = classify_key_type(algorithm)?;
        tracing::debug!("Generating {} key for {}", key_type, algorithm.name);

        match key_type {
            KeyType::Symmetric => {
                let mut secret = Zeroizing::new(vec![0u8; hmac_block_size(algorithm)?]);
                OsRng.fill_bytes(&mut secret);
                Ok(NativeKey::Single(CryptoKey::new(
                    KeyKind::Secret,
                    algorithm,
                    extractable,
                    usages.to_vec(),
                    KeyInner::Hmac(secret),
                )))
            }
            KeyType::EllipticCurve => {
                let (private, public) = match curve_of(algorithm)? {
                    EcCurve::K256 => {
                        let secret = k256::SecretKey::random(&mut OsRng);
                        let public = secret.public_key();
                        (KeyInner::K256Private(secret), KeyInner::K256Public(public))
                    }
                    EcCurve::P256 => {
                        let secret = p256::SecretKey::random(&mut OsRng);
                        let public = secret.public_key();
                        (KeyInner::P256Private(secret), KeyInner::P256Public(public))
                    }
                };
                Ok(pair(algorithm, extractable, usages, private, public))
            }
            KeyType::Rsa => {
                check_public_exponent(algorithm)?;
                let bits = algorithm.modulus_length.unwrap_or(DEFAULT_GENERATED_RSA_BITS);
                let private = tokio::task::spawn_blocking(move || {
                    RsaPrivateKey::new(&mut OsRng, bits)
                })
                .await
                .map_err(|e| Error::Internal(format!("RSA generation task failed: {}", e)))?
                .map_err(|e| Error::generation("generate", e))?;
                let public = private.to_public_key();
                Ok(pair(
                    algorithm,
                    extractable,
                    usages,
                    KeyInner::RsaPrivate(private),
                    KeyInner::RsaPublic(public),
                ))
            }
        }
    }

    async fn import_key(
        &self,
        jwk: &Jwk,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyOperation],
    ) -> Result<CryptoKey> {
        let key_type = classify_key_type(algorithm)?;
        if jwk.key_type()? != key_type {
            return Err(Error::InvalidAlgorithm(format!(
                "JWK of type '{}' cannot be used with algorithm '{}'",
                jwk.kty, algorithm.name
            )));
        }

        let (kind, inner) = match key_type {
            KeyType::Symmetric => {
                let secret = Zeroizing::new(jwk.member("k")?);
                (KeyKind::Secret, KeyInner::Hmac(secret))
            }
            KeyType::EllipticCurve => import_ec(jwk, algorithm)?,
            KeyType::Rsa => import_rsa(jwk)?,
        };

        Ok(CryptoKey::new(kind, algorithm, extractable, usages.to_vec(), inner))
    }

    async fn export_key(&self, key: &CryptoKey) -> Result<Jwk> {
        if !key.extractable && key.kind != KeyKind::Public {
            return Err(Error::generation("export", "key is not extractable"));
        }

        let mut jwk = match key.inner.as_ref() {
            KeyInner::Hmac(secret) => Jwk::oct(secret, classify_key_use(&key.algorithm)?),
            KeyInner::K256Private(secret) => {
                let d = secret.to_bytes();
                let point = secret.public_key().to_encoded_point(false);
                ec_jwk(CURVE_K256, &point, Some(&d[..]))?
            }
            KeyInner::K256Public(public) => {
                ec_jwk(CURVE_K256, &public.to_encoded_point(false), None)?
            }
            KeyInner::P256Private(secret) => {
                let d = secret.to_bytes();
                p256_jwk(&secret.public_key().to_encoded_point(false), Some(&d[..]))?
            }
            KeyInner::P256Public(public) => p256_jwk(&public.to_encoded_point(false), None)?,
            KeyInner::RsaPrivate(private) => rsa_private_jwk(private)?,
            KeyInner::RsaPublic(public) => Jwk {
                kty: KeyType::Rsa.as_str().to_string(),
                n: Some(encode_b64(&public.n().to_bytes_be())),
                e: Some(encode_b64(&public.e().to_bytes_be())),
                ..Default::default()
            },
        };

        jwk.key_use = Some(classify_key_use(&key.algorithm)?.as_str().to_string());
        jwk.key_ops = Some(key.usages.clone());
        Ok(jwk)
    }

    async fn sign(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        key.permits(KeyOperation::Sign)?;
        let hash = algorithm.hash_name()?;

        match (algorithm.normalized_name().as_str(), key.inner.as_ref()) {
            ("hmac", KeyInner::Hmac(secret)) => match hash {
                "SHA-384" => hmac_tag::<Hmac<Sha384>>(secret, data),
                "SHA-512" => hmac_tag::<Hmac<Sha512>>(secret, data),
                _ => hmac_tag::<Hmac<Sha256>>(secret, data),
            },
            ("ecdsa", KeyInner::K256Private(secret)) => {
                use k256::ecdsa::signature::hazmat::PrehashSigner;
                let signing_key = k256::ecdsa::SigningKey::from(secret);
                let signature: k256::ecdsa::Signature = signing_key
                    .sign_prehash(&digest(hash, data))
                    .map_err(|e| Error::SigningFailed(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
            ("ecdsa", KeyInner::P256Private(secret)) => {
                use p256::ecdsa::signature::hazmat::PrehashSigner;
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(&digest(hash, data))
                    .map_err(|e| Error::SigningFailed(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
            ("rsassa-pkcs1-v1_5", KeyInner::RsaPrivate(private)) => private
                .sign(pkcs1v15_scheme(hash), &digest(hash, data))
                .map_err(|e| Error::SigningFailed(e.to_string())),
            (name, _) => Err(Error::SigningFailed(format!(
                "algorithm '{}' cannot sign with a {:?} {} key",
                name,
                key.kind,
                key.algorithm.name
            ))),
        }
    }

    async fn verify(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        key.permits(KeyOperation::Verify)?;
        let hash = algorithm.hash_name()?;

        let valid = match (algorithm.normalized_name().as_str(), key.inner.as_ref()) {
            ("hmac", KeyInner::Hmac(secret)) => match hash {
                "SHA-384" => hmac_check::<Hmac<Sha384>>(secret, data, signature)?,
                "SHA-512" => hmac_check::<Hmac<Sha512>>(secret, data, signature)?,
                _ => hmac_check::<Hmac<Sha256>>(secret, data, signature)?,
            },
            ("ecdsa", KeyInner::K256Public(public)) => k256_verify(public, hash, data, signature),
            ("ecdsa", KeyInner::K256Private(secret)) => {
                k256_verify(&secret.public_key(), hash, data, signature)
            }
            ("ecdsa", KeyInner::P256Public(public)) => p256_verify(public, hash, data, signature),
            ("ecdsa", KeyInner::P256Private(secret)) => {
                p256_verify(&secret.public_key(), hash, data, signature)
            }
            ("rsassa-pkcs1-v1_5", KeyInner::RsaPublic(public)) => public
                .verify(pkcs1v15_scheme(hash), &digest(hash, data), signature)
                .is_ok(),
            ("rsassa-pkcs1-v1_5", KeyInner::RsaPrivate(private)) => private
                .to_public_key()
                .verify(pkcs1v15_scheme(hash), &digest(hash, data), signature)
                .is_ok(),
            (name, _) => {
                return Err(Error::InvalidKey(format!(
                    "algorithm '{}' cannot verify with a {:?} {} key",
                    name, key.kind, key.algorithm.name
                )))
            }
        };

        Ok(valid)
    }

    async fn derive_bits(
        &self,
        algorithm: &Algorithm,
        public: &CryptoKey,
        private: &CryptoKey,
        length: usize,
    ) -> Result<Vec<u8>> {
        private.permits(KeyOperation::DeriveBits)?;
        if algorithm.normalized_name() != "ecdh" {
            return Err(Error::UnsupportedAlgorithm(algorithm.name.clone()));
        }
        if length == 0 || length % 8 != 0 || length > EC_FIELD_SIZE * 8 {
            return Err(Error::InvalidAlgorithm(format!(
                "Cannot derive {} bits from an ECDH agreement",
                length
            )));
        }

        let mut shared = match (private.inner.as_ref(), public.inner.as_ref()) {
            (KeyInner::K256Private(secret), KeyInner::K256Public(peer)) => {
                k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            }
            (KeyInner::P256Private(secret), KeyInner::P256Public(peer)) => {
                p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            }
            _ => {
                return Err(Error::InvalidKey(
                    "ECDH needs a private and a public key on the same curve".into(),
                ))
            }
        };

        shared.truncate(length / 8);
        Ok(shared)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

enum EcCurve {
    K256,
    P256,
}

fn curve_of(algorithm: &Algorithm) -> Result<EcCurve> {
    let curve = algorithm.named_curve.as_deref().ok_or_else(|| {
        Error::InvalidAlgorithm(format!("Missing namedCurve for '{}'", algorithm.name))
    })?;
    match normalize_curve_name(curve) {
        CURVE_K256 => Ok(EcCurve::K256),
        CURVE_P256 => Ok(EcCurve::P256),
        other => Err(Error::UnsupportedCurve(other.to_string())),
    }
}

/// Split WebCrypto usages between the halves of a generated pair
fn pair(
    algorithm: &Algorithm,
    extractable: bool,
    usages: &[KeyOperation],
    private: KeyInner,
    public: KeyInner,
) -> NativeKey {
    let (public_usages, private_usages): (Vec<_>, Vec<_>) =
        usages.iter().copied().partition(|usage| {
            matches!(
                usage,
                KeyOperation::Verify | KeyOperation::Encrypt | KeyOperation::WrapKey
            )
        });

    NativeKey::Pair(CryptoKeyPair {
        // public halves are always extractable
        public_key: CryptoKey::new(KeyKind::Public, algorithm, true, public_usages, public),
        private_key: CryptoKey::new(
            KeyKind::Private,
            algorithm,
            extractable,
            private_usages,
            private,
        ),
    })
}

fn hmac_block_size(algorithm: &Algorithm) -> Result<usize> {
    Ok(match algorithm.hash_name()? {
        "SHA-384" | "SHA-512" => 128,
        _ => 64,
    })
}

fn check_public_exponent(algorithm: &Algorithm) -> Result<()> {
    match algorithm.public_exponent.as_deref() {
        None => Ok(()),
        Some(exponent)
            if BigUint::from_bytes_be(exponent) == BigUint::from_bytes_be(&RSA_PUBLIC_EXPONENT) =>
        {
            Ok(())
        }
        Some(exponent) => Err(Error::InvalidAlgorithm(format!(
            "Only public exponent 65537 is supported, got 0x{}",
            hex::encode(exponent)
        ))),
    }
}

fn digest(hash: &str, data: &[u8]) -> Vec<u8> {
    match hash {
        "SHA-384" => Sha384::digest(data).to_vec(),
        "SHA-512" => Sha512::digest(data).to_vec(),
        _ => Sha256::digest(data).to_vec(),
    }
}

fn pkcs1v15_scheme(hash: &str) -> Pkcs1v15Sign {
    match hash {
        "SHA-384" => Pkcs1v15Sign::new::<Sha384>(),
        "SHA-512" => Pkcs1v15Sign::new::<Sha512>(),
        _ => Pkcs1v15Sign::new::<Sha256>(),
    }
}

fn hmac_tag<M: Mac + KeyInit>(secret: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(secret)
        .map_err(|e| Error::SigningFailed(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_check<M: Mac + KeyInit>(secret: &[u8], data: &[u8], tag: &[u8]) -> Result<bool> {
    let mut mac = <M as Mac>::new_from_slice(secret)
        .map_err(|e| Error::InvalidKey(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.verify_slice(tag).is_ok())
}

fn k256_verify(public: &k256::PublicKey, hash: &str, data: &[u8], signature: &[u8]) -> bool {
    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
        return false;
    };
    let point = public.to_encoded_point(false);
    let Ok(verifying_key) = k256::ecdsa::VerifyingKey::from_encoded_point(&point) else {
        return false;
    };
    verifying_key.verify_prehash(&digest(hash, data), &signature).is_ok()
}

fn p256_verify(public: &p256::PublicKey, hash: &str, data: &[u8], signature: &[u8]) -> bool {
    use p256::ecdsa::signature::hazmat::PrehashVerifier;
    let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
        return false;
    };
    let point = public.to_encoded_point(false);
    let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_encoded_point(&point) else {
        return false;
    };
    verifying_key.verify_prehash(&digest(hash, data), &signature).is_ok()
}

fn ec_jwk(crv: &str, point: &k256::EncodedPoint, d: Option<&[u8]>) -> Result<Jwk> {
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(Error::generation("export", "public point is the identity")),
    };
    Ok(Jwk::ec(crv, x, y, d))
}

fn p256_jwk(point: &p256::EncodedPoint, d: Option<&[u8]>) -> Result<Jwk> {
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(Error::generation("export", "public point is the identity")),
    };
    Ok(Jwk::ec(CURVE_P256, x, y, d))
}

/// Uncompressed SEC1 encoding of a JWK point
fn sec1_point(jwk: &Jwk) -> Result<Vec<u8>> {
    let x = pad_be(&jwk.member("x")?, EC_FIELD_SIZE)?;
    let y = pad_be(&jwk.member("y")?, EC_FIELD_SIZE)?;
    let mut point = Vec::with_capacity(1 + 2 * EC_FIELD_SIZE);
    point.push(0x04);
    point.extend_from_slice(&x);
    point.extend_from_slice(&y);
    Ok(point)
}

fn import_ec(jwk: &Jwk, algorithm: &Algorithm) -> Result<(KeyKind, KeyInner)> {
    let curve = curve_of(algorithm)?;
    if let Some(crv) = jwk.crv.as_deref() {
        let expected = algorithm.named_curve.as_deref().map(normalize_curve_name);
        if Some(normalize_curve_name(crv)) != expected {
            return Err(Error::InvalidAlgorithm(format!(
                "JWK curve '{}' does not match algorithm curve {:?}",
                crv, algorithm.named_curve
            )));
        }
    }

    let point = sec1_point(jwk)?;
    match curve {
        EcCurve::K256 => {
            let public = k256::PublicKey::from_sec1_bytes(&point)
                .map_err(|e| Error::generation("import", format!("invalid K-256 point: {}", e)))?;
            match jwk.d.as_ref() {
                Some(_) => {
                    let secret = k256::SecretKey::from_slice(&jwk.member("d")?).map_err(|e| {
                        Error::generation("import", format!("invalid K-256 scalar: {}", e))
                    })?;
                    if secret.public_key() != public {
                        return Err(Error::InvalidKey(
                            "EC private scalar does not match x/y".into(),
                        ));
                    }
                    Ok((KeyKind::Private, KeyInner::K256Private(secret)))
                }
                None => Ok((KeyKind::Public, KeyInner::K256Public(public))),
            }
        }
        EcCurve::P256 => {
            let public = p256::PublicKey::from_sec1_bytes(&point)
                .map_err(|e| Error::generation("import", format!("invalid P-256 point: {}", e)))?;
            match jwk.d.as_ref() {
                Some(_) => {
                    let secret = p256::SecretKey::from_slice(&jwk.member("d")?).map_err(|e| {
                        Error::generation("import", format!("invalid P-256 scalar: {}", e))
                    })?;
                    if secret.public_key() != public {
                        return Err(Error::InvalidKey(
                            "EC private scalar does not match x/y".into(),
                        ));
                    }
                    Ok((KeyKind::Private, KeyInner::P256Private(secret)))
                }
                None => Ok((KeyKind::Public, KeyInner::P256Public(public))),
            }
        }
    }
}

fn rsa_uint(jwk: &Jwk, member: &str) -> Result<rsa::BigUint> {
    Ok(rsa::BigUint::from_bytes_be(&jwk.member(member)?))
}

fn import_rsa(jwk: &Jwk) -> Result<(KeyKind, KeyInner)> {
    let n = rsa_uint(jwk, "n")?;
    let e = rsa_uint(jwk, "e")?;

    if jwk.d.is_none() {
        let public = RsaPublicKey::new(n, e).map_err(|err| Error::generation("import", err))?;
        return Ok((KeyKind::Public, KeyInner::RsaPublic(public)));
    }

    let d = rsa_uint(jwk, "d")?;
    let primes = vec![rsa_uint(jwk, "p")?, rsa_uint(jwk, "q")?];
    let private = RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|err| Error::generation("import", err))?;
    private.validate().map_err(|err| Error::generation("import", err))?;
    Ok((KeyKind::Private, KeyInner::RsaPrivate(private)))
}

fn rsa_private_jwk(private: &RsaPrivateKey) -> Result<Jwk> {
    let primes = private.primes();
    if primes.len() != 2 {
        return Err(Error::generation(
            "export",
            format!("expected two RSA primes, found {}", primes.len()),
        ));
    }

    let to_num = |value: &rsa::BigUint| BigUint::from_bytes_be(&value.to_bytes_be());
    let d = to_num(private.d());
    let p = to_num(&primes[0]);
    let q = to_num(&primes[1]);
    let crt = CrtParameters::compute(&d, &p, &q)?;

    Ok(Jwk {
        kty: KeyType::Rsa.as_str().to_string(),
        n: Some(encode_b64(&private.n().to_bytes_be())),
        e: Some(encode_b64(&private.e().to_bytes_be())),
        d: Some(encode_b64(&d.to_bytes_be())),
        p: Some(encode_b64(&p.to_bytes_be())),
        q: Some(encode_b64(&q.to_bytes_be())),
        dp: Some(encode_b64(&crt.dp.to_bytes_be())),
        dq: Some(encode_b64(&crt.dq.to_bytes_be())),
        qi: Some(encode_b64(&crt.qi.to_bytes_be())),
        ..Default::default()
    })
}

/// RSA Chinese-Remainder-Theorem parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrtParameters {
    /// `d mod (p-1)`
    pub dp: BigUint,
    /// `d mod (q-1)`
    pub dq: BigUint,
    /// `q^-1 mod p`
    pub qi: BigUint,
}

impl CrtParameters {
    /// Compute the CRT parameters for private exponent `d` and primes `p`, `q`
    pub fn compute(d: &BigUint, p: &BigUint, q: &BigUint) -> Result<Self> {
        let one = BigUint::one();
        if p <= &one || q <= &one {
            return Err(Error::generation("crt", "primes must be greater than one"));
        }
        let qi = q
            .modinv(p)
            .ok_or_else(|| Error::generation("crt", "q is not invertible modulo p"))?;
        Ok(Self {
            dp: d % (p - &one),
            dq: d % (q - &one),
            qi,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
