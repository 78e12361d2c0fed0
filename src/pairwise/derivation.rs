//! # Pairwise Derivation
//!
//! Deterministic key material for one (DID, peer) relationship, computed
//! from the DID's master key.
//!
//! ## Elliptic Curve Branch
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      EC PAIRWISE KEY (secp256k1)                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  s = HMAC-SHA256(key = master, data = utf8(peer_id))                   │
//! │  d = big-endian(s) mod n                 n = secp256k1 group order     │
//! │  Q = d · G                                                             │
//! │                                                                         │
//! │  JWK { kty: EC, crv, x: Q.x, y: Q.y, d }  32-byte big-endian fields    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## RSA Branch
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      RSA PAIRWISE KEY                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  p_base = number_for_prime(bits/2, seed = master, ctx = peer_id)       │
//! │  q_base = number_for_prime(bits/2, seed = p_base, ctx = peer_id)       │
//! │                                                                         │
//! │  number_for_prime(bits, seed, ctx):                                    │
//! │      acc = []                                                          │
//! │      for round in 0 .. bits/512:                                       │
//! │          key  = seed if round == 0 else acc                            │
//! │          acc ||= HMAC-SHA512(key, ctx)                                 │
//! │                                                                         │
//! │  p, q = nearest_probable_prime(p_base), nearest_probable_prime(q_base) │
//! │  n = p·q   e = 65537   d = e^-1 mod (p-1)(q-1)   dp, dq, qi            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both branches depend only on the master key and the peer identifier.
//! Nothing here is random.

use std::sync::Arc;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::crypto::{
    encode_b64, is_secp256k1_alias, Algorithm, CrtParameters, CryptoProvider, Jwk, KeyType,
    KeyUse, EC_KEY_SIZE, RSA_PUBLIC_EXPONENT,
};
use crate::error::{Error, Result};
use crate::keys::{DeterministicKey, RawKey};
use crate::pairwise::prime::{nearest_probable_prime_with_rounds, ProbablePrime, SECP256K1_ORDER};
use crate::DerivationConfig;

/// Bits produced by one HMAC-SHA512 round of the prime seed generator
const BITS_PER_ROUND: usize = 512;

/// Modulus lengths must be a multiple of this
const RSA_MODULUS_STEP: usize = 1024;

/// Largest modulus the RSA backend accepts for a public key
pub const RSA_MAX_MODULUS_LENGTH: usize = 4096;

/// A relationship between an owner DID and a peer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairwiseKey {
    did: String,
    peer_id: String,
}

impl PairwiseKey {
    /// Create the relationship descriptor
    pub fn new(did: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            peer_id: peer_id.into(),
        }
    }

    /// Relationship id, `"{did}-{peer_id}"`
    pub fn id(&self) -> String {
        format!("{}-{}", self.did, self.peer_id)
    }

    /// Owner DID
    pub fn did(&self) -> &str {
        &self.did
    }

    /// Peer identifier
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Derive the pairwise key of `key_type` from `master_key`
    #[allow(clippy::too_many_arguments)]
    pub async fn generate(
        &self,
        master_key: &[u8],
        provider: Arc<dyn CryptoProvider>,
        algorithm: &Algorithm,
        key_type: KeyType,
        key_use: KeyUse,
        exportable: bool,
        config: &DerivationConfig,
    ) -> Result<DeterministicKey> {
        tracing::debug!("Generating pairwise {} key for {}", key_type, self.id());

        match key_type {
            KeyType::EllipticCurve => {
                self.derive_ec(master_key, provider, algorithm, exportable, config)
                    .await
            }
            KeyType::Rsa => {
                self.derive_rsa(master_key, provider, algorithm, key_use, exportable, config)
                    .await
            }
            KeyType::Symmetric => Err(Error::UnsupportedPairwiseKeyType(key_type.to_string())),
        }
    }

    /// secp256k1 key from HMAC-SHA256 of the peer id
    pub async fn derive_ec(
        &self,
        master_key: &[u8],
        provider: Arc<dyn CryptoProvider>,
        algorithm: &Algorithm,
        exportable: bool,
        config: &DerivationConfig,
    ) -> Result<DeterministicKey> {
        let seed = hmac(&provider, "SHA-256", master_key, self.peer_id.as_bytes(), config).await?;

        let curve = algorithm.named_curve.as_deref().unwrap_or_default();
        if !is_secp256k1_alias(curve) {
            return Err(Error::UnsupportedCurve(curve.to_string()));
        }

        let jwk = secp256k1_jwk(&seed, curve)?;
        DeterministicKey::with_config(
            provider,
            algorithm.clone(),
            Some(RawKey::Jwk(jwk)),
            exportable,
            config.clone(),
        )
    }

    /// RSA key from two deterministic prime searches
    pub async fn derive_rsa(
        &self,
        master_key: &[u8],
        provider: Arc<dyn CryptoProvider>,
        algorithm: &Algorithm,
        key_use: KeyUse,
        exportable: bool,
        config: &DerivationConfig,
    ) -> Result<DeterministicKey> {
        let key_size = algorithm
            .modulus_length
            .unwrap_or(config.default_rsa_modulus_length);
        if key_size == 0 || key_size % RSA_MODULUS_STEP != 0 || key_size > RSA_MAX_MODULUS_LENGTH {
            return Err(Error::InvalidAlgorithm(format!(
                "RSA modulus length must be a multiple of {} up to {}, got {}",
                RSA_MODULUS_STEP, RSA_MAX_MODULUS_LENGTH, key_size
            )));
        }

        let peer = self.peer_id.as_bytes();
        let prime_bits = key_size / 2;
        let p_base =
            generate_deterministic_number_for_prime(&provider, prime_bits, master_key, peer, config)
                .await?;
        let q_base =
            generate_deterministic_number_for_prime(&provider, prime_bits, &p_base, peer, config)
                .await?;

        let rounds = config.miller_rabin_rounds;
        let (p, q) = tokio::task::spawn_blocking(move || -> Result<(ProbablePrime, ProbablePrime)> {
            Ok((
                nearest_probable_prime_with_rounds(&p_base, rounds)?,
                nearest_probable_prime_with_rounds(&q_base, rounds)?,
            ))
        })
        .await
        .map_err(|e| Error::Internal(format!("Prime search task failed: {}", e)))??;

        tracing::debug!(
            "Pairwise RSA-{} for {} ({}): p after {} candidates, q after {}",
            key_size,
            self.id(),
            key_use,
            p.candidates_tested,
            q.candidates_tested
        );

        let jwk = rsa_jwk(&p.value, &q.value)?;
        DeterministicKey::with_config(
            provider,
            algorithm.clone(),
            Some(RawKey::Jwk(jwk)),
            exportable,
            config.clone(),
        )
    }
}

/// `bit_size` bits of deterministic material for a prime search
///
/// Runs `bit_size / 512` HMAC-SHA512 rounds over `context`. Round 0 is keyed
/// by `seed`, every later round by everything produced so far.
pub async fn generate_deterministic_number_for_prime(
    provider: &Arc<dyn CryptoProvider>,
    bit_size: usize,
    seed: &[u8],
    context: &[u8],
    config: &DerivationConfig,
) -> Result<Vec<u8>> {
    let rounds = bit_size / BITS_PER_ROUND;
    if rounds == 0 || bit_size > RSA_MAX_MODULUS_LENGTH {
        return Err(Error::InvalidAlgorithm(format!(
            "Prime size must be between {} and {} bits, got {}",
            BITS_PER_ROUND, RSA_MAX_MODULUS_LENGTH, bit_size
        )));
    }

    let mut accumulated: Vec<u8> = Vec::with_capacity(rounds * BITS_PER_ROUND / 8);
    for round in 0..rounds {
        let key = if round == 0 { seed } else { accumulated.as_slice() };
        let output = hmac(provider, "SHA-512", key, context, config).await?;
        accumulated.extend_from_slice(&output);
    }

    Ok(accumulated)
}

/// HMAC through a transient, non-exportable key
async fn hmac(
    provider: &Arc<dyn CryptoProvider>,
    hash: &str,
    key: &[u8],
    data: &[u8],
    config: &DerivationConfig,
) -> Result<Vec<u8>> {
    let transient = DeterministicKey::with_config(
        provider.clone(),
        Algorithm::hmac(hash),
        Some(RawKey::bytes(key)),
        false,
        config.clone(),
    )?;
    transient.sign(data).await
}

/// EC JWK for the scalar `big-endian(seed) mod n`
pub fn secp256k1_jwk(seed: &[u8], crv: &str) -> Result<Jwk> {
    let scalar = BigUint::from_bytes_be(seed) % &*SECP256K1_ORDER;
    if scalar.is_zero() {
        return Err(Error::generation("ec", "derived scalar is zero"));
    }

    let d = crate::crypto::jwk::pad_be(&scalar.to_bytes_be(), EC_KEY_SIZE)?;
    let secret = k256::SecretKey::from_slice(&d).map_err(|e| Error::generation("ec", e))?;
    let point = secret.public_key().to_encoded_point(false);

    match (point.x(), point.y()) {
        (Some(x), Some(y)) => Ok(Jwk::ec(crv, x, y, Some(d.as_slice()))),
        _ => Err(Error::generation("ec", "public point is the identity")),
    }
}

/// RSA JWK with every private member for primes `p` and `q`
pub fn rsa_jwk(p: &BigUint, q: &BigUint) -> Result<Jwk> {
    let one = BigUint::one();
    if p <= &one || q <= &one {
        return Err(Error::generation("rsa", "primes must be greater than one"));
    }
    if p == q {
        return Err(Error::generation("rsa", "p and q are equal"));
    }

    let e = BigUint::from_bytes_be(&RSA_PUBLIC_EXPONENT);
    let n = p * q;
    let phi = (p - &one) * (q - &one);
    let d = e
        .modinv(&phi)
        .ok_or_else(|| Error::generation("rsa", "public exponent is not invertible modulo phi"))?;
    let crt = CrtParameters::compute(&d, p, q)?;

    Ok(Jwk {
        kty: KeyType::Rsa.as_str().to_string(),
        n: Some(encode_b64(&n.to_bytes_be())),
        e: Some(encode_b64(&e.to_bytes_be())),
        d: Some(encode_b64(&d.to_bytes_be())),
        p: Some(encode_b64(&p.to_bytes_be())),
        q: Some(encode_b64(&q.to_bytes_be())),
        dp: Some(encode_b64(&crt.dp.to_bytes_be())),
        dq: Some(encode_b64(&crt.dq.to_bytes_be())),
        qi: Some(encode_b64(&crt.qi.to_bytes_be())),
        ..Default::default()
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RustCryptoProvider;

    const SEED: &[u8] = b"xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvN\
        KmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";

    async fn master_key(did: &str) -> Vec<u8> {
        let config = DerivationConfig::default();
        hmac(&RustCryptoProvider::shared(), "SHA-512", SEED, did.as_bytes(), &config)
            .await
            .unwrap()
    }

    #[test]
    fn test_pairwise_id() {
        let pairwise = PairwiseKey::new("did:example:alice", "bob");
        assert_eq!(pairwise.id(), "did:example:alice-bob");
        assert_eq!(pairwise.did(), "did:example:alice");
        assert_eq!(pairwise.peer_id(), "bob");
    }

    #[tokio::test]
    async fn test_derive_ec_reference_vector() {
        let master = master_key("abcdef").await;
        let key = PairwiseKey::new("abcdef", "0")
            .derive_ec(
                &master,
                RustCryptoProvider::shared(),
                &Algorithm::ecdsa("P-256K", "SHA-256"),
                true,
                &DerivationConfig::default(),
            )
            .await
            .unwrap();

        let jwk = key.get_exported_key(crate::crypto::KeyExport::Private).await.unwrap();
        assert_eq!(jwk.crv.as_deref(), Some("P-256K"));
        assert_eq!(jwk.d.as_deref(), Some("wWlD7xILq-UM31SBLY8_8RDy4C9wTG95CMIzyAxYeTM"));
        assert_eq!(jwk.x.as_deref(), Some("V9b0fIopxnLl8Z5JMMywdZmuQKdY6EM-nFNJstqENiQ"));
        assert_eq!(jwk.y.as_deref(), Some("pnDu13IBC_Maq_ijtGvPOxhxAoACb39cxO_u9HzrK2c"));
    }

    #[tokio::test]
    async fn test_derive_ec_unsupported_curve() {
        let master = master_key("abcdef").await;
        let result = PairwiseKey::new("abcdef", "0")
            .derive_ec(
                &master,
                RustCryptoProvider::shared(),
                &Algorithm::ecdsa("P-256", "SHA-256"),
                true,
                &DerivationConfig::default(),
            )
            .await;

        match result {
            Err(Error::UnsupportedCurve(curve)) => assert_eq!(curve, "P-256"),
            other => panic!("expected UnsupportedCurve, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_symmetric_unsupported() {
        let result = PairwiseKey::new("abcdef", "0")
            .generate(
                &[1u8; 64],
                RustCryptoProvider::shared(),
                &Algorithm::hmac("SHA-256"),
                KeyType::Symmetric,
                KeyUse::Signature,
                true,
                &DerivationConfig::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::UnsupportedPairwiseKeyType(_))));
    }

    #[tokio::test]
    async fn test_number_for_prime_chain() {
        let provider = RustCryptoProvider::shared();
        let config = DerivationConfig::default();
        let master = master_key("abcdef").await;

        let p_base = generate_deterministic_number_for_prime(&provider, 512, &master, b"0", &config)
            .await
            .unwrap();
        let q_base = generate_deterministic_number_for_prime(&provider, 512, &p_base, b"0", &config)
            .await
            .unwrap();

        assert_eq!(
            hex::encode(&p_base),
            "c0c40bb5302355242c3dbf64ad7c414d70efeace029efa4e8bbc4a2e258a7263\
             0838ccf6fe9119b019027971b0772bea18a31c3afb32d506dded42383175e56c"
        );
        assert_eq!(
            hex::encode(&q_base),
            "c1436ce15004208a49b747fe8d6b92526b2bae0abb17611775ec684beb88c4d9\
             b739de682d76305d2bd9a8de759b27e357b8ea2cbd288d4a735e82798d822edc"
        );
        assert_ne!(p_base, q_base);
    }

    #[tokio::test]
    async fn test_number_for_prime_multiple_rounds() {
        let provider = RustCryptoProvider::shared();
        let config = DerivationConfig::default();

        let one_round =
            generate_deterministic_number_for_prime(&provider, 512, b"seed", b"ctx", &config)
                .await
                .unwrap();
        let two_rounds =
            generate_deterministic_number_for_prime(&provider, 1024, b"seed", b"ctx", &config)
                .await
                .unwrap();

        assert_eq!(two_rounds.len(), 128);
        assert_eq!(&two_rounds[..64], one_round.as_slice());

        // round 1 is keyed by round 0's output
        let second = hmac(&provider, "SHA-512", &one_round, b"ctx", &config).await.unwrap();
        assert_eq!(&two_rounds[64..], second.as_slice());
    }

    #[tokio::test]
    async fn test_number_for_prime_too_small() {
        let result = generate_deterministic_number_for_prime(
            &RustCryptoProvider::shared(),
            256,
            b"seed",
            b"ctx",
            &DerivationConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidAlgorithm(_))));
    }

    #[tokio::test]
    async fn test_number_for_prime_too_large() {
        let result = generate_deterministic_number_for_prime(
            &RustCryptoProvider::shared(),
            usize::MAX - 511,
            b"seed",
            b"ctx",
            &DerivationConfig::default(),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidAlgorithm(_))));
    }

    #[tokio::test]
    async fn test_derive_rsa_rejects_oversized_modulus() {
        for bits in [5120, 6144, 8192, 1 << 40] {
            let result = PairwiseKey::new("abcdef", "0")
                .derive_rsa(
                    &[1u8; 64],
                    RustCryptoProvider::shared(),
                    &Algorithm::rsassa_pkcs1_v1_5(bits, "SHA-256"),
                    KeyUse::Signature,
                    true,
                    &DerivationConfig::default(),
                )
                .await;

            assert!(matches!(result, Err(Error::InvalidAlgorithm(_))), "{} bits", bits);
        }
    }

    #[tokio::test]
    async fn test_derive_rsa_rejects_odd_modulus() {
        let result = PairwiseKey::new("abcdef", "0")
            .derive_rsa(
                &[1u8; 64],
                RustCryptoProvider::shared(),
                &Algorithm::rsassa_pkcs1_v1_5(1536, "SHA-256"),
                KeyUse::Signature,
                true,
                &DerivationConfig::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidAlgorithm(_))));
    }

    #[test]
    fn test_rsa_jwk_textbook() {
        let jwk = rsa_jwk(&BigUint::from(61u32), &BigUint::from(53u32)).unwrap();

        // n = 3233, e = 65537, phi = 3120, d = 65537^-1 mod 3120 = 2753
        assert_eq!(jwk.member("n").unwrap(), BigUint::from(3233u32).to_bytes_be());
        assert_eq!(jwk.member("e").unwrap(), vec![0x01, 0x00, 0x01]);
        assert_eq!(jwk.member("d").unwrap(), BigUint::from(2753u32).to_bytes_be());
        assert_eq!(jwk.member("qi").unwrap(), vec![38]);
    }

    #[test]
    fn test_rsa_jwk_equal_primes() {
        let p = BigUint::from(61u32);
        assert!(matches!(rsa_jwk(&p, &p), Err(Error::KeyGenerationFailed { .. })));
    }

    #[test]
    fn test_rsa_jwk_degenerate_primes() {
        let p = BigUint::from(61u32);
        for small in [BigUint::zero(), BigUint::one()] {
            assert!(matches!(rsa_jwk(&p, &small), Err(Error::KeyGenerationFailed { .. })));
            assert!(matches!(rsa_jwk(&small, &p), Err(Error::KeyGenerationFailed { .. })));
        }
    }

    #[test]
    fn test_secp256k1_jwk_reduces_modulo_order() {
        let order = SECP256K1_ORDER.to_bytes_be();
        let mut above = order.clone();
        above[31] += 1; // n + 1

        let jwk = secp256k1_jwk(&above, "K-256").unwrap();
        let one = secp256k1_jwk(&[1u8], "K-256").unwrap();

        assert_eq!(jwk, one);
        assert!(matches!(
            secp256k1_jwk(&order, "K-256"),
            Err(Error::KeyGenerationFailed { .. })
        ));
    }
}
