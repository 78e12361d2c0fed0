//! # Pairwise Key Demo
//!
//! Derives relationship-specific keys for one identity and shows that they
//! are stable, unique per peer, and verifiable by the peer from the public
//! half alone.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example pairwise_demo
//! RUST_LOG=pairwise_core=debug cargo run --example pairwise_demo
//! ```

use std::sync::Arc;

use pairwise_core::crypto::{Algorithm, KeyExport, RustCryptoProvider};
use pairwise_core::{DeterministicKey, MasterSeed, RawKey, RecoveryPhrase};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pairwise_core=info")),
        )
        .init();

    println!("=== Pairwise Core: Relationship Key Demo ===\n");

    // ========================================================================
    // STEP 1: Master seed
    // ========================================================================
    println!("Step 1: Creating a master seed from a recovery phrase...");

    let phrase = RecoveryPhrase::generate().expect("Failed to generate phrase");
    let seed = phrase
        .to_master_seed("")
        .expect("Failed to derive master seed");

    println!("  Words: {} (first: {}...)", phrase.words().len(), phrase.words()[0]);
    println!("  Seed:  {:?}", seed);
    println!();

    // ========================================================================
    // STEP 2: Root key
    // ========================================================================
    println!("Step 2: Creating the root secp256k1 signing key...");

    let algorithm = Algorithm::ecdsa("secp256k1", "SHA-256");
    let root = DeterministicKey::new(RustCryptoProvider::shared(), algorithm.clone(), None, true)
        .expect("Failed to create root key");

    println!("  {:?}", root);
    println!();

    // ========================================================================
    // STEP 3: Pairwise keys
    // ========================================================================
    println!("Step 3: Deriving one key per relationship...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                  PAIRWISE DERIVATION                        │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   seed ──HMAC-SHA512(did)──► master key                     │");
    println!("  │                                  │                          │");
    println!("  │            ┌─────────────────────┼──────────────────┐       │");
    println!("  │            ▼                     ▼                  ▼       │");
    println!("  │   HMAC-SHA256(bob)      HMAC-SHA256(carol)   HMAC-SHA256(..)│");
    println!("  │            │                     │                  │       │");
    println!("  │            ▼                     ▼                  ▼       │");
    println!("  │       key for bob          key for carol          ...       │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let did = "did:example:alice";
    let mut derived = Vec::new();
    for peer in ["did:example:bob", "did:example:carol", "did:example:dave"] {
        let key = root
            .generate_pairwise(seed.as_bytes(), did, peer)
            .await
            .expect("Failed to derive pairwise key");
        let public = key.public_jwk().await.expect("Failed to export public key");

        println!(
            "  {} -> x = {}...",
            peer,
            &public.x.as_deref().unwrap_or_default()[..16]
        );
        derived.push((peer, key));
    }
    println!();

    // ========================================================================
    // STEP 4: Stability
    // ========================================================================
    println!("Step 4: Deriving Bob's key again...");

    let again = root
        .generate_pairwise(seed.as_bytes(), did, "did:example:bob")
        .await
        .expect("Failed to derive pairwise key");
    println!("  Same instance: {}", Arc::ptr_eq(&again, &derived[0].1));

    let fresh_root =
        DeterministicKey::new(RustCryptoProvider::shared(), algorithm.clone(), None, true)
            .expect("Failed to create root key");
    let recomputed = fresh_root
        .generate_pairwise(seed.as_bytes(), did, "did:example:bob")
        .await
        .expect("Failed to derive pairwise key");
    println!(
        "  Same key from a fresh root: {}",
        recomputed.get_exported_key(KeyExport::Public).await.ok()
            == again.get_exported_key(KeyExport::Public).await.ok()
    );
    println!();

    // ========================================================================
    // STEP 5: Peer verification
    // ========================================================================
    println!("Step 5: Bob verifies a signature with the public half only...");

    let message = b"Hello Bob, this key is just for us";
    let signature = again.sign(message).await.expect("Failed to sign");
    let public = again.public_jwk().await.expect("Failed to export public key");
    println!("  Public JWK: {}", public.to_json().expect("Failed to serialize JWK"));

    let bob_view = DeterministicKey::new(
        RustCryptoProvider::shared(),
        algorithm,
        Some(RawKey::Jwk(public)),
        true,
    )
    .expect("Failed to import public key");

    println!("  Signature: {}...", hex::encode(&signature[..16]));
    println!(
        "  Valid: {}",
        bob_view.verify(message, &signature).await.expect("Failed to verify")
    );
    println!(
        "  Valid for tampered message: {}",
        bob_view
            .verify(b"Hello Bob, this key is just for me", &signature)
            .await
            .expect("Failed to verify")
    );
    println!();

    // ========================================================================
    // STEP 6: RSA
    // ========================================================================
    println!("Step 6: Deriving a 1024-bit RSA key (deterministic prime search)...");

    let rsa_root = DeterministicKey::new(
        RustCryptoProvider::shared(),
        Algorithm::rsassa_pkcs1_v1_5(1024, "SHA-256"),
        None,
        true,
    )
    .expect("Failed to create RSA root key");

    let seed = MasterSeed::from_bytes(b"demo-seed".to_vec()).expect("Failed to wrap seed");
    let rsa = rsa_root
        .generate_pairwise(seed.as_bytes(), did, "did:example:bob")
        .await
        .expect("Failed to derive RSA key");
    let jwk = rsa.public_jwk().await.expect("Failed to export public key");

    println!("  n = {}...", &jwk.n.as_deref().unwrap_or_default()[..32]);
    println!("  e = {}", jwk.e.as_deref().unwrap_or_default());
    println!();

    println!("=== Demo Complete ===");
}
