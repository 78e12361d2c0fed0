//! # Pairwise Keys
//!
//! Deterministic derivation of relationship-specific keys.
//!
//! - [`derivation`] - `PairwiseKey`, EC and RSA branches
//! - [`prime`] - Nearest probable prime search (Miller-Rabin)

pub mod derivation;
pub mod prime;

pub use derivation::{
    generate_deterministic_number_for_prime, rsa_jwk, secp256k1_jwk, PairwiseKey,
    RSA_MAX_MODULUS_LENGTH,
};
pub use prime::{
    is_probable_prime, nearest_probable_prime, nearest_probable_prime_with_rounds, ProbablePrime,
    DEFAULT_MILLER_RABIN_ROUNDS, SECP256K1_ORDER,
};
