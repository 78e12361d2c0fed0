//! # Probable Prime Search
//!
//! Turns deterministic pseudo-random bytes into a probable prime by walking
//! upward over odd candidates.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      NEAREST PROBABLE PRIME                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  bytes[0]  |= 0x80     top bit set, full bit length                    │
//! │  bytes[-1] |= 0x01     odd                                             │
//! │                                                                         │
//! │  n = big-endian(bytes)                                                 │
//! │  loop:                                                                 │
//! │      candidates_tested += 1                                            │
//! │      trial division by small primes     (cheap reject)                 │
//! │      Miller-Rabin, 64 random bases      (~2^-128 false positive)       │
//! │      n += 2                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The walk is unbounded. Prime density near 2^512 keeps it short in
//! practice, a few hundred candidates at most.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Miller-Rabin rounds used when none are configured
pub const DEFAULT_MILLER_RABIN_ROUNDS: usize = 64;

const SMALL_PRIMES: [u32; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Order of the secp256k1 base point
pub static SECP256K1_ORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::from_bytes_be(&[
        0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
        0x41, 0x41,
    ])
});

/// Result of a prime search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbablePrime {
    /// The probable prime
    pub value: BigUint,
    /// Number of candidates examined, including the accepted one
    pub candidates_tested: u64,
}

impl ProbablePrime {
    /// Big-endian bytes of the prime
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.value.to_bytes_be()
    }
}

/// Nearest probable prime at or above `candidate` with the top and low bits forced
pub fn nearest_probable_prime(candidate: &[u8]) -> Result<ProbablePrime> {
    nearest_probable_prime_with_rounds(candidate, DEFAULT_MILLER_RABIN_ROUNDS)
}

/// [`nearest_probable_prime`] with an explicit Miller-Rabin round count
pub fn nearest_probable_prime_with_rounds(
    candidate: &[u8],
    rounds: usize,
) -> Result<ProbablePrime> {
    if candidate.is_empty() {
        return Err(Error::InvalidKey("Prime candidate must not be empty".into()));
    }
    if rounds == 0 {
        return Err(Error::InvalidAlgorithm(
            "Miller-Rabin needs at least one round".into(),
        ));
    }

    let mut bytes = candidate.to_vec();
    bytes[0] |= 0x80;
    let last = bytes.len() - 1;
    bytes[last] |= 0x01;

    let two = BigUint::from(2u32);
    let mut value = BigUint::from_bytes_be(&bytes);
    let mut candidates_tested = 0u64;

    loop {
        candidates_tested += 1;

        #[cfg(feature = "verbose-logging")]
        tracing::trace!("Testing prime candidate #{}", candidates_tested);

        if is_probable_prime(&value, rounds) {
            tracing::debug!(
                "Found {}-bit probable prime after {} candidates",
                value.bits(),
                candidates_tested
            );
            return Ok(ProbablePrime {
                value,
                candidates_tested,
            });
        }
        value += &two;
    }
}

/// Miller-Rabin probable-primality test with `rounds` random bases
pub fn is_probable_prime(n: &BigUint, rounds: usize) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);

    if *n < two {
        return false;
    }
    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    let mut rng = rand::thread_rng();
    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_probable_prime_reference() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let prime = nearest_probable_prime(&bytes).unwrap();

        assert_eq!(
            hex::encode(prime.to_bytes_be()),
            "800102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\
             202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3ecf"
        );
        assert_eq!(prime.candidates_tested, 73);
    }

    #[test]
    fn test_explicit_round_count() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let reference = nearest_probable_prime(&bytes).unwrap();
        let fewer = nearest_probable_prime_with_rounds(&bytes, 8).unwrap();

        assert_eq!(fewer, reference);
        assert!(matches!(
            nearest_probable_prime_with_rounds(&bytes, 0),
            Err(Error::InvalidAlgorithm(_))
        ));
    }

    #[test]
    fn test_nearest_probable_prime_is_reproducible() {
        let bytes = [0x5au8; 32];
        let first = nearest_probable_prime(&bytes).unwrap();
        let second = nearest_probable_prime(&bytes).unwrap();

        assert_eq!(first, second);
        assert!(first.candidates_tested > 0);
        assert_eq!(first.value.bits(), 256);
    }

    #[test]
    fn test_forced_bits() {
        let prime = nearest_probable_prime(&[0u8; 8]).unwrap();
        let bytes = prime.to_bytes_be();

        assert_eq!(bytes.len(), 8);
        assert!(bytes[0] & 0x80 != 0);
        assert!(bytes[7] & 0x01 != 0);
    }

    #[test]
    fn test_is_probable_prime_small_values() {
        assert!(!is_probable_prime(&BigUint::from(0u32), 64));
        assert!(!is_probable_prime(&BigUint::from(1u32), 64));
        assert!(is_probable_prime(&BigUint::from(2u32), 64));
        assert!(is_probable_prime(&BigUint::from(251u32), 64));
        assert!(is_probable_prime(&BigUint::from(257u32), 64));
        assert!(!is_probable_prime(&BigUint::from(561u32), 64)); // Carmichael
        assert!(is_probable_prime(&BigUint::from(2_147_483_647u32), 64));
    }

    #[test]
    fn test_is_probable_prime_large_composite() {
        // Product of two Mersenne primes 2^61-1 and 2^89-1
        let a = (BigUint::one() << 61u32) - 1u32;
        let b = (BigUint::one() << 89u32) - 1u32;

        assert!(is_probable_prime(&a, 64));
        assert!(is_probable_prime(&b, 64));
        assert!(!is_probable_prime(&(a * b), 64));
    }

    #[test]
    fn test_empty_candidate() {
        assert!(matches!(nearest_probable_prime(&[]), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_secp256k1_order() {
        assert_eq!(SECP256K1_ORDER.bits(), 256);
        assert!(is_probable_prime(&SECP256K1_ORDER, 16));
    }
}
