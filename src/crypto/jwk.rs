//! # JSON Web Keys
//!
//! The interchange representation for all key material (RFC 7517 subset).
//!
//! | Member | Meaning |
//! |--------|---------|
//! | `kty` | `oct`, `EC` or `RSA` |
//! | `use` | `sig` or `enc` |
//! | `key_ops` | WebCrypto usages |
//! | `k` | base64url secret (oct) |
//! | `crv` | curve name (EC) |
//! | `x`, `y`, `d` | base64url big-endian coordinates / scalar (EC) |
//! | `n`, `e`, `d`, `p`, `q`, `dp`, `dq`, `qi` | base64url big-endian RSA parameters |

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::crypto::algorithm::{normalize_curve_name, KeyOperation, KeyType, KeyUse};
use crate::error::{Error, Result};

/// A JSON Web Key
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type
    pub kty: String,

    /// Intended use
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// Permitted operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<KeyOperation>>,

    /// Symmetric secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,

    /// Curve name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC x coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// EC private scalar or RSA private exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    /// RSA modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// RSA first prime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,

    /// RSA second prime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    /// RSA `d mod (p-1)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,

    /// RSA `d mod (q-1)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,

    /// RSA `q^-1 mod p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl Jwk {
    /// Symmetric key from raw bytes
    pub fn oct(secret: &[u8], key_use: KeyUse) -> Self {
        Self {
            kty: KeyType::Symmetric.as_str().to_string(),
            key_use: Some(key_use.as_str().to_string()),
            k: Some(encode_b64(secret)),
            ..Default::default()
        }
    }

    /// EC key from 32-byte big-endian members
    pub fn ec(crv: &str, x: &[u8], y: &[u8], d: Option<&[u8]>) -> Self {
        Self {
            kty: KeyType::EllipticCurve.as_str().to_string(),
            crv: Some(crv.to_string()),
            x: Some(encode_b64(x)),
            y: Some(encode_b64(y)),
            d: d.map(encode_b64),
            ..Default::default()
        }
    }

    /// The key type named by `kty`
    pub fn key_type(&self) -> Result<KeyType> {
        KeyType::parse(&self.kty)
            .ok_or_else(|| Error::UnsupportedKeyType(self.kty.clone()))
    }

    /// Whether the JWK carries a private or secret member
    pub fn has_private(&self) -> bool {
        self.d.is_some() || self.k.is_some()
    }

    /// Decode a required base64url member
    pub fn member(&self, name: &str) -> Result<Vec<u8>> {
        let value = match name {
            "k" => &self.k,
            "x" => &self.x,
            "y" => &self.y,
            "d" => &self.d,
            "n" => &self.n,
            "e" => &self.e,
            "p" => &self.p,
            "q" => &self.q,
            "dp" => &self.dp,
            "dq" => &self.dq,
            "qi" => &self.qi,
            _ => return Err(Error::InvalidKey(format!("Unknown JWK member '{}'", name))),
        };
        let encoded = value
            .as_deref()
            .ok_or_else(|| Error::InvalidKey(format!("Missing JWK member '{}'", name)))?;
        decode_b64(encoded)
    }

    /// Copy with only the public members
    ///
    /// `kty`, `use` and `key_ops` are kept; for EC `crv`, `x`, `y`; for RSA
    /// `n`, `e`. Symmetric secrets have no public half and come back empty.
    pub fn to_public(&self) -> Self {
        Self {
            kty: self.kty.clone(),
            key_use: self.key_use.clone(),
            key_ops: self.key_ops.clone(),
            crv: self.crv.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
            ..Default::default()
        }
    }

    /// Copy with the curve name rewritten for the provider
    pub fn normalized(&self) -> Self {
        let mut jwk = self.clone();
        if let Some(crv) = jwk.crv.as_deref() {
            let canonical = normalize_curve_name(crv);
            if canonical != crv {
                jwk.crv = Some(canonical.to_string());
            }
        }
        jwk
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// Private members never reach logs
impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("use", &self.key_use)
            .field("key_ops", &self.key_ops)
            .field("crv", &self.crv)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("n", &self.n)
            .field("e", &self.e)
            .field("k", &redact(&self.k))
            .field("d", &redact(&self.d))
            .finish_non_exhaustive()
    }
}

/// base64url (no padding) encode
pub fn encode_b64(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// base64url (no padding) decode
pub fn decode_b64(encoded: &str) -> Result<Vec<u8>> {
    Ok(URL_SAFE_NO_PAD.decode(encoded)?)
}

/// Left-pad big-endian bytes to a fixed width
pub fn pad_be(bytes: &[u8], width: usize) -> Result<Vec<u8>> {
    if bytes.len() > width {
        return Err(Error::InvalidKey(format!(
            "Value of {} bytes does not fit in {} bytes",
            bytes.len(),
            width
        )));
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(bytes);
    Ok(padded)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oct_jwk() {
        let jwk = Jwk::oct(b"1234567890123456", KeyUse::Signature);

        assert_eq!(jwk.kty, "oct");
        assert_eq!(jwk.key_use.as_deref(), Some("sig"));
        assert_eq!(jwk.k.as_deref(), Some("MTIzNDU2Nzg5MDEyMzQ1Ng"));
        assert_eq!(jwk.member("k").unwrap(), b"1234567890123456");
    }

    #[test]
    fn test_to_public_strips_private_members() {
        let mut jwk = Jwk::ec("P-256K", &[1u8; 32], &[2u8; 32], Some(&[3u8; 32]));
        jwk.key_ops = Some(vec![KeyOperation::Sign, KeyOperation::Verify]);

        let public = jwk.to_public();

        assert!(public.d.is_none());
        assert!(!public.has_private());
        assert_eq!(public.x, jwk.x);
        assert_eq!(public.crv.as_deref(), Some("P-256K"));
        assert_eq!(public.key_ops, jwk.key_ops);
    }

    #[test]
    fn test_normalized_curve() {
        let jwk = Jwk::ec("P-256K", &[1u8; 32], &[2u8; 32], None);
        assert_eq!(jwk.normalized().crv.as_deref(), Some("K-256"));

        let jwk = Jwk::ec("P-256", &[1u8; 32], &[2u8; 32], None);
        assert_eq!(jwk.normalized().crv.as_deref(), Some("P-256"));
    }

    #[test]
    fn test_json_member_names() {
        let jwk = Jwk::oct(b"abc", KeyUse::Signature);
        let json: serde_json::Value = serde_json::from_str(&jwk.to_json().unwrap()).unwrap();

        assert_eq!(json["use"], "sig");
        assert!(json.get("d").is_none());

        let restored = Jwk::from_json(&jwk.to_json().unwrap()).unwrap();
        assert_eq!(restored, jwk);
    }

    #[test]
    fn test_missing_member() {
        let jwk = Jwk::oct(b"abc", KeyUse::Signature);
        assert!(matches!(jwk.member("n"), Err(Error::InvalidKey(_))));
        assert!(matches!(Jwk::default().key_type(), Err(Error::UnsupportedKeyType(_))));
    }

    #[test]
    fn test_debug_redacts() {
        let jwk = Jwk::ec("K-256", &[1u8; 32], &[2u8; 32], Some(&[3u8; 32]));
        let debug = format!("{:?}", jwk);

        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&encode_b64(&[3u8; 32])));
    }

    #[test]
    fn test_pad_be() {
        assert_eq!(pad_be(&[1, 2], 4).unwrap(), vec![0, 0, 1, 2]);
        assert!(pad_be(&[1, 2, 3], 2).is_err());
    }
}
