//! Signature algorithm and verification for the Susu APIs.
//!
//! Every mutating Susu API endpoint uses HMAC-SHA256 signatures defined in
//! this module. The wire format for the header is:
//!
//! ```text
//! Susu-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! The signature is computed over the JSON request body as
//! `HMAC-SHA256("{timestamp}.{json_body}", secret)`.

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Susu-Signature";

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Susu-Admin-Authorization";

/// Maximum allowed age of a signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Marker trait for types that can participate in body signing via
/// [`SignedObject`].
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// SignedObject — body signing
// ---------------------------------------------------------------------------

/// A signed API body carrying its typed payload, timestamp, raw JSON, and
/// HMAC-SHA256 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub timestamp: i64,
    pub json: String,
    pub signature: Box<[u8]>,
}

impl<T: Signature> SignedObject<T> {
    /// Create a new signed object.
    ///
    /// Serializes `body` to JSON, computes
    /// `HMAC-SHA256("{timestamp}.{json}", key)`, and returns the assembled
    /// [`SignedObject`].
    pub fn new(body: T, key: &[u8]) -> Result<Self, serde_json::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let json = serde_json::to_string(&body)?;
        let data = format!("{now}.{json}");
        let signature = ring::hmac::sign(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            data.as_bytes(),
        );
        let signature = signature.as_ref().to_owned().into_boxed_slice();
        Ok(Self {
            body,
            timestamp: now,
            json,
            signature,
        })
    }

    /// Reconstruct a [`SignedObject`] from a raw `Susu-Signature` header
    /// value and the JSON request body string.
    ///
    /// This parses the header and deserializes the body but does **not**
    /// verify the HMAC — call [`verify`](Self::verify) for that.
    pub fn from_header_and_body(
        header_value: &str,
        body_json: String,
    ) -> Result<Self, SignatureError> {
        let (timestamp, signature) = parse_signature_header(header_value)?;
        let body: T = serde_json::from_str(&body_json)?;
        Ok(Self {
            body,
            timestamp,
            json: body_json,
            signature,
        })
    }

    /// Verify the HMAC signature and timestamp freshness, consuming `self`
    /// and returning the authenticated payload.
    pub fn verify(self, key: &[u8]) -> Result<T, SignatureError> {
        let data = format!("{}.{}", self.timestamp, self.json);
        ring::hmac::verify(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            data.as_bytes(),
            self.signature.as_ref(),
        )?;
        check_timestamp(self.timestamp)?;
        Ok(self.body)
    }

    /// Format the full `Susu-Signature` header value (`{timestamp}.{b64}`).
    pub fn to_header(&self) -> String {
        format_signature_header(self.timestamp, &self.signature)
    }

    /// Base64-encode the raw signature bytes (without the timestamp prefix).
    pub fn stringify_signature(&self) -> String {
        fast32::base64::RFC4648_NOPAD.encode(&self.signature)
    }
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `Susu-Signature` header value (`{timestamp}.{base64}`) into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let dot_pos = value.find('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = value[..dot_pos]
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(&value[dot_pos + 1..])
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

// ---------------------------------------------------------------------------
// Timestamp validation
// ---------------------------------------------------------------------------

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{PoolId, SettleCycleRequest};

    const KEY: &[u8] = b"susu-test-secret";

    #[test]
    fn test_sign_verify_round_trip() {
        let body = SettleCycleRequest {
            pool_id: PoolId(7),
            cycle: 2,
        };
        let signed = SignedObject::new(body.clone(), KEY).unwrap();
        let header = signed.to_header();
        let json = signed.json.clone();

        let reconstructed =
            SignedObject::<SettleCycleRequest>::from_header_and_body(&header, json).unwrap();
        let verified = reconstructed.verify(KEY).unwrap();
        assert_eq!(verified, body);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let body = SettleCycleRequest {
            pool_id: PoolId(7),
            cycle: 2,
        };
        let signed = SignedObject::new(body, KEY).unwrap();
        let header = signed.to_header();
        let json = signed.json.clone();

        let reconstructed =
            SignedObject::<SettleCycleRequest>::from_header_and_body(&header, json).unwrap();
        assert!(matches!(
            reconstructed.verify(b"other-secret"),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = SettleCycleRequest {
            pool_id: PoolId(7),
            cycle: 2,
        };
        let signed = SignedObject::new(body, KEY).unwrap();
        let header = signed.to_header();
        let tampered = signed.json.replace("\"cycle\":2", "\"cycle\":3");

        let reconstructed =
            SignedObject::<SettleCycleRequest>::from_header_and_body(&header, tampered).unwrap();
        assert!(reconstructed.verify(KEY).is_err());
    }

    #[test]
    fn test_header_format_round_trip() {
        let header = format_signature_header(1_700_000_000, b"\x01\x02\x03");
        let (ts, sig) = parse_signature_header(&header).unwrap();
        assert_eq!(ts, 1_700_000_000);
        assert_eq!(sig.as_ref(), b"\x01\x02\x03");
    }

    #[test]
    fn test_malformed_headers_rejected() {
        assert!(matches!(
            parse_signature_header("not-a-header"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("123.!!!"),
            Err(SignatureError::InvalidBase64)
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let old = time::OffsetDateTime::now_utc().unix_timestamp() - MAX_SIGNATURE_AGE - 1;
        assert!(matches!(check_timestamp(old), Err(SignatureError::Expired)));
        let fresh = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(check_timestamp(fresh).is_ok());
    }
}
