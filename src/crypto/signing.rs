// ABOUTME: Tamper-evident signed envelope codec with TTL enforcement
// ABOUTME: HMAC-SHA256 over (domain salt, payload, issue time); decoding is not consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Signed-envelope codec.
//!
//! A [`SignedCodec`] turns a serializable payload into a compact signed
//! string `payload_b64.issued_at.sig_b64` and verifies it back within a
//! maximum age. The signature proves the envelope was issued by this broker
//! under one signing domain and is within its TTL window; it says nothing
//! about whether an underlying store record has been redeemed. Single-use
//! semantics live entirely in the token store.
//!
//! The SSO handoff and activation domains each get their own codec instance
//! with an independent key and salt, so compromise of one domain cannot
//! forge envelopes for the other.

use chrono::{Duration, Utc};
use ring::hmac;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use base64::{engine::general_purpose, Engine as _};

/// Errors produced by envelope encoding and decoding
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload serialization failed; should not occur for well-typed payloads
    #[error("payload serialization failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Envelope malformed or its signature failed verification
    #[error("envelope signature invalid")]
    SignatureInvalid,

    /// Signature verified but the envelope is older than the allowed age
    #[error("envelope expired {expired_for_secs}s past its allowed age")]
    SignatureExpired {
        /// Seconds the envelope has outlived its maximum age
        expired_for_secs: i64,
    },
}

/// Signed-envelope codec bound to one signing domain
pub struct SignedCodec {
    key: hmac::Key,
    salt: &'static str,
}

impl SignedCodec {
    /// Create a codec for one signing domain.
    ///
    /// `salt` separates the MAC input per domain; keys must additionally be
    /// unique per domain.
    #[must_use]
    pub fn new(key_bytes: &[u8], salt: &'static str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, key_bytes),
            salt,
        }
    }

    /// Serialize and sign `payload`, stamping the current issue time.
    ///
    /// # Errors
    /// Returns [`CodecError::Encoding`] only if payload serialization fails.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, CodecError> {
        let json = serde_json::to_vec(payload)?;
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(json);
        let issued_at = Utc::now().timestamp();

        let tag = hmac::sign(&self.key, &self.mac_input(&payload_b64, issued_at));
        let sig_b64 = general_purpose::URL_SAFE_NO_PAD.encode(tag.as_ref());

        Ok(format!("{payload_b64}.{issued_at}.{sig_b64}"))
    }

    /// Verify `signed` and deserialize its payload.
    ///
    /// Side-effect free; safe to call any number of times. The signature is
    /// checked before the age so tampered timestamps cannot reach the expiry
    /// comparison.
    ///
    /// # Errors
    /// Returns [`CodecError::SignatureInvalid`] on any malformed or tampered
    /// input, [`CodecError::SignatureExpired`] when the envelope is older
    /// than `max_age`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        signed: &str,
        max_age: Duration,
    ) -> Result<T, CodecError> {
        let mut parts = signed.split('.');
        let (Some(payload_b64), Some(ts), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CodecError::SignatureInvalid);
        };

        let issued_at: i64 = ts.parse().map_err(|_| CodecError::SignatureInvalid)?;
        let sig = general_purpose::URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| CodecError::SignatureInvalid)?;

        hmac::verify(&self.key, &self.mac_input(payload_b64, issued_at), &sig)
            .map_err(|_| CodecError::SignatureInvalid)?;

        let age = Utc::now().timestamp() - issued_at;
        if age > max_age.num_seconds() {
            return Err(CodecError::SignatureExpired {
                expired_for_secs: age - max_age.num_seconds(),
            });
        }

        let json = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| CodecError::SignatureInvalid)?;
        // A verified envelope that fails to deserialize was signed for a
        // different payload shape; report it as invalid, not as encoding.
        serde_json::from_slice(&json).map_err(|_| CodecError::SignatureInvalid)
    }

    fn mac_input(&self, payload_b64: &str, issued_at: i64) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.salt.len() + payload_b64.len() + 24);
        input.extend_from_slice(self.salt.as_bytes());
        input.push(0);
        input.extend_from_slice(payload_b64.as_bytes());
        input.push(b'.');
        input.extend_from_slice(issued_at.to_string().as_bytes());
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Payload {
        token: String,
        nonce: String,
    }

    fn payload() -> Payload {
        Payload {
            token: "tok-123".into(),
            nonce: "nonce-456".into(),
        }
    }

    #[test]
    fn test_round_trip_within_max_age() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");
        let signed = codec.encode(&payload()).unwrap();

        let decoded: Payload = codec.decode(&signed, Duration::seconds(300)).unwrap();
        assert_eq!(decoded, payload());
    }

    #[test]
    fn test_decode_is_repeatable() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");
        let signed = codec.encode(&payload()).unwrap();

        for _ in 0..3 {
            let decoded: Payload = codec.decode(&signed, Duration::seconds(300)).unwrap();
            assert_eq!(decoded.token, "tok-123");
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");
        let other = SignedCodec::new(b"ffffffffffffffffffffffffffffffff", "sso.handoff");
        let signed = codec.encode(&payload()).unwrap();

        let result: Result<Payload, _> = other.decode(&signed, Duration::seconds(300));
        assert!(matches!(result, Err(CodecError::SignatureInvalid)));
    }

    #[test]
    fn test_wrong_salt_rejected() {
        let key = b"0123456789abcdef0123456789abcdef";
        let sso = SignedCodec::new(key, "sso.handoff");
        let activation = SignedCodec::new(key, "accounts.activation");
        let signed = sso.encode(&payload()).unwrap();

        let result: Result<Payload, _> = activation.decode(&signed, Duration::seconds(300));
        assert!(matches!(result, Err(CodecError::SignatureInvalid)));
    }

    #[test]
    fn test_garbage_input_rejected() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");

        for garbage in ["", "a", "a.b", "a.b.c.d", "!!.12.**"] {
            let result: Result<Payload, _> = codec.decode(garbage, Duration::seconds(300));
            assert!(matches!(result, Err(CodecError::SignatureInvalid)), "{garbage}");
        }
    }

    #[test]
    fn test_expired_envelope_rejected() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");
        let signed = codec.encode(&payload()).unwrap();

        let result: Result<Payload, _> = codec.decode(&signed, Duration::seconds(-1));
        assert!(matches!(result, Err(CodecError::SignatureExpired { .. })));
    }

    #[test]
    fn test_tampered_timestamp_rejected_as_invalid() {
        let codec = SignedCodec::new(b"0123456789abcdef0123456789abcdef", "sso.handoff");
        let signed = codec.encode(&payload()).unwrap();

        let mut parts: Vec<&str> = signed.split('.').collect();
        let bumped = format!("{}", parts[1].parse::<i64>().unwrap() + 9999);
        parts[1] = &bumped;
        let tampered = parts.join(".");

        let result: Result<Payload, _> = codec.decode(&tampered, Duration::seconds(300));
        assert!(matches!(result, Err(CodecError::SignatureInvalid)));
    }
}
