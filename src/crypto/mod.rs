// ABOUTME: Cryptographic utilities for the SSO broker
// ABOUTME: Provides random token material and the signed-envelope codec
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Cryptographic utilities: random token material and signed envelopes

use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};

pub mod signing;

pub use signing::{CodecError, SignedCodec};

/// Generate `num_bytes` of OS randomness, URL-safe base64 encoded.
///
/// Used for opaque handoff token strings and per-record nonces; callers pick
/// the width (minimum 128 bits for anything acting as a lookup key).
#[must_use]
pub fn random_urlsafe(num_bytes: usize) -> String {
    use rand::RngCore;

    let mut rng = rand::rngs::OsRng;
    let mut bytes = vec![0u8; num_bytes];
    rng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a random signing key.
///
/// # Errors
/// Returns an error if the system RNG fails - the broker cannot operate
/// securely without working randomness.
pub fn generate_signing_key(num_bytes: usize) -> Result<Vec<u8>> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut key = vec![0u8; num_bytes];

    rng.fill(&mut key).map_err(|e| {
        tracing::error!("CRITICAL: failed to generate signing key from system RNG: {e}");
        anyhow::anyhow!("System RNG failure - cannot generate signing key")
    })?;

    Ok(key)
}
