// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` parameter.
//!
//! Wire format: URL-safe base64 (no padding) of `nonce|timestamp_hex|signature_hex`,
//! where the signature is HMAC-SHA256 over `nonce|timestamp_hex`. The nonce is
//! also set as an HttpOnly cookie at login and must match on callback.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// How long a user may spend on Google's consent screen.
pub const STATE_MAX_AGE: Duration = Duration::from_secs(10 * 60);

const NONCE_BYTES: usize = 16;

/// Generate a random URL-safe nonce.
pub fn generate_nonce() -> anyhow::Result<String> {
    let mut bytes = [0u8; NONCE_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("System RNG failure"))?;
    Ok(hex::encode(bytes))
}

/// Build a signed state for `nonce` issued at `now_millis`.
pub fn sign_state(nonce: &str, now_millis: u128, secret: &[u8]) -> anyhow::Result<String> {
    let payload = format!("{}|{:x}", nonce, now_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature, age and nonce binding. Returns `false` on any mismatch.
pub fn verify_state(
    state: &str,
    expected_nonce: &str,
    now_millis: u128,
    secret: &[u8],
) -> bool {
    let Some((nonce, issued_at)) = decode_verified(state, secret) else {
        return false;
    };

    if nonce.is_empty() || nonce != expected_nonce {
        tracing::warn!("OAuth state nonce does not match cookie");
        return false;
    }

    // Allow a little clock skew between instances.
    let max_age = STATE_MAX_AGE.as_millis();
    if issued_at > now_millis + 60_000 || now_millis.saturating_sub(issued_at) > max_age {
        tracing::warn!("OAuth state expired");
        return false;
    }

    true
}

/// Decode the state and check its signature, returning `(nonce, issued_at_millis)`.
fn decode_verified(state: &str, secret: &[u8]) -> Option<(String, u128)> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let (nonce, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2]);
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", nonce, timestamp_hex).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    Some((nonce.to_string(), issued_at))
}
