//! Shared test helpers for entitlement tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signer, SigningKey};
use uuid::Uuid;

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> (SigningKey, [u8; 32]) {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    let signing_key = SigningKey::from_bytes(&seed);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key.to_bytes())
}

/// Creates a signed activation code string:
/// `base64url(payload_json).base64url(signature)`.
/// Signs over the base64url-encoded payload bytes (matching the issuing
/// server behavior).
pub fn sign_code(signing_key: &SigningKey, payload_json: &str) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signature = signing_key.sign(payload_b64.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature.to_bytes());
    format!("{payload_b64}.{sig_b64}")
}

/// Creates a signed code with a standard payload for the given subject.
pub fn make_code(signing_key: &SigningKey, sub: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let token_id = Uuid::new_v4();
    let payload =
        format!(r#"{{"sub":"{sub}","token_id":"{token_id}","iat":{now}}}"#);
    sign_code(signing_key, &payload)
}
