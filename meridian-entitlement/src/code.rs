//! Activation code parsing and Ed25519 signature verification.
//!
//! Activation codes use the format: `base64url(payload).base64url(signature)`
//!
//! The payload is a JSON object containing:
//! - `sub`: licensed organization
//! - `token_id`: unique id for this issued code
//! - `iat`: issued-at timestamp (seconds since epoch)
//!
//! The signature covers `payload_b64.as_bytes()` (the base64url-encoded
//! payload string, not the decoded JSON), matching the issuing server.
//! Validation is entirely offline; no network is touched.

use crate::error::{EntitlementError, EntitlementResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedded Ed25519 public key for production code verification (32 bytes).
pub(crate) const CODE_PUBLIC_KEY: [u8; 32] = [
    234, 213, 212, 190, 201, 77, 38, 86, 221, 58, 245, 201, 248, 219, 35, 208,
    202, 108, 5, 186, 61, 125, 243, 110, 30, 151, 202, 67, 9, 183, 92, 245,
];

/// The decoded activation code payload (matches the issuing server's JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePayload {
    /// Licensed organization.
    pub sub: String,
    /// Unique id of this issued code.
    pub token_id: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
}

/// A parsed and signature-verified activation code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCode {
    /// The raw code string.
    raw: String,
    /// Decoded payload.
    payload: CodePayload,
}

impl ActivationCode {
    /// Parses and verifies an activation code using the embedded public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the code format is invalid or signature
    /// verification fails.
    pub fn parse(code: &str) -> EntitlementResult<Self> {
        Self::parse_with_key(code, &CODE_PUBLIC_KEY)
    }

    /// Parses and verifies an activation code using a custom public key.
    /// Used for testing with a generated key pair.
    pub fn parse_with_key(code: &str, pub_key_bytes: &[u8; 32]) -> EntitlementResult<Self> {
        let code = code.trim();

        // Split into payload and signature parts
        let parts: Vec<&str> = code.split('.').collect();
        if parts.len() != 2 {
            return Err(EntitlementError::InvalidCode(
                "code must have exactly two parts separated by a dot".to_string(),
            ));
        }

        let payload_b64 = parts[0];
        let signature_b64 = parts[1];

        // Decode signature
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| EntitlementError::InvalidCode(format!("invalid signature base64: {e}")))?;

        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| EntitlementError::InvalidCode("invalid signature length".to_string()))?;

        // Build verifying key
        let verifying_key = VerifyingKey::from_bytes(pub_key_bytes)
            .map_err(|_| EntitlementError::InvalidCode("invalid public key".to_string()))?;

        // Verify signature over the base64url-encoded payload bytes
        verifying_key
            .verify(payload_b64.as_bytes(), &signature)
            .map_err(|_| EntitlementError::InvalidSignature)?;

        // Decode payload JSON
        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| EntitlementError::InvalidCode(format!("invalid payload base64: {e}")))?;

        let payload: CodePayload = serde_json::from_slice(&payload_json)
            .map_err(|e| EntitlementError::InvalidCode(format!("invalid payload JSON: {e}")))?;

        Ok(Self {
            raw: code.to_string(),
            payload,
        })
    }

    /// Returns the raw code string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the decoded payload.
    #[must_use]
    pub fn payload(&self) -> &CodePayload {
        &self.payload
    }

    /// Returns the licensed organization.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.payload.sub
    }

    /// Returns the issued-at timestamp (seconds since epoch).
    #[must_use]
    pub fn issued_at_secs(&self) -> i64 {
        self.payload.iat
    }
}
