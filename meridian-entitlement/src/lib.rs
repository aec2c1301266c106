//! Enterprise entitlement for Meridian clusters.
//!
//! This crate holds:
//! - Activation code validation via Ed25519 signature verification
//! - The single-record entitlement state machine
//! - Derived license state (none/active/expired) computed at read time
//!
//! # Design Principles
//!
//! - **Offline validation**: codes are verified structurally and
//!   cryptographically without network calls
//! - **Derived state**: license state is recomputed from the stored record
//!   and the clock on every read; nothing schedules expiry
//! - **Last writer wins**: re-activation always overwrites the record, from
//!   any state
//! - **Idempotent deactivation**: clearing an already-empty record succeeds
//!
//! # Activation Code Format
//!
//! Codes are formatted as: `base64url(payload).base64url(signature)`
//! The payload is a JSON object signed with Ed25519, containing the licensed
//! organization, a token id, and an issued-at timestamp.

mod code;
mod error;
mod machine;
mod record;

pub use code::{ActivationCode, CodePayload};
pub use error::{EntitlementError, EntitlementResult};
pub use machine::{EntitlementStateMachine, StateSnapshot};
pub use record::{EntitlementRecord, LicenseState};
