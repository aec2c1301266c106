//! The entitlement state machine.
//!
//! Holds the single mutable [`EntitlementRecord`] behind one exclusive lock.
//! Activate, deactivate, and snapshot are mutually exclusive, short critical
//! sections; validation happens before the lock is taken and nothing
//! suspends or performs I/O while holding it.

use crate::code::{ActivationCode, CODE_PUBLIC_KEY};
use crate::error::{EntitlementError, EntitlementResult};
use crate::record::{EntitlementRecord, LicenseState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// A point-in-time view of the record plus its derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Derived license state.
    pub state: LicenseState,
    /// The activation code in force, if any.
    pub activation_code: Option<String>,
    /// When the activation lapses. Absent means it never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Applies activate/deactivate commands to the cluster's entitlement record
/// and derives live state on read.
#[derive(Debug)]
pub struct EntitlementStateMachine {
    verifying_key: [u8; 32],
    record: Mutex<EntitlementRecord>,
}

impl EntitlementStateMachine {
    /// Creates a state machine with no activation, verifying codes against
    /// the embedded production key.
    #[must_use]
    pub fn new() -> Self {
        Self::with_verifying_key(CODE_PUBLIC_KEY)
    }

    /// Creates a state machine verifying codes against a custom public key.
    /// Used for testing with a generated key pair.
    #[must_use]
    pub fn with_verifying_key(pub_key_bytes: [u8; 32]) -> Self {
        Self {
            verifying_key: pub_key_bytes,
            record: Mutex::new(EntitlementRecord::default()),
        }
    }

    /// Validates `code` and overwrites the record with it.
    ///
    /// Re-activation is always permitted regardless of current state; the
    /// last writer wins. On validation failure the record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCode`/`InvalidSignature` if `code` fails offline
    /// validation.
    pub fn activate(
        &self,
        code: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> EntitlementResult<()> {
        let parsed = ActivationCode::parse_with_key(code, &self.verifying_key)?;
        let mut record = self.lock()?;
        *record = EntitlementRecord {
            activation_code: Some(parsed.raw().to_string()),
            expires_at,
        };
        Ok(())
    }

    /// Clears the record.
    ///
    /// A no-op when nothing is active; calling it repeatedly succeeds every
    /// time.
    pub fn deactivate(&self) -> EntitlementResult<()> {
        let mut record = self.lock()?;
        *record = EntitlementRecord::default();
        Ok(())
    }

    /// Derives the current state from the record and the wall clock.
    ///
    /// Purely a function of stored data and the current time; no side
    /// effects, nothing cached across calls.
    pub fn snapshot(&self) -> EntitlementResult<StateSnapshot> {
        let record = self.lock()?;
        let state = record.state_at(Utc::now())?;
        Ok(StateSnapshot {
            state,
            activation_code: record.activation_code.clone(),
            expires_at: record.expires_at,
        })
    }

    fn lock(&self) -> EntitlementResult<MutexGuard<'_, EntitlementRecord>> {
        self.record.lock().map_err(|_| {
            EntitlementError::StateInconsistent("entitlement record lock poisoned".to_string())
        })
    }
}

impl Default for EntitlementStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
