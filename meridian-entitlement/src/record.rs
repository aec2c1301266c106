//! The entitlement record and derived license state.

use crate::error::{EntitlementError, EntitlementResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived license status of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LicenseState {
    /// Never activated, or deactivated since.
    None,
    /// Valid, unexpired activation.
    Active,
    /// Previously active, past expiry.
    Expired,
}

/// The single mutable entitlement record.
///
/// State is never stored; it is derived from these two fields against the
/// clock at read time, so expiry needs no background sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// The activation code in force, if any.
    pub activation_code: Option<String>,
    /// When the activation lapses. Absent means it never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Derives the license state as of `now`.
    ///
    /// An expiry exactly equal to `now` counts as expired.
    ///
    /// # Errors
    ///
    /// Returns `StateInconsistent` for a record carrying an expiry without a
    /// code, a shape no state maps to.
    pub fn state_at(&self, now: DateTime<Utc>) -> EntitlementResult<LicenseState> {
        match (&self.activation_code, self.expires_at) {
            (None, None) => Ok(LicenseState::None),
            (None, Some(expires_at)) => Err(EntitlementError::StateInconsistent(format!(
                "record has expiry {expires_at} but no activation code"
            ))),
            (Some(_), None) => Ok(LicenseState::Active),
            (Some(_), Some(expires_at)) => {
                if expires_at > now {
                    Ok(LicenseState::Active)
                } else {
                    Ok(LicenseState::Expired)
                }
            }
        }
    }
}
