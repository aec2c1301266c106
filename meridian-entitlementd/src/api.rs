//! HTTP/JSON surface of the entitlement service.
//!
//! Every handler is a self-contained atomic transaction against the record;
//! the internal lock is never exposed and nothing network-bound happens
//! inside a critical section.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use meridian_entitlement::{EntitlementError, EntitlementStateMachine, LicenseState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Request body for `POST /api/v1/license/activate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateRequest {
    /// The opaque activation code.
    pub activation_code: String,
    /// When the activation lapses. Absent means it never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Response body for `GET /api/v1/license/state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStateResponse {
    /// Derived license state.
    pub state: LicenseState,
    /// The activation code in force; empty when state is NONE.
    #[serde(default)]
    pub activation_code: String,
    /// When the activation lapses; null when it never expires.
    pub expires: Option<DateTime<Utc>>,
}

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "INVALID_CODE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// RPC-facing façade over the state machine.
///
/// Cheap to clone; every clone shares the one record.
#[derive(Debug, Clone)]
pub struct EntitlementService {
    machine: Arc<EntitlementStateMachine>,
}

impl EntitlementService {
    /// Wraps a state machine for serving.
    #[must_use]
    pub fn new(machine: EntitlementStateMachine) -> Self {
        Self {
            machine: Arc::new(machine),
        }
    }

    /// Validates `code` and overwrites the record. Re-activation always
    /// wins, from any state.
    pub fn activate(
        &self,
        code: &str,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), EntitlementError> {
        self.machine.activate(code, expires)
    }

    /// Clears the record. Succeeds even when nothing is active.
    pub fn deactivate(&self) -> Result<(), EntitlementError> {
        self.machine.deactivate()
    }

    /// Derives the current state from the record.
    pub fn state(&self) -> Result<GetStateResponse, EntitlementError> {
        let snapshot = self.machine.snapshot()?;
        Ok(GetStateResponse {
            state: snapshot.state,
            activation_code: snapshot.activation_code.unwrap_or_default(),
            expires: snapshot.expires_at,
        })
    }
}

/// Error surface of the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Activation code failed offline validation (400). Never retryable.
    #[error("invalid activation code: {0}")]
    InvalidCode(String),

    /// Internal invariant violation (500). Logged; details are not returned
    /// to the client.
    #[error("entitlement state inconsistent: {0}")]
    StateInconsistent(String),
}

impl ApiError {
    /// Returns the HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidCode(_) => (StatusCode::BAD_REQUEST, "INVALID_CODE"),
            Self::StateInconsistent(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STATE_INCONSISTENT")
            }
        }
    }
}

impl From<EntitlementError> for ApiError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::InvalidCode(_) | EntitlementError::InvalidSignature => {
                Self::InvalidCode(err.to_string())
            }
            EntitlementError::StateInconsistent(msg) => Self::StateInconsistent(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Invariant violations are defects: log them, hide the details.
        let message = match &self {
            Self::StateInconsistent(_) => {
                tracing::error!(error = %self, "entitlement invariant violated");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

async fn activate_handler(
    State(service): State<EntitlementService>,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.activate(&req.activation_code, req.expires)?;
    tracing::info!(expires = ?req.expires, "cluster activated");
    Ok(Json(serde_json::json!({})))
}

async fn deactivate_handler(
    State(service): State<EntitlementService>,
) -> Result<Json<serde_json::Value>, ApiError> {
    service.deactivate()?;
    tracing::info!("cluster deactivated");
    Ok(Json(serde_json::json!({})))
}

async fn state_handler(
    State(service): State<EntitlementService>,
) -> Result<Json<GetStateResponse>, ApiError> {
    Ok(Json(service.state()?))
}

async fn healthz_handler() -> &'static str {
    "ok"
}

/// Build the HTTP API router with the given service state.
pub fn build_router(service: EntitlementService) -> Router {
    Router::new()
        .route("/api/v1/healthz", get(healthz_handler))
        .route("/api/v1/license/activate", post(activate_handler))
        .route("/api/v1/license/deactivate", post(deactivate_handler))
        .route("/api/v1/license/state", get(state_handler))
        .with_state(service)
}
