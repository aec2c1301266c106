//! Typed client for the entitlement service.
//!
//! The client wraps a pooled `reqwest::Client`: connection setup is a
//! one-time acquisition, so construct one handle and reuse it. Pass the
//! handle to callers explicitly rather than hiding it in process-global
//! state.

use crate::api::{ActivateRequest, ErrorBody, GetStateResponse};
use chrono::{DateTime, Utc};
use std::env;
use thiserror::Error;

/// In-cluster service discovery host variable.
const SERVICE_HOST_ENV: &str = "ENTITLEMENTD_SERVICE_HOST";
/// In-cluster service discovery port variable.
const SERVICE_PORT_ENV: &str = "ENTITLEMENTD_SERVICE_PORT";
/// Default service port, used when discovery only supplies a host.
const DEFAULT_PORT: u16 = 9600;
/// External development endpoint used when not running in a cluster.
const DEV_ENDPOINT: &str = "http://localhost:9600";

/// Errors from the entitlement client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the activation code. Not retryable.
    #[error("invalid activation code: {0}")]
    InvalidCode(String),

    /// The service or transport was unreachable. Retryable by the caller.
    #[error("entitlement service unavailable: {0}")]
    Unavailable(String),

    /// A response the client does not understand.
    #[error("unexpected response from entitlement service ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

impl ClientError {
    /// Returns true if retrying the call may plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Picks the service endpoint from the environment: in-cluster service
/// discovery variables when present, the development endpoint otherwise.
#[must_use]
pub fn endpoint_from_env() -> String {
    match (env::var(SERVICE_HOST_ENV), env::var(SERVICE_PORT_ENV)) {
        (Ok(host), Ok(port)) => format!("http://{host}:{port}"),
        (Ok(host), Err(_)) => format!("http://{host}:{DEFAULT_PORT}"),
        _ => DEV_ENDPOINT.to_string(),
    }
}

/// Handle to the entitlement service.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a client for an explicit endpoint, e.g. `http://host:9600`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Creates a client for the endpoint selected by [`endpoint_from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(endpoint_from_env())
    }

    /// Returns the endpoint this client targets.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Activates the cluster with `code`, optionally bounded by `expires`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCode` if the service rejects the code, or
    /// `Unavailable` if it cannot be reached.
    pub async fn activate(
        &self,
        code: &str,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), ClientError> {
        let req = ActivateRequest {
            activation_code: code.to_string(),
            expires,
        };
        let resp = self
            .http
            .post(self.url("/api/v1/license/activate"))
            .json(&req)
            .send()
            .await?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    /// Deactivates the cluster. Succeeds even when nothing is active.
    pub async fn deactivate(&self) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/api/v1/license/deactivate"))
            .send()
            .await?;
        Self::expect_ok(resp).await?;
        Ok(())
    }

    /// Fetches the derived license state.
    pub async fn get_state(&self) -> Result<GetStateResponse, ClientError> {
        let resp = self.http.get(self.url("/api/v1/license/state")).send().await?;
        let resp = Self::expect_ok(resp).await?;
        Ok(resp.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps non-2xx responses to client errors. 5xx classifies as
    /// transient; 4xx is terminal.
    async fn expect_ok(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status.is_server_error() {
            return Err(ClientError::Unavailable(format!(
                "server error: HTTP {}",
                status.as_u16()
            )));
        }
        let (code, message) = match resp.json::<ErrorBody>().await {
            Ok(body) => (body.error.code, body.error.message),
            Err(_) => (String::new(), format!("HTTP {}", status.as_u16())),
        };
        if code == "INVALID_CODE" {
            Err(ClientError::InvalidCode(message))
        } else {
            Err(ClientError::Unexpected {
                status: status.as_u16(),
                message,
            })
        }
    }
}
