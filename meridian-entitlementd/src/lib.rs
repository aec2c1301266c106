//! Entitlement RPC service and client for Meridian clusters.
//!
//! The service holds the cluster's single entitlement record and exposes
//! Activate/Deactivate/GetState over HTTP/JSON. License state is derived
//! from the stored record and the clock at read time, so a just-issued
//! mutation may take a moment to become visible to pollers going through a
//! lagging read path; callers converge with `meridian-backoff` around
//! [`Client::get_state`].

pub mod api;
pub mod client;

pub use api::{
    build_router, ActivateRequest, ApiError, EntitlementService, ErrorBody, ErrorDetail,
    GetStateResponse,
};
pub use client::{endpoint_from_env, Client, ClientError};
