mod common;

use anyhow::bail;
use chrono::{Duration, Utc};
use common::{make_code, test_keypair};
use meridian_backoff::{retry, BackoffPolicy, RetryError};
use meridian_entitlement::{EntitlementStateMachine, LicenseState};
use meridian_entitlementd::{build_router, Client, ClientError, EntitlementService};

/// Spin up the license API on an OS-assigned port, returning a client for it.
async fn spawn_test_server(pub_key: [u8; 32]) -> Client {
    let service = EntitlementService::new(EntitlementStateMachine::with_verifying_key(pub_key));
    let app = build_router(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Client::new(format!("http://127.0.0.1:{}", port))
}

/// Polls until the derived state matches `want`, returning the final
/// response. Reads may lag a just-issued mutation, so convergence goes
/// through the backoff executor.
async fn await_state(
    client: &Client,
    want: LicenseState,
) -> meridian_entitlementd::GetStateResponse {
    retry(&BackoffPolicy::testing(), || async {
        let resp = client.get_state().await?;
        if resp.state != want {
            bail!("expected license state to be {:?} but was {:?}", want, resp.state);
        }
        Ok(resp)
    })
    .await
    .unwrap()
}

// ── Lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_server_reports_none() {
    let (_, pk) = test_keypair();
    let client = spawn_test_server(pk).await;

    let resp = client.get_state().await.unwrap();
    assert_eq!(resp.state, LicenseState::None);
    assert!(resp.activation_code.is_empty());
    assert!(resp.expires.is_none());
}

#[tokio::test]
async fn activate_converges_to_active() {
    let (sk, pk) = test_keypair();
    let client = spawn_test_server(pk).await;
    let code = make_code(&sk, "acme-corp");

    client.activate(&code, None).await.unwrap();

    let resp = await_state(&client, LicenseState::Active).await;
    assert_eq!(resp.activation_code, code);
    // No expiry requested: the activation never lapses.
    assert!(resp.expires.is_none());
}

#[tokio::test]
async fn forced_expiry_converges_to_expired() {
    let (sk, pk) = test_keypair();
    let client = spawn_test_server(pk).await;
    let code = make_code(&sk, "acme-corp");

    client.activate(&code, None).await.unwrap();
    await_state(&client, LicenseState::Active).await;

    // Re-activate with an expiry already in the past.
    let expires = Utc::now() - Duration::seconds(30);
    client.activate(&code, Some(expires)).await.unwrap();

    let resp = await_state(&client, LicenseState::Expired).await;
    assert_eq!(resp.activation_code, code);
    // The expiry round-trips at second precision.
    assert_eq!(resp.expires.unwrap().timestamp(), expires.timestamp());
}

#[tokio::test]
async fn deactivate_lands_none() {
    let (sk, pk) = test_keypair();
    let client = spawn_test_server(pk).await;

    client
        .activate(&make_code(&sk, "acme-corp"), None)
        .await
        .unwrap();
    await_state(&client, LicenseState::Active).await;

    client.deactivate().await.unwrap();
    await_state(&client, LicenseState::None).await;
}

#[tokio::test]
async fn double_deactivate_succeeds() {
    let (_, pk) = test_keypair();
    let client = spawn_test_server(pk).await;

    // Deactivate with no token in place.
    client.deactivate().await.unwrap();
    await_state(&client, LicenseState::None).await;

    // Deactivating again must also succeed.
    client.deactivate().await.unwrap();
    let resp = client.get_state().await.unwrap();
    assert_eq!(resp.state, LicenseState::None);
}

#[tokio::test]
async fn full_license_lifecycle() {
    let (sk, pk) = test_keypair();
    let client = spawn_test_server(pk).await;
    let code = make_code(&sk, "e2e");

    // Activate without expiry: converges to ACTIVE with the code echoed.
    client.activate(&code, None).await.unwrap();
    let resp = await_state(&client, LicenseState::Active).await;
    assert_eq!(resp.activation_code, code);
    assert!(resp.expires.is_none());

    // Force expiry 30s in the past: converges to EXPIRED, expiry preserved.
    let expires = Utc::now() - Duration::seconds(30);
    client.activate(&code, Some(expires)).await.unwrap();
    let resp = await_state(&client, LicenseState::Expired).await;
    assert_eq!(resp.activation_code, code);
    assert_eq!(resp.expires.unwrap().timestamp(), expires.timestamp());

    // Deactivate twice: NONE both times, no error either time.
    client.deactivate().await.unwrap();
    await_state(&client, LicenseState::None).await;
    client.deactivate().await.unwrap();
    assert_eq!(client.get_state().await.unwrap().state, LicenseState::None);
}

// ── Validation ───────────────────────────────────────────────────

#[tokio::test]
async fn invalid_code_rejected_immediately() {
    let (_, pk) = test_keypair();
    let client = spawn_test_server(pk).await;

    let err = client.activate("not-a-real-code", None).await.unwrap_err();
    match &err {
        ClientError::InvalidCode(msg) => assert!(msg.contains("activation code")),
        other => panic!("expected InvalidCode, got {other:?}"),
    }
    assert!(!err.is_transient());

    // Rejected activation leaves the record untouched.
    let resp = client.get_state().await.unwrap();
    assert_eq!(resp.state, LicenseState::None);
}

#[tokio::test]
async fn code_signed_with_wrong_key_rejected() {
    let (sk, _) = test_keypair();
    let other_seed: [u8; 32] = [7; 32];
    let other_pk = ed25519_dalek::SigningKey::from_bytes(&other_seed)
        .verifying_key()
        .to_bytes();
    let client = spawn_test_server(other_pk).await;

    let err = client
        .activate(&make_code(&sk, "acme-corp"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidCode(_)));
}

// ── Transport ────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_service_is_transient() {
    // Nothing listens on this port.
    let client = Client::new("http://127.0.0.1:9");
    let err = client.get_state().await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}

#[tokio::test]
async fn polling_an_unreachable_service_exhausts() {
    let client = Client::new("http://127.0.0.1:9");
    let policy = BackoffPolicy {
        max_attempts: Some(2),
        ..BackoffPolicy::testing()
    };
    let result = retry(&policy, || async { client.get_state().await }).await;
    match result {
        Err(RetryError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(last.is_transient());
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

// ── Routes ───────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_responds() {
    let (_, pk) = test_keypair();
    let client = spawn_test_server(pk).await;
    let resp = reqwest::get(format!("{}/api/v1/healthz", client.base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (_, pk) = test_keypair();
    let client = spawn_test_server(pk).await;
    let resp = reqwest::get(format!("{}/api/v1/nonexistent", client.base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
