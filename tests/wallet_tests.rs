//! HTTP wallet client against a local fake provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use croupier::adapter::outbound::wallet::HttpWalletClient;
use croupier::domain::ProviderType;
use croupier::error::ExternalWalletError;
use croupier::port::outbound::wallet::WalletClient;
use croupier::testkit::domain::credential;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone, Default)]
struct Seen {
    calls: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

/// Serve `reply` at `/wallet/balance` and return the base URL.
async fn provider(reply: (StatusCode, Value), seen: Seen) -> Url {
    let app = Router::new()
        .route(
            "/wallet/balance",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.calls.lock().push((auth, body));
                        (reply.0, Json(reply.1))
                    }
                },
            ),
        )
        .with_state(seen);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/wallet")).unwrap()
}

fn client(base: Url) -> HttpWalletClient {
    HttpWalletClient::new(
        HashMap::from([(ProviderType::Evolution, base)]),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn balance_is_queried_with_root_credential() {
    let seen = Seen::default();
    let base = provider((StatusCode::OK, json!({ "balance": "120.50" })), seen.clone()).await;

    let balance = client(base)
        .balance(&credential("root", ProviderType::Evolution), "ext-u-1")
        .await
        .unwrap();

    assert_eq!(balance, dec!(120.50));
    let calls = seen.calls.lock().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_deref(), Some("Bearer token-root"));
    assert_eq!(
        calls[0].1,
        json!({ "operator_code": "op-root", "username": "ext-u-1" })
    );
}

#[tokio::test]
async fn provider_error_body_is_rejected() {
    let base = provider(
        (StatusCode::OK, json!({ "error": "unknown player" })),
        Seen::default(),
    )
    .await;

    let err = client(base)
        .balance(&credential("root", ProviderType::Evolution), "ext-u-1")
        .await
        .unwrap_err();

    assert_eq!(err, ExternalWalletError::Rejected("unknown player".to_string()));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base = provider(
        (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        Seen::default(),
    )
    .await;

    let err = client(base)
        .balance(&credential("root", ProviderType::Evolution), "ext-u-1")
        .await
        .unwrap_err();

    assert_eq!(err, ExternalWalletError::Status(503));
}

#[tokio::test]
async fn unreachable_provider_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(Url::parse(&format!("http://{addr}/wallet")).unwrap())
        .balance(&credential("root", ProviderType::Evolution), "ext-u-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ExternalWalletError::Request(_)));
}
