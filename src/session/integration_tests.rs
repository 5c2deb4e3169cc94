//! End-to-end handshakes: adapter, relay client, relay server and a fake
//! OAuth token endpoint, all in-process.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::json;
use url::Url;

use crate::auth::{Authenticator, HandshakeStatus, SetupOptions};
use crate::config::{ClientConfig, RelayConfig};
use crate::create_provider;
use crate::exchange::{ExchangeError, MOCK_ACCESS_TOKEN, RelayClient, TokenExchange};
use crate::overrides::{LaunchParams, MemoryStore, SessionStore};
use crate::relay::{RelayState, create_router};
use crate::sdk::transport::CommandFrame;
use crate::sdk::{
    AuthenticatedSession, BridgeFrame, BridgeTransport, ChannelTransport, HostSdk,
    MOCK_AUTHORIZATION_CODE, SdkMode, select_sdk,
};
use crate::session::SessionProvider;
use crate::types::{AccessToken, AuthorizationCode};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// OAuth endpoint that grants `tok-<code>` for codes it could have issued.
///
/// Like the real provider it has never heard of `mock_code`.
async fn spawn_upstream() -> String {
    let router = Router::new().route(
        "/token",
        post(|Form(form): Form<HashMap<String, String>>| async move {
            match form.get("code").map(String::as_str) {
                Some("revoked") | Some(MOCK_AUTHORIZATION_CODE) | None => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant" })),
                ),
                Some(code) => (
                    StatusCode::OK,
                    Json(json!({ "access_token": format!("tok-{}", code) })),
                ),
            }
        }),
    );
    format!("{}/token", spawn(router).await)
}

/// Relay in front of the fake upstream. Returns the relay origin.
async fn spawn_relay() -> Url {
    let config = RelayConfig::new("client", "secret").with_token_url(spawn_upstream().await);
    let origin = spawn(create_router(RelayState::new(config).unwrap())).await;
    Url::parse(&origin).unwrap()
}

fn provider(sdk: Arc<dyn HostSdk>, relay: &Url) -> SessionProvider {
    let exchange = Arc::new(RelayClient::for_origin(relay).unwrap());
    let auth = Authenticator::new(ClientConfig::new("client").client_id, sdk, exchange);
    SessionProvider::new(auth, SetupOptions::authenticated(None))
}

#[tokio::test]
async fn test_mock_handshake_reaches_ready_without_relay() {
    let relay = spawn_relay().await;
    let params = LaunchParams::from_query("user_id=abcd1234&guild_id=g1");
    let storage: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

    let p = create_provider(
        &params,
        &ClientConfig::new("client"),
        storage.clone(),
        SetupOptions::authenticated(None),
        || panic!("mock run must not connect"),
        || {
            let exchange: Arc<dyn TokenExchange> = Arc::new(RelayClient::for_origin(&relay)?);
            Ok(exchange)
        },
    )
    .unwrap();
    assert!(p.mount().await);

    let ctx = p.wait_until_settled().await;
    assert_eq!(ctx.status(), HandshakeStatus::Ready, "error: {:?}", ctx.error());
    assert_eq!(ctx.sdk_mode(), SdkMode::Mock);
    assert_eq!(ctx.access_token().unwrap().as_str(), MOCK_ACCESS_TOKEN);

    let session = ctx.session().unwrap();
    assert_eq!(session.user.id, "abcd1234");
    assert_eq!(session.user.discriminator, "2");
    assert_eq!(session.access_token.as_str(), MOCK_ACCESS_TOKEN);

    // Channel id was generated and stored for the tab.
    assert_eq!(storage.get("channel_id").map(|v| v.len()), Some(8));
}

#[tokio::test]
async fn test_mock_code_is_rejected_by_relay() {
    let relay = spawn_relay().await;
    let client = RelayClient::for_origin(&relay).unwrap();

    let err = client
        .exchange(&AuthorizationCode::new(MOCK_AUTHORIZATION_CODE))
        .await
        .unwrap_err();
    assert_eq!(err, ExchangeError::Status(502));
}

#[tokio::test]
async fn test_live_handshake_through_relay() {
    let relay = spawn_relay().await;
    let (client, host) = ChannelTransport::pair();
    let params = LaunchParams::from_query("frame_id=frame-1");
    let sdk = select_sdk(
        &params,
        &ClientConfig::new("client"),
        Arc::new(MemoryStore::new()),
        move || Arc::new(client),
    );
    assert_eq!(sdk.mode(), SdkMode::Live);

    let host_task = tokio::spawn(async move {
        let mut authenticated_with = None;
        loop {
            let frame = match host.recv().await {
                Ok(frame) => frame,
                Err(_) => break,
            };
            let reply = match frame {
                BridgeFrame::Handshake { frame_id, .. } => {
                    assert_eq!(frame_id.as_str(), "frame-1");
                    CommandFrame {
                        cmd: "DISPATCH".to_string(),
                        evt: Some("READY".to_string()),
                        ..Default::default()
                    }
                }
                BridgeFrame::Frame(cmd) if cmd.cmd == "AUTHORIZE" => CommandFrame {
                    cmd: cmd.cmd,
                    nonce: cmd.nonce,
                    data: Some(json!({ "code": "live-code" })),
                    ..Default::default()
                },
                BridgeFrame::Frame(cmd) if cmd.cmd == "AUTHENTICATE" => {
                    let token = cmd.args.as_ref().unwrap()["access_token"]
                        .as_str()
                        .unwrap()
                        .to_string();
                    authenticated_with = Some(token.clone());
                    CommandFrame {
                        cmd: cmd.cmd,
                        nonce: cmd.nonce,
                        data: Some(json!({
                            "access_token": token,
                            "user": {
                                "id": "42",
                                "username": "host-user",
                                "discriminator": "0",
                                "avatar": null,
                                "public_flags": 0
                            },
                            "scopes": ["identify", "guilds"],
                            "expires": "2030-01-01T00:00:00+00:00",
                            "application": {
                                "id": "app",
                                "name": "Activity",
                                "icon": null,
                                "description": ""
                            }
                        })),
                        ..Default::default()
                    }
                }
                other => panic!("unexpected frame {:?}", other),
            };
            if host.send(BridgeFrame::Frame(reply)).await.is_err() {
                break;
            }
            if authenticated_with.is_some() {
                break;
            }
        }
        authenticated_with
    });

    let p = provider(sdk, &relay);
    p.mount().await;
    let ctx = p.wait_until_settled().await;

    assert_eq!(ctx.status(), HandshakeStatus::Ready, "error: {:?}", ctx.error());
    assert_eq!(host_task.await.unwrap().as_deref(), Some("tok-live-code"));

    let session: &AuthenticatedSession = ctx.session().unwrap();
    assert_eq!(session.user.username, "host-user");
    assert_eq!(session.scopes, vec!["identify".to_string(), "guilds".to_string()]);
    assert_eq!(ctx.access_token(), Some(&AccessToken::new("tok-live-code")));
}

#[tokio::test]
async fn test_unreachable_relay_surfaces_error() {
    // Bind then drop so nothing listens on the port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let relay = Url::parse(&format!("http://{}", addr)).unwrap();

    let sdk = select_sdk(
        &LaunchParams::default(),
        &ClientConfig::new("client"),
        Arc::new(MemoryStore::new()),
        || panic!("mock run must not connect"),
    );
    let p = provider(sdk, &relay);
    p.mount().await;

    let ctx = p.context();
    assert_eq!(ctx.status(), HandshakeStatus::Error);
    assert!(ctx.session().is_none());
    assert!(ctx.error().unwrap().starts_with("Token exchange failed"));
}
