//! Token relay.
//!
//! Accepts `{code}` from the embedded client, exchanges it with the host's
//! OAuth token endpoint using the confidential client credentials, and
//! returns `{access_token}`. The client secret only ever travels upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{RELAY_PATH, RELAY_PROXY_PATH, RelayConfig};
use crate::exchange::TokenResponse;
use crate::types::AccessToken;

#[derive(Clone)]
pub struct RelayState {
    config: Arc<RelayConfig>,
    client: reqwest::Client,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: RelayConfig, client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayRequest {
    #[serde(default)]
    code: Option<String>,
}

/// Fields the upstream token endpoint may answer with.
#[derive(Debug, Deserialize)]
struct UpstreamToken {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum RelayError {
    /// The request carried no usable code.
    BadRequest(String),
    /// The upstream call failed or returned no token.
    Upstream(String),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Upstream(msg) => write!(f, "Upstream token exchange failed: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(RELAY_PATH, post(exchange_token))
        .route(RELAY_PROXY_PATH, post(exchange_token))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

/// Same-origin unless one extra origin is configured.
fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match config.allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Ignoring invalid allowed origin: {}", e);
            layer
        }
        None => layer,
    }
}

/// Bind `config.bind` and serve the relay until the process exits.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let bind = config.bind.clone();
    let router = create_router(RelayState::new(config)?);
    let listener = tokio::net::TcpListener::bind(&bind).await?;

    info!("Token relay listening on http://{}", bind);
    axum::serve(listener, router).await?;

    Ok(())
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

async fn exchange_token(
    State(state): State<RelayState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, RelayError> {
    let Json(request) = payload.map_err(|e| RelayError::BadRequest(e.body_text()))?;
    let code = request
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RelayError::BadRequest("missing code".to_string()))?;

    let access_token = exchange_upstream(&state, &code).await?;
    info!("Exchanged authorization code for an access token");

    Ok(Json(TokenResponse {
        access_token: Some(access_token),
    }))
}

async fn exchange_upstream(state: &RelayState, code: &str) -> Result<AccessToken, RelayError> {
    let config = &state.config;
    let form = serde_urlencoded::to_string([
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("grant_type", "authorization_code"),
        ("code", code),
    ])
    .map_err(|e| RelayError::Upstream(e.to_string()))?;

    let response = state
        .client
        .post(&config.token_url)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(form)
        .send()
        .await
        .map_err(|e| {
            warn!("Token endpoint unreachable: {}", e);
            RelayError::Upstream("token endpoint unreachable".to_string())
        })?;

    let status = response.status();
    let body: UpstreamToken = response.json().await.map_err(|e| {
        warn!("Token endpoint answered {} with an unreadable body: {}", status, e);
        RelayError::Upstream(format!("token endpoint answered {}", status.as_u16()))
    })?;

    if !status.is_success() {
        let reason = body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        warn!("Token endpoint rejected the code: {}", reason);
        return Err(RelayError::Upstream(reason));
    }

    body.access_token
        .filter(|t| !t.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| RelayError::Upstream("no access_token in response".to_string()))
}
