//! Authorization code to access token exchange, via the same-origin relay.
//!
//! The client secret never reaches this side; the relay holds it and does
//! the server-to-server exchange.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::RELAY_PROXY_PATH;
use crate::overrides::LaunchParams;
use crate::types::{AccessToken, AuthorizationCode};

/// Token handed out by [`MockExchange`].
pub const MOCK_ACCESS_TOKEN: &str = "mock_token";

/// Request body posted to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub code: AuthorizationCode,
}

/// Response body returned by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<AccessToken>,
}

#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, code: &AuthorizationCode) -> Result<AccessToken, ExchangeError>;
}

/// Errors from the relay round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The relay could not be reached.
    Transport(String),
    /// The relay answered with a non-success status.
    Status(u16),
    /// The response body is not the expected JSON.
    MalformedResponse(String),
    /// The response parsed but carried no token.
    MissingToken,
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Token relay unreachable: {}", msg),
            Self::Status(code) => write!(f, "Token relay returned HTTP {}", code),
            Self::MalformedResponse(msg) => write!(f, "Malformed token relay response: {}", msg),
            Self::MissingToken => write!(f, "Token relay response has no access_token"),
        }
    }
}

impl std::error::Error for ExchangeError {}

/// `TokenExchange` over HTTP to the relay endpoint.
pub struct RelayClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl RelayClient {
    /// Client for the relay served under `origin` at the proxy path.
    pub fn for_origin(origin: &Url) -> Result<Self, ExchangeError> {
        let endpoint = origin
            .join(RELAY_PROXY_PATH)
            .map_err(|e| ExchangeError::Transport(format!("invalid relay origin: {}", e)))?;
        Self::new(endpoint)
    }

    pub fn new(endpoint: Url) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenExchange for RelayClient {
    async fn exchange(&self, code: &AuthorizationCode) -> Result<AccessToken, ExchangeError> {
        debug!("Exchanging authorization code via {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&TokenRequest { code: code.clone() })
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token relay answered {}", status);
            return Err(ExchangeError::Status(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ExchangeError::MissingToken),
        }
    }
}

/// Exchange used outside the host frame.
///
/// Mock authorization codes were never issued by the OAuth provider, so
/// they are answered locally with [`MOCK_ACCESS_TOKEN`] instead of going
/// through the relay.
#[derive(Debug, Default)]
pub struct MockExchange;

#[async_trait]
impl TokenExchange for MockExchange {
    async fn exchange(&self, code: &AuthorizationCode) -> Result<AccessToken, ExchangeError> {
        debug!("Mock exchange for code {}", code);
        Ok(AccessToken::new(MOCK_ACCESS_TOKEN))
    }
}

/// Pick the exchange matching the host SDK variant for this launch.
///
/// `relay` is only called when the page runs inside the host frame.
pub fn select_exchange<F>(
    params: &LaunchParams,
    relay: F,
) -> Result<Arc<dyn TokenExchange>, ExchangeError>
where
    F: FnOnce() -> Result<Arc<dyn TokenExchange>, ExchangeError>,
{
    if params.is_embedded() {
        relay()
    } else {
        Ok(Arc::new(MockExchange))
    }
}
