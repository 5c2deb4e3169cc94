//! Host SDK stand-in for running outside the host frame.
//!
//! All three capabilities are emulated so a development run never touches
//! the host: `ready` resolves immediately, `authorize` grants a fixed code
//! and `authenticate` builds a session for the tab's resolved user.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::overrides::{OverrideStore, SessionIdentity};
use crate::sdk::{
    ApplicationInfo, AuthenticatedSession, AuthorizeParams, AuthorizeResponse, BridgeError,
    HostSdk, SdkMode, SessionUser,
};
use crate::types::{AccessToken, AuthorizationCode, ClientId};

/// Code granted by the mock `authorize` command.
pub const MOCK_AUTHORIZATION_CODE: &str = "mock_code";

/// Expiry reported for mock sessions.
pub const MOCK_EXPIRES: &str = "2112-02-01T00:00:00+00:00";

/// Visibility flags reported for mock users.
pub const MOCK_PUBLIC_FLAGS: u64 = 1;

pub struct MockSdk {
    client_id: ClientId,
    identity: SessionIdentity,
    authorize_calls: Mutex<Vec<AuthorizeParams>>,
}

impl MockSdk {
    /// Resolve the identity triple once, up front.
    pub fn new(client_id: ClientId, overrides: &OverrideStore) -> Self {
        Self::with_identity(client_id, overrides.identity())
    }

    pub fn with_identity(client_id: ClientId, identity: SessionIdentity) -> Self {
        debug!(
            "Mock host SDK for user {} in guild {} / channel {}",
            identity.user_id, identity.guild_id, identity.channel_id
        );
        Self {
            client_id,
            identity,
            authorize_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Every `authorize` request received so far.
    pub fn authorize_calls(&self) -> Vec<AuthorizeParams> {
        self.authorize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The session `authenticate` reports for this tab's user.
    pub fn session_for(&self, access_token: &AccessToken) -> AuthenticatedSession {
        let user_id = &self.identity.user_id;
        AuthenticatedSession {
            access_token: access_token.clone(),
            user: SessionUser {
                id: user_id.clone(),
                username: user_id.clone(),
                discriminator: discriminator_for(user_id),
                avatar: None,
                public_flags: MOCK_PUBLIC_FLAGS,
            },
            scopes: Vec::new(),
            expires: MOCK_EXPIRES.to_string(),
            application: ApplicationInfo {
                id: "mock_app_id".to_string(),
                name: "mock_app_name".to_string(),
                icon: Some("mock_app_icon".to_string()),
                description: "mock_app_description".to_string(),
                rpc_origins: None,
            },
        }
    }
}

/// First character's code point modulo 5.
///
/// An empty id yields `"0"` so the discriminator is always numeric.
pub fn discriminator_for(user_id: &str) -> String {
    user_id
        .chars()
        .next()
        .map(|c| (c as u32 % 5).to_string())
        .unwrap_or_else(|| "0".to_string())
}

#[async_trait]
impl HostSdk for MockSdk {
    fn mode(&self) -> SdkMode {
        SdkMode::Mock
    }

    async fn ready(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn authorize(&self, params: AuthorizeParams) -> Result<AuthorizeResponse, BridgeError> {
        debug!(
            "Mock authorize for client {} with scopes {:?}",
            self.client_id, params.scope
        );
        self.authorize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(params);
        Ok(AuthorizeResponse {
            code: AuthorizationCode::new(MOCK_AUTHORIZATION_CODE),
        })
    }

    async fn authenticate(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<AuthenticatedSession>, BridgeError> {
        Ok(Some(self.session_for(access_token)))
    }
}
