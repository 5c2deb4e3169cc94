//! The handshake itself.
//!
//! [`Authenticator::authenticate_sdk`] is the bare sequence
//! (ready -> authorize -> exchange -> authenticate) and can be reused on its
//! own wherever only a token is needed. [`Authenticator::setup`] wraps it
//! with status tracking and error capture for a [`SessionContext`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::auth::{HandshakeError, HandshakeStatus};
use crate::exchange::TokenExchange;
use crate::sdk::{AuthenticatedSession, AuthorizeParams, HostSdk, default_scopes};
use crate::session::SessionContext;
use crate::types::{AccessToken, ClientId};

/// Token and session produced by a successful handshake.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub access_token: AccessToken,
    pub session: AuthenticatedSession,
}

/// Options for [`Authenticator::setup`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Run the authorization handshake after readiness.
    pub authenticate: bool,
    /// Requested scopes; `None` means `identify` + `guilds`.
    pub scope: Option<Vec<String>>,
}

impl SetupOptions {
    pub fn authenticated(scope: Option<Vec<String>>) -> Self {
        Self {
            authenticate: true,
            scope,
        }
    }
}

pub struct Authenticator {
    client_id: ClientId,
    sdk: Arc<dyn HostSdk>,
    exchange: Arc<dyn TokenExchange>,
}

impl Authenticator {
    pub fn new(client_id: ClientId, sdk: Arc<dyn HostSdk>, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            client_id,
            sdk,
            exchange,
        }
    }

    pub fn sdk(&self) -> &Arc<dyn HostSdk> {
        &self.sdk
    }

    /// Authenticate with the host and return the access token.
    pub async fn authenticate_sdk(
        &self,
        scope: Option<Vec<String>>,
    ) -> Result<AuthOutcome, HandshakeError> {
        let scope = scope.unwrap_or_else(default_scopes);

        self.sdk.ready().await.map_err(HandshakeError::NotReady)?;

        let authorization = self
            .sdk
            .authorize(AuthorizeParams::code(self.client_id.clone(), scope))
            .await
            .map_err(HandshakeError::Authorize)?;
        info!("Host granted an authorization code");

        let access_token = self
            .exchange
            .exchange(&authorization.code)
            .await
            .map_err(HandshakeError::Exchange)?;
        info!("Authorization code exchanged for an access token");

        let session = self
            .sdk
            .authenticate(&access_token)
            .await
            .map_err(HandshakeError::Authenticate)?
            .ok_or(HandshakeError::AuthenticateFailed)?;
        info!("Authenticated as user {}", session.user.id);

        Ok(AuthOutcome {
            access_token,
            session,
        })
    }

    /// Run the handshake, publishing every step to `context`.
    ///
    /// Never fails: errors are logged and recorded on the context.
    pub async fn setup(&self, options: &SetupOptions, context: &watch::Sender<SessionContext>) {
        if let Err(e) = self.run_setup(options, context).await {
            error!("Session setup failed at {} step: {}", e.kind(), e);
            let message = e.user_message();
            context.send_modify(|ctx| ctx.fail(message));
        }
    }

    async fn run_setup(
        &self,
        options: &SetupOptions,
        context: &watch::Sender<SessionContext>,
    ) -> Result<(), HandshakeError> {
        context.send_modify(|ctx| {
            ctx.advance(HandshakeStatus::Loading);
        });
        self.sdk.ready().await.map_err(HandshakeError::NotReady)?;

        if options.authenticate {
            context.send_modify(|ctx| {
                ctx.advance(HandshakeStatus::Authenticating);
            });
            let outcome = self.authenticate_sdk(options.scope.clone()).await?;
            context.send_modify(|ctx| {
                ctx.store_session(outcome.access_token, outcome.session);
                ctx.advance(HandshakeStatus::Ready);
            });
        } else {
            context.send_modify(|ctx| {
                ctx.advance(HandshakeStatus::Ready);
            });
        }

        info!("Session setup complete ({})", self.sdk.mode().as_str());
        Ok(())
    }
}
