use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::auth::HandshakeStatus;
use crate::sdk::{AuthenticatedSession, HostSdk, SdkMode};
use crate::types::AccessToken;

/// What consumers observe about the handshake.
///
/// Only the orchestrator writes it (through the crate-private mutators);
/// consumers get clones. `authenticated` is true exactly when an access
/// token is present, and a session is only present once status is `ready`.
#[derive(Clone, Serialize)]
pub struct SessionContext {
    access_token: Option<AccessToken>,
    authenticated: bool,
    #[serde(skip)]
    sdk: Arc<dyn HostSdk>,
    sdk_mode: SdkMode,
    error: Option<String>,
    session: Option<AuthenticatedSession>,
    status: HandshakeStatus,
    history: Vec<HandshakeStatus>,
}

impl SessionContext {
    pub fn new(sdk: Arc<dyn HostSdk>) -> Self {
        let sdk_mode = sdk.mode();
        Self {
            access_token: None,
            authenticated: false,
            sdk,
            sdk_mode,
            error: None,
            session: None,
            status: HandshakeStatus::Pending,
            history: vec![HandshakeStatus::Pending],
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// The adapter handle this context was built around.
    pub fn sdk(&self) -> &Arc<dyn HostSdk> {
        &self.sdk
    }

    pub fn sdk_mode(&self) -> SdkMode {
        self.sdk_mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn session(&self) -> Option<&AuthenticatedSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> HandshakeStatus {
        self.status
    }

    /// Every status this context has been in, oldest first.
    pub fn history(&self) -> &[HandshakeStatus] {
        &self.history
    }

    /// Move to `next`. Backward or skipping moves are refused.
    pub(crate) fn advance(&mut self, next: HandshakeStatus) -> bool {
        if !self.status.can_advance_to(next) {
            warn!("Refusing status change {} -> {}", self.status, next);
            return false;
        }
        self.status = next;
        self.history.push(next);
        true
    }

    /// Record the handshake result. Status is left to the caller.
    pub(crate) fn store_session(&mut self, access_token: AccessToken, session: AuthenticatedSession) {
        self.authenticated = !access_token.is_empty();
        self.access_token = Some(access_token);
        self.session = Some(session);
    }

    /// Record a failure and force status to `error`.
    ///
    /// A settled attempt is left untouched.
    pub(crate) fn fail(&mut self, message: String) {
        if self.status.is_terminal() {
            warn!("Ignoring failure after status {}: {}", self.status, message);
            return;
        }
        self.error = Some(message);
        // A half-finished attempt never exposes a session.
        self.access_token = None;
        self.authenticated = false;
        self.session = None;
        self.status = HandshakeStatus::Error;
        self.history.push(HandshakeStatus::Error);
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("access_token", &self.access_token)
            .field("authenticated", &self.authenticated)
            .field("sdk_mode", &self.sdk_mode)
            .field("error", &self.error)
            .field("session", &self.session.as_ref().map(|s| &s.user.id))
            .field("status", &self.status)
            .finish()
    }
}
