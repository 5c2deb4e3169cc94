//! Host SDK adapter.
//!
//! The embedded client only needs three capabilities from its host:
//!
//! - `ready`: wait until the host bridge is initialized
//! - `authorize`: obtain a single-use authorization code
//! - `authenticate`: trade an access token for an authenticated session
//!
//! `HostSdk` captures that surface. Two implementations exist:
//!
//! - [`LiveSdk`] speaks the frame protocol to the real host over a
//!   [`BridgeTransport`]
//! - [`MockSdk`] emulates the host locally from the tab's
//!   [`OverrideStore`](crate::overrides::OverrideStore) identity
//!
//! [`select_sdk`] picks one from the launch parameters. The choice is made
//! once at startup and the resulting handle is injected everywhere else.

mod error;
mod live;
mod mock;
mod model;
pub mod transport;

pub use error::BridgeError;
pub use live::LiveSdk;
pub use mock::{MOCK_AUTHORIZATION_CODE, MOCK_EXPIRES, MockSdk, discriminator_for};
pub use model::{
    ApplicationInfo, AuthenticateParams, AuthenticatedSession, AuthorizeParams,
    AuthorizeResponse, DEFAULT_SCOPES, Prompt, ResponseType, SessionUser, default_scopes,
};
pub use transport::{BridgeFrame, BridgeTransport, ChannelTransport, LineTransport};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ClientConfig;
use crate::overrides::{LaunchParams, OverrideStore, SessionStore};
use crate::types::AccessToken;

/// Which adapter variant is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdkMode {
    Live,
    Mock,
}

impl SdkMode {
    /// Live inside the host frame, mock everywhere else.
    pub fn detect(params: &LaunchParams) -> Self {
        if params.is_embedded() {
            Self::Live
        } else {
            Self::Mock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

/// Capability surface shared by every host SDK variant.
#[async_trait]
pub trait HostSdk: Send + Sync {
    fn mode(&self) -> SdkMode;

    /// Suspend until the host bridge is initialized. Idempotent.
    async fn ready(&self) -> Result<(), BridgeError>;

    async fn authorize(&self, params: AuthorizeParams) -> Result<AuthorizeResponse, BridgeError>;

    /// `Ok(None)` when the host accepted the call but produced no session.
    async fn authenticate(
        &self,
        access_token: &AccessToken,
    ) -> Result<Option<AuthenticatedSession>, BridgeError>;
}

/// Build the adapter for this page load.
///
/// `connect` is only called when the page runs inside the host frame.
pub fn select_sdk<F>(
    params: &LaunchParams,
    config: &ClientConfig,
    storage: Arc<dyn SessionStore>,
    connect: F,
) -> Arc<dyn HostSdk>
where
    F: FnOnce() -> Arc<dyn BridgeTransport>,
{
    match params.frame_id() {
        Some(frame_id) => {
            info!("Running inside host frame {}, using live host SDK", frame_id);
            Arc::new(LiveSdk::new(config.client_id.clone(), frame_id, connect()))
        }
        None => {
            info!("No frame_id in launch URL, using mock host SDK");
            let overrides = OverrideStore::new(params.clone(), storage);
            Arc::new(MockSdk::new(config.client_id.clone(), &overrides))
        }
    }
}
