// Core modules
pub mod config;
pub mod types;
pub mod overrides;
pub mod sdk;
pub mod exchange;

// Handshake and session distribution
pub mod auth;
pub mod session;

// Server-side token relay
pub mod relay;

// Re-export key types and functions
pub use auth::{AuthOutcome, Authenticator, HandshakeError, HandshakeStatus, SetupOptions};
pub use config::{ClientConfig, RelayConfig};
pub use exchange::{ExchangeError, MockExchange, RelayClient, TokenExchange, select_exchange};
pub use overrides::{FileStore, LaunchParams, MemoryStore, OverrideStore, SessionStore};
pub use sdk::{AuthenticatedSession, BridgeError, HostSdk, SdkMode, select_sdk};
pub use session::{ProviderView, SessionContext, SessionProvider};
pub use types::{AccessToken, AuthorizationCode, ClientId, FrameId};

use std::sync::Arc;

use sdk::BridgeTransport;

/// Convenience function to wire a provider for one page load.
///
/// Picks the host SDK variant and the matching token exchange from the
/// launch parameters. Inside the host frame the bridge is opened through
/// `connect` and codes go through the relay built by `relay`; outside it
/// both are mocked and neither closure is called.
pub fn create_provider<F, R>(
    params: &LaunchParams,
    config: &ClientConfig,
    storage: Arc<dyn SessionStore>,
    options: SetupOptions,
    connect: F,
    relay: R,
) -> Result<Arc<SessionProvider>, ExchangeError>
where
    F: FnOnce() -> Arc<dyn BridgeTransport>,
    R: FnOnce() -> Result<Arc<dyn TokenExchange>, ExchangeError>,
{
    let exchange = select_exchange(params, relay)?;
    let sdk = select_sdk(params, config, storage, connect);
    let authenticator = Authenticator::new(config.client_id.clone(), sdk, exchange);
    Ok(Arc::new(SessionProvider::new(authenticator, options)))
}
