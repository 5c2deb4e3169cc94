//! Authentication handshake.
//!
//! Drives the host SDK through its four steps and tracks progress for the
//! session context:
//!
//! 1. wait for the host bridge to be ready
//! 2. request an authorization code from the host
//! 3. exchange the code for an access token through the relay
//! 4. authenticate the host session with the access token
//!
//! ## Usage
//!
//! ```ignore
//! let auth = Authenticator::new(client_id, sdk, Arc::new(RelayClient::for_origin(&origin)?));
//! let outcome = auth.authenticate_sdk(None).await?;
//! println!("signed in as {}", outcome.session.user.username);
//! ```

mod error;
mod orchestrator;
mod status;

pub use error::{AUTHENTICATE_FAILED_MESSAGE, HandshakeError, UNKNOWN_ERROR_MESSAGE};
pub use orchestrator::{AuthOutcome, Authenticator, SetupOptions};
pub use status::HandshakeStatus;
