//! Handshake failure classification.
//!
//! Every failure inside the handshake ends up here and is reduced to one
//! stable, user-facing message by [`HandshakeError::user_message`].

use std::fmt;

use crate::exchange::ExchangeError;
use crate::sdk::BridgeError;

/// Message recorded when a failure carries no usable text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Message recorded when the host accepts the token but returns no session.
pub const AUTHENTICATE_FAILED_MESSAGE: &str = "Authenticate command failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The host bridge never reached the ready state.
    NotReady(BridgeError),
    /// The host denied or could not grant an authorization code.
    Authorize(BridgeError),
    /// The relay was unreachable or returned no usable token.
    Exchange(ExchangeError),
    /// The `authenticate` command itself failed.
    Authenticate(BridgeError),
    /// The host accepted the token but returned no session.
    AuthenticateFailed,
    /// The failure could not be attributed to a step.
    Unknown(Option<String>),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady(e) => write!(f, "Host SDK is not ready: {}", e),
            Self::Authorize(e) => write!(f, "Authorization failed: {}", e),
            Self::Exchange(e) => write!(f, "Token exchange failed: {}", e),
            Self::Authenticate(e) => write!(f, "Authentication failed: {}", e),
            Self::AuthenticateFailed => f.write_str(AUTHENTICATE_FAILED_MESSAGE),
            Self::Unknown(Some(msg)) => f.write_str(msg),
            Self::Unknown(None) => f.write_str(UNKNOWN_ERROR_MESSAGE),
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotReady(e) | Self::Authorize(e) | Self::Authenticate(e) => Some(e),
            Self::Exchange(e) => Some(e),
            Self::AuthenticateFailed | Self::Unknown(_) => None,
        }
    }
}

impl HandshakeError {
    /// Short name of the failing step, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotReady(_) => "ready",
            Self::Authorize(_) => "authorize",
            Self::Exchange(_) => "exchange",
            Self::Authenticate(_) | Self::AuthenticateFailed => "authenticate",
            Self::Unknown(_) => "unknown",
        }
    }

    /// The message shown to the user. Never empty.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_failed_message() {
        assert_eq!(
            HandshakeError::AuthenticateFailed.user_message(),
            "Authenticate command failed"
        );
    }

    #[test]
    fn test_known_messages_carry_cause() {
        let err = HandshakeError::Exchange(ExchangeError::Status(500));
        assert_eq!(err.user_message(), "Token exchange failed: Token relay returned HTTP 500");
        assert_eq!(err.kind(), "exchange");

        let err = HandshakeError::Authorize(BridgeError::Command {
            code: 5000,
            message: "User denied".to_string(),
        });
        assert_eq!(err.user_message(), "Authorization failed: User denied");
    }

    #[test]
    fn test_unknown_falls_back_to_generic_text() {
        assert_eq!(HandshakeError::Unknown(None).user_message(), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(
            HandshakeError::Unknown(Some("   ".to_string())).user_message(),
            UNKNOWN_ERROR_MESSAGE
        );
        assert_eq!(
            HandshakeError::Unknown(Some("task panicked".to_string())).user_message(),
            "task panicked"
        );
        assert_eq!(HandshakeError::Unknown(None).kind(), "unknown");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err = HandshakeError::NotReady(BridgeError::Closed(None));
        assert_eq!(err.source().unwrap().to_string(), "Host bridge closed");
        assert!(HandshakeError::AuthenticateFailed.source().is_none());
    }
}
