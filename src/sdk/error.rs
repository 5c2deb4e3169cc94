use std::fmt;

/// Errors raised while talking to the host bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The host closed the bridge (or it was never open).
    Closed(Option<String>),
    /// Sending or receiving a frame failed.
    Transport(String),
    /// The host sent something that is not a valid frame or payload.
    Protocol(String),
    /// The host answered a command with an error.
    Command { code: i64, message: String },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(Some(reason)) => write!(f, "Host bridge closed: {}", reason),
            Self::Closed(None) => write!(f, "Host bridge closed"),
            Self::Transport(msg) => write!(f, "Host bridge transport error: {}", msg),
            Self::Protocol(msg) => write!(f, "Malformed host message: {}", msg),
            Self::Command { code, message } if message.is_empty() => {
                write!(f, "Host command failed with code {}", code)
            }
            Self::Command { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for BridgeError {}
