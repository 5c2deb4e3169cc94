use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress of one handshake attempt.
///
/// Moves forward only:
///
/// ```text
/// pending -> loading -> authenticating -> ready
///                  \            \
///                   -> ready     -> error
///                   -> error
/// ```
///
/// `error` and `ready` are terminal for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandshakeStatus {
    #[default]
    Pending,
    Loading,
    Authenticating,
    Error,
    Ready,
}

impl HandshakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Authenticating => "authenticating",
            Self::Error => "error",
            Self::Ready => "ready",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::Ready)
    }

    /// Whether `next` is a legal forward step from `self`.
    pub fn can_advance_to(&self, next: HandshakeStatus) -> bool {
        use HandshakeStatus::*;
        matches!(
            (self, next),
            (Pending, Loading)
                | (Pending, Error)
                | (Loading, Authenticating)
                | (Loading, Ready)
                | (Loading, Error)
                | (Authenticating, Ready)
                | (Authenticating, Error)
        )
    }
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
