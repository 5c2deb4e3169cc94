//! NewType wrappers for the identifiers that flow through the handshake.
//!
//! These types keep the different opaque strings apart (e.g., passing an
//! authorization code where an access token is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (@impls $name:ident) => {
        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the wrapped value is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        newtype_string!(@impls $name);
    };
}

/// Implements `Display` by writing the inner value.
macro_rules! display_inner {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_string!(
    /// Public OAuth client identifier of the embedded application.
    ///
    /// Safe to ship to the client side; it is sent along with every
    /// `authorize` command and with the relay's upstream exchange.
    ClientId
);
display_inner!(ClientId);

newtype_string!(
    /// Identifier of the host's embedding frame.
    ///
    /// Its presence in the launch URL is what marks the page as running
    /// inside the host.
    FrameId
);
display_inner!(FrameId);

newtype_string!(
    /// Single-use authorization code granted by the host's `authorize`
    /// command.
    AuthorizationCode
);
display_inner!(AuthorizationCode);

/// Access token obtained from the relay.
///
/// `Debug` and `Display` never print the token itself.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

newtype_string!(@impls AccessToken);

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
