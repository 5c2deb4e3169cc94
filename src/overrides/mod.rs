//! Per-tab session identity for local development.
//!
//! When the page runs outside the host there is no real user, guild or
//! channel. This module resolves stand-in values for them:
//!
//! 1. an explicit query parameter (`?user_id=...`) always wins,
//! 2. otherwise the value already stored for this tab,
//! 3. otherwise a fresh random token, stored before it is returned.
//!
//! Repeated resolutions of the same key within one tab are stable.

mod params;
mod store;

pub use params::{FRAME_ID_PARAM, LaunchParams};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Length of generated identity tokens.
pub const GENERATED_VALUE_LEN: usize = 8;

const GENERATED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Identity values that can be overridden per tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKey {
    UserId,
    GuildId,
    ChannelId,
}

impl OverrideKey {
    pub const ALL: [OverrideKey; 3] = [Self::UserId, Self::GuildId, Self::ChannelId];

    /// Query parameter and storage key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::GuildId => "guild_id",
            Self::ChannelId => "channel_id",
        }
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting user and its enclosing guild and channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: String,
    pub guild_id: String,
    pub channel_id: String,
}

/// Resolves identity values from launch parameters and tab storage.
#[derive(Clone)]
pub struct OverrideStore {
    params: LaunchParams,
    storage: Arc<dyn SessionStore>,
}

impl OverrideStore {
    pub fn new(params: LaunchParams, storage: Arc<dyn SessionStore>) -> Self {
        Self { params, storage }
    }

    /// Resolve one identity value. Never fails.
    pub fn resolve(&self, key: OverrideKey) -> String {
        if let Some(value) = self.params.get(key.as_str()) {
            debug!("Using query override for {}", key);
            return value.to_string();
        }

        self.storage
            .get_or_insert_with(key.as_str(), &mut || {
                debug!("Generating session value for {}", key);
                generate_value()
            })
    }

    /// Resolve the full identity triple.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.resolve(OverrideKey::UserId),
            guild_id: self.resolve(OverrideKey::GuildId),
            channel_id: self.resolve(OverrideKey::ChannelId),
        }
    }

    pub fn params(&self) -> &LaunchParams {
        &self.params
    }
}

/// Random token of lowercase ASCII letters and digits.
pub fn generate_value() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_VALUE_LEN)
        .map(|_| GENERATED_ALPHABET[rng.random_range(0..GENERATED_ALPHABET.len())] as char)
        .collect()
}
