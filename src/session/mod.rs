//! Session context distribution.
//!
//! A [`SessionProvider`] owns one [`SessionContext`] per mount, starts the
//! handshake exactly once, and hands out read-only snapshots and change
//! notifications to consumers.

mod context;
#[cfg(test)]
mod integration_tests;
mod provider;

pub use context::SessionContext;
pub use provider::{ProviderView, SessionProvider};
