use std::{env, fmt};

use crate::types::ClientId;

/// Environment variable holding the public OAuth client id.
pub const CLIENT_ID_ENV: &str = "DISCORD_CLIENT_ID";

/// Environment variable holding the confidential client secret (relay only).
pub const CLIENT_SECRET_ENV: &str = "DISCORD_CLIENT_SECRET";

/// Environment variable overriding the upstream OAuth token endpoint.
pub const TOKEN_URL_ENV: &str = "DISCORD_TOKEN_URL";

/// Environment variable naming the one cross-origin caller allowed to use
/// the relay. Unset means same-origin only.
pub const ALLOWED_ORIGIN_ENV: &str = "RELAY_ALLOWED_ORIGIN";

pub const DEFAULT_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";

pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:3001";

/// Same-origin path the client posts authorization codes to.
pub const RELAY_PROXY_PATH: &str = "/.proxy/api/token";

/// Path the relay itself serves; the host's proxy maps
/// `RELAY_PROXY_PATH` onto it.
pub const RELAY_PATH: &str = "/api/token";

/// Client-side configuration: everything here may ship with the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: ClientId,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(required_var(CLIENT_ID_ENV)?))
    }
}

/// Relay configuration. Holds the client secret, so it only ever lives in
/// the relay process.
#[derive(Clone)]
pub struct RelayConfig {
    pub client_id: ClientId,
    pub client_secret: String,
    pub token_url: String,
    pub bind: String,
    pub allowed_origin: Option<String>,
}

impl RelayConfig {
    pub fn new(client_id: impl Into<ClientId>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            bind: DEFAULT_RELAY_BIND.to_string(),
            allowed_origin: None,
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new(required_var(CLIENT_ID_ENV)?, required_var(CLIENT_SECRET_ENV)?);
        if let Ok(url) = env::var(TOKEN_URL_ENV)
            && !url.trim().is_empty()
        {
            config.token_url = url;
        }
        if let Ok(origin) = env::var(ALLOWED_ORIGIN_ENV)
            && !origin.trim().is_empty()
        {
            config.allowed_origin = Some(origin);
        }
        Ok(config)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("token_url", &self.token_url)
            .field("bind", &self.bind)
            .field("allowed_origin", &self.allowed_origin)
            .finish()
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(anyhow::anyhow!("Environment variable `{}` is empty", name)),
        Err(_) => Err(anyhow::anyhow!("Environment variable `{}` is not set", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::new("123", "shh");
        assert_eq!(config.client_id.as_str(), "123");
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.bind, DEFAULT_RELAY_BIND);
        assert_eq!(config.allowed_origin, None);
    }

    #[test]
    fn test_relay_config_debug_redacts_secret() {
        let config = RelayConfig::new("123", "super-secret-value");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_relay_config_builders() {
        let config = RelayConfig::new("123", "shh")
            .with_token_url("http://127.0.0.1:9/token")
            .with_bind("0.0.0.0:8080")
            .with_allowed_origin("https://app.example.com");
        assert_eq!(config.token_url, "http://127.0.0.1:9/token");
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.allowed_origin.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn test_required_var_missing() {
        let err = required_var("ACTIVITY_AUTH_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }
}
