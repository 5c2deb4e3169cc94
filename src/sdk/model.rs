//! Wire types shared by every host SDK variant.

use serde::{Deserialize, Serialize};

use crate::types::{AccessToken, AuthorizationCode, ClientId};

/// Scopes requested when the caller does not name any.
pub const DEFAULT_SCOPES: [&str; 2] = ["identify", "guilds"];

pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// OAuth response type requested from the host. Only codes are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Code,
}

/// Host consent prompt behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prompt {
    /// Suppress the consent prompt.
    #[default]
    None,
}

/// Arguments of the host's `authorize` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: ClientId,
    pub response_type: ResponseType,
    pub state: String,
    pub prompt: Prompt,
    pub scope: Vec<String>,
}

impl AuthorizeParams {
    /// Code request with an empty state and the prompt suppressed.
    pub fn code(client_id: ClientId, scope: Vec<String>) -> Self {
        Self {
            client_id,
            response_type: ResponseType::Code,
            state: String::new(),
            prompt: Prompt::None,
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub code: AuthorizationCode,
}

/// Arguments of the host's `authenticate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateParams {
    pub access_token: AccessToken,
}

/// Profile of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub public_flags: u64,
}

/// Application the session was granted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_origins: Option<Vec<String>>,
}

/// Result of a successful `authenticate` command.
///
/// Immutable once created; a new handshake produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub access_token: AccessToken,
    pub user: SessionUser,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expires: String,
    pub application: ApplicationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_params_wire_format() {
        let params = AuthorizeParams::code(ClientId::new("42"), default_scopes());
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "client_id": "42",
                "response_type": "code",
                "state": "",
                "prompt": "none",
                "scope": ["identify", "guilds"]
            })
        );
    }

    #[test]
    fn test_session_deserializes_host_payload() {
        let json = r#"{
            "access_token": "tok",
            "user": {
                "id": "1",
                "username": "someone",
                "discriminator": "0",
                "avatar": null,
                "public_flags": 64
            },
            "scopes": ["identify"],
            "expires": "2030-01-01T00:00:00Z",
            "application": {
                "id": "app",
                "name": "Activity",
                "icon": null,
                "description": "",
                "rpc_origins": ["https://example.com"]
            }
        }"#;

        let session: AuthenticatedSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token.as_str(), "tok");
        assert_eq!(session.user.public_flags, 64);
        assert_eq!(session.scopes, vec!["identify".to_string()]);
        assert_eq!(
            session.application.rpc_origins,
            Some(vec!["https://example.com".to_string()])
        );
    }

    #[test]
    fn test_application_omits_missing_rpc_origins() {
        let app = ApplicationInfo {
            id: "a".to_string(),
            name: "n".to_string(),
            icon: None,
            description: String::new(),
            rpc_origins: None,
        };
        let value = serde_json::to_value(&app).unwrap();
        assert!(value.get("rpc_origins").is_none());
    }
}
