//! Client configuration: one base address for the backend, resolved into
//! the token, register, and websocket URLs.
//!
//! Sources, lowest to highest precedence (figment):
//!
//!   built-in defaults  →  config.toml  →  ROOMCHAT_* env vars
//!
//! e.g. `ROOMCHAT_SERVER=https://chat.example.com roomchat chat -u alice ...`

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Figment-deserialized tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// HTTP base of the backend, e.g. `http://localhost:8000`.
    #[serde(default = "default_server")]
    pub server: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
        }
    }
}

fn default_server() -> String {
    "http://localhost:8000".to_string()
}

/// Resolved endpoints used by the auth client and the channel manager.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    server: String,
}

impl ClientConfig {
    /// Load from defaults, an optional TOML file, and `ROOMCHAT_*` env vars.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let file: FileConfig = figment.merge(Env::prefixed("ROOMCHAT_")).extract()?;
        Ok(Self::for_server(file.server))
    }

    /// Point the client at an explicit backend base URL.
    pub fn for_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.server)
    }

    pub fn register_url(&self) -> String {
        format!("{}/register", self.server)
    }

    /// Websocket endpoint with the session token carried as a query
    /// parameter, the credential for the connection request.
    ///
    /// The token is opaque, so it is percent-encoded rather than trusted to
    /// be URL-safe.
    pub fn ws_url(&self, token: &str) -> String {
        let base = if let Some(rest) = self.server.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.server)
        };
        let token: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
        format!("{base}/ws?token={token}")
    }
}
