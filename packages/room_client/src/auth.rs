//! Client for the authentication collaborator.
//!
//! The backend issues an opaque bearer token for a username/password pair
//! (OAuth2 password flow, form-encoded) and accepts new-user registration.
//! This client only cares about the token string on success and a
//! distinguishable failure otherwise. Failures are surfaced to the user,
//! never retried automatically.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("registration rejected: {0}")]
    Rejected(String),
    #[error("auth service returned {status}: {body}")]
    Unexpected { status: u16, body: String },
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin HTTP client over the token and register endpoints.
pub struct AuthClient {
    http: reqwest::Client,
    token_url: String,
    register_url: String,
}

impl AuthClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: config.token_url(),
            register_url: config.register_url(),
        }
    }

    /// Exchange credentials for an opaque session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            debug!(username, "login succeeded");
            Ok(token.access_token)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::Unexpected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Create a new account. The backend answers 400 for a duplicate
    /// username (or otherwise rejected registration).
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(&self.register_url)
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(username, "registration succeeded");
            Ok(())
        } else if status == StatusCode::BAD_REQUEST {
            Err(AuthError::Rejected(
                response.text().await.unwrap_or_default(),
            ))
        } else {
            Err(AuthError::Unexpected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
