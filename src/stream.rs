//! Credentials for the external real-time messaging service.
//!
//! The service authenticates clients with an HS256 JWT whose only claim is the
//! `user_id`, signed with the application's API secret. Nothing is persisted:
//! a token is minted on every request.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use crate::data::UserID;

#[derive(thiserror::Error, Debug)]
pub enum SignError {
    #[error("Stream API key or secret is missing")]
    MissingCredentials,
    #[error("Cannot sign a token for an empty user id")]
    EmptyUserId,
    #[error("Failed to sign token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Mints messaging tokens bound to a user id.
pub trait TokenSigner: Send + Sync {
    fn create_token(&self, user: &UserID) -> Result<String, SignError>;
}

#[derive(Serialize)]
struct StreamClaims<'a> {
    user_id: &'a str,
}

pub struct StreamClient {
    api_key: String,
    secret: String,
}

impl StreamClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), secret: secret.into() }
    }
}

impl TokenSigner for StreamClient {
    fn create_token(&self, user: &UserID) -> Result<String, SignError> {
        if self.api_key.is_empty() || self.secret.is_empty() {
            return Err(SignError::MissingCredentials);
        }
        if user.0.is_empty() {
            return Err(SignError::EmptyUserId);
        }
        let claims = StreamClaims { user_id: user.0.as_str() };
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }
}
