use std::fmt::Display;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;

use crate::{auth::AuthError, db::DbError, stream::SignError};

/// Malformed or missing input, reported back to the caller with field detail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub missing_fields: Vec<&'static str>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), missing_fields: vec![] }
    }

    pub fn missing(message: impl Into<String>, fields: Vec<&'static str>) -> Self {
        Self { message: message.into(), missing_fields: fields }
    }
}

/// Every failure a request handler can end in. This is the only type that is
/// turned into an HTTP response.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Logs the cause and hides it from the caller.
    pub fn internal(context: &str, cause: impl Display) -> Self {
        error!("{context}: {cause}");
        ApiError::Internal
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "no_fields")]
    missing_fields: &'a [&'static str],
}

fn no_fields(fields: &&[&'static str]) -> bool {
    fields.is_empty()
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let missing_fields = match self {
            ApiError::Validation(e) => e.missing_fields.as_slice(),
            _ => &[],
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
            missing_fields,
        })
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(e) => ApiError::Validation(e),
            AuthError::EmailTaken => ApiError::Validation(ValidationError::new(e.to_string())),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Store(e) => ApiError::internal("auth store failure", e),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            // A session pointing at a user that no longer exists is as good as no session.
            DbError::UnknownUser(_) => ApiError::Unauthorized,
            DbError::IncompleteProfile(_) => ApiError::Validation(ValidationError::new("All fields are required")),
            DbError::Store(e) => ApiError::internal("user store failure", e),
        }
    }
}

impl From<SignError> for ApiError {
    fn from(e: SignError) -> Self {
        ApiError::internal("error generating stream token", e)
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    async fn body_of(e: ApiError) -> serde_json::Value {
        let bytes = to_bytes(e.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn validation_error_carries_missing_fields() {
        let e = ApiError::from(ValidationError::missing("All fields are required", vec!["bio"]));
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        let body = body_of(e).await;
        assert_eq!(body["message"], "All fields are required");
        assert_eq!(body["missingFields"], serde_json::json!(["bio"]));
    }

    #[actix_web::test]
    async fn internal_error_hides_cause() {
        let e = ApiError::internal("disk", "/var/lib/secret-path is read only");
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(e).await;
        assert_eq!(body, serde_json::json!({ "message": "Internal server error" }));
    }

    #[test]
    fn credential_mismatch_is_a_plain_401() {
        let e = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(e.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(e.to_string(), "Invalid email or password");
    }
}
