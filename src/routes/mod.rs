mod auth;
mod chat;

pub use auth::*;
pub use chat::*;

use std::sync::{Mutex, MutexGuard};

use actix_web::web::{JsonConfig, ServiceConfig};
use serde::Serialize;

use crate::{data::UserView, error::{ApiError, ValidationError}};

#[derive(Serialize)]
pub struct UserResponse<'a> {
    pub success: bool,
    pub user: UserView<'a>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ApiError> {
    mutex.lock().map_err(|e| ApiError::internal("state lock poisoned", e))
}

/// Registers every endpoint. Application state is registered by the caller.
pub fn configure(cfg: &mut ServiceConfig) {
    let json = JsonConfig::default().error_handler(|err, _| {
        ApiError::from(ValidationError::new(err.to_string())).into()
    });
    cfg.app_data(json)
        .service(auth_signup)
        .service(auth_login)
        .service(auth_logout)
        .service(auth_me)
        .service(auth_onboarding)
        .service(chat_token);
}
