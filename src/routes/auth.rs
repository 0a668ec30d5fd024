use std::sync::Mutex;

use actix_web::{get, post, web::{Data, Json}, HttpResponse};
use serde_json::json;

use crate::{
    auth::{removal_cookie, Auth, Login, Signup, UserSession},
    data::{OnboardingForm, UserID},
    db::{permissions::Access, DbError, DB},
    error::ApiError,
};

use super::{lock, UserResponse};

fn user_response(db: &DB, id: &UserID) -> Result<HttpResponse, ApiError> {
    let user = db.get_user(id).ok_or(DbError::UnknownUser(id.clone()))?;
    Ok(HttpResponse::Ok().json(UserResponse { success: true, user: user.view(id) }))
}

#[post("/auth/signup")]
pub async fn auth_signup(auth: Data<Mutex<Auth>>, db: Data<Mutex<DB>>, Json(form): Json<Signup>) -> Result<HttpResponse, ApiError> {
    let mut db = lock(&db)?;
    let mut auth = lock(&auth)?;
    let (id, session_id) = auth.signup(&form, &mut db)?;
    let mut response = user_response(&db, &id)?;
    response.add_cookie(&auth.session_cookie(&session_id))
        .map_err(|e| ApiError::internal("setting session cookie", e))?;
    Ok(response)
}

#[post("/auth/login")]
pub async fn auth_login(auth: Data<Mutex<Auth>>, db: Data<Mutex<DB>>, Json(form): Json<Login>) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    let mut auth = lock(&auth)?;
    let (id, session_id) = auth.login(&form, &db)?;
    let mut response = user_response(&db, &id)?;
    response.add_cookie(&auth.session_cookie(&session_id))
        .map_err(|e| ApiError::internal("setting session cookie", e))?;
    Ok(response)
}

#[post("/auth/logout")]
pub async fn auth_logout(auth: Data<Mutex<Auth>>, user: Option<UserSession>) -> Result<HttpResponse, ApiError> {
    if let Some(user) = user {
        lock(&auth)?.logout(&user.session_id);
    }
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(json!({ "success": true, "message": "Logout successful" })))
}

#[get("/auth/me")]
pub async fn auth_me(db: Data<Mutex<DB>>, user: UserSession) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    user_response(&db, &user.user)
}

#[post("/auth/onboarding")]
pub async fn auth_onboarding(db: Data<Mutex<DB>>, user: UserSession, Json(form): Json<OnboardingForm>) -> Result<HttpResponse, ApiError> {
    let profile = form.validate()?;
    let mut db = lock(&db)?;
    if db.authorize_profile_edit(&user.user, &user.user) == Access::Deny {
        return Err(ApiError::Unauthorized);
    }
    let updated = db.complete_onboarding(&user.user, profile)?;
    Ok(HttpResponse::Ok().json(UserResponse { success: true, user: updated.view(&user.user) }))
}
