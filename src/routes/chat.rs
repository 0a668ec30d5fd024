use actix_web::{get, web::Data, HttpResponse};
use serde::Serialize;

use crate::{auth::UserSession, error::ApiError, stream::TokenSigner};

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[get("/chat/token")]
pub async fn chat_token(signer: Data<dyn TokenSigner>, user: UserSession) -> Result<HttpResponse, ApiError> {
    let token = signer.create_token(&user.user)?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}
