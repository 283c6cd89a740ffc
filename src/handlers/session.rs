use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use serde::Deserialize;
use tracing::error;

use crate::{
    auth::get_local_passkey,
    error::{ApiResponse, AppError},
    server::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pass_key: String,
}

/// Exchanges the pass key for a bearer token. The key file is re-read on
/// every attempt.
pub async fn login(
    state: Data<AppState>,
    request: Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let local_key = get_local_passkey(&state.key_path).map_err(|err| {
        error!("Login unavailable: {}", err);
        AppError::Unauthorized("login is disabled")
    })?;
    let session = state.sessions.login(&local_key, &request.pass_key).await?;
    Ok(ApiResponse::success(session))
}

pub async fn logout(
    state: Data<AppState>,
    credentials: BearerAuth,
) -> Result<HttpResponse, AppError> {
    if state.sessions.logout(credentials.token()).await {
        Ok(ApiResponse::no_content())
    } else {
        Err(AppError::Unauthorized("unknown session token"))
    }
}
