use actix_web::{
    web::{Data, Json},
    HttpResponse,
};
use tracing::info;

use crate::{
    core::validation::{clean_tags, Validate},
    error::{ApiResponse, AppError},
    handlers::AdminSession,
    server::AppState,
    types::ProfileData,
};

pub async fn get_profile(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(ApiResponse::success(state.store.profile.get().await))
}

pub async fn put_profile(
    _admin: AdminSession,
    state: Data<AppState>,
    profile: Json<ProfileData>,
) -> Result<HttpResponse, AppError> {
    profile.validate()?;
    let mut profile = profile.into_inner();
    profile.skills = clean_tags(profile.skills);
    let saved = state.store.profile.set(profile).await?;
    info!("Profile updated for {}", saved.full_name);
    Ok(ApiResponse::success(saved))
}
