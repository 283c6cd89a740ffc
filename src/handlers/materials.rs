use actix_web::{
    web::{Data, Json, Path, Query},
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    analytics::Event,
    core::{
        listing::{self, ListQuery, SortOrder},
        validation::{Validate, Validator},
    },
    error::{ApiResponse, AppError},
    forms::{Form, MaterialForm},
    handlers::AdminSession,
    server::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MaterialQuery {
    pub course_id: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<MaterialQuery> for ListQuery {
    fn from(query: MaterialQuery) -> Self {
        ListQuery {
            search: query.search,
            category: query.category,
            sort: query.sort,
            page: query.page,
            per_page: query.per_page,
        }
    }
}

/// Field rules plus the course reference, reported together.
async fn check(state: &AppState, form: &MaterialForm) -> Result<(), AppError> {
    let mut rules = Validator::default();
    form.check(&mut rules);
    if !state.store.courses.contains(form.course_id).await {
        rules.fail("course_id", "Please select a course.");
    }
    rules.finish()
}

pub async fn list(
    state: Data<AppState>,
    query: Query<MaterialQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let materials = match query.course_id {
        Some(course_id) => {
            state
                .store
                .materials
                .filter(|material| material.course_id == course_id)
                .await
        }
        None => state.store.materials.all().await,
    };
    Ok(ApiResponse::success(listing::list(materials, &query.into())))
}

pub async fn create(
    _admin: AdminSession,
    state: Data<AppState>,
    form: Json<MaterialForm>,
) -> Result<HttpResponse, AppError> {
    check(&state, &form).await?;
    let material = state
        .store
        .materials
        .insert(form.into_inner().create())
        .await?;
    Ok(ApiResponse::created(material))
}

pub async fn update(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
    form: Json<MaterialForm>,
) -> Result<HttpResponse, AppError> {
    check(&state, &form).await?;
    let form = form.into_inner();
    let material = state
        .store
        .materials
        .update(path.into_inner(), |material| form.apply(material))
        .await?;
    Ok(ApiResponse::success(material))
}

pub async fn download(state: Data<AppState>, path: Path<u32>) -> Result<HttpResponse, AppError> {
    let material = state
        .store
        .materials
        .update(path.into_inner(), |material| {
            material.downloads = material.downloads.saturating_add(1)
        })
        .await?;
    state.store.track(Event::Download).await;
    Ok(ApiResponse::success(material))
}
