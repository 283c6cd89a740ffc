//! HTTP handlers. Generic CRUD lives here; resources with extra rules get
//! their own module.

use std::{future::Future, pin::Pin};

use actix_web::{
    dev::Payload,
    web::{Data, Json, Path, Query},
    FromRequest, HttpRequest, HttpResponse,
};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use serde::Serialize;

use crate::{
    analytics::Event,
    core::{
        listing::{self, ListQuery, Listable},
        store::Stored,
        validation::Validate,
    },
    error::{ApiResponse, AppError},
    forms::{ContactForm, Form},
    server::AppState,
    types::{Comment, Course, Project},
};

pub mod blogs;
pub mod courses;
pub mod dashboard;
pub mod home;
pub mod materials;
pub mod profile;
pub mod session;
pub mod terminal;

/// Gate for every dashboard route. List it before any body extractor so a
/// bad token is answered with 401 whatever the payload holds.
pub struct AdminSession;

impl FromRequest for AdminSession {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<Data<AppState>>().cloned();
        let credentials = BearerAuth::from_request(req, payload);
        Box::pin(async move {
            let credentials = credentials
                .await
                .map_err(|_| AppError::Unauthorized("missing bearer token"))?;
            let state = state.ok_or(AppError::Unauthorized("login is disabled"))?;
            state.sessions.authorize(credentials.token()).await?;
            Ok(AdminSession)
        })
    }
}

pub async fn list_records<T>(
    state: Data<AppState>,
    query: Query<ListQuery>,
) -> Result<HttpResponse, AppError>
where
    T: Stored + Listable,
{
    let items = T::collection(&state.store).all().await;
    Ok(ApiResponse::success(listing::list(items, &query)))
}

pub async fn get_record<T: Stored>(
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let record = T::collection(&state.store).get(path.into_inner()).await?;
    Ok(ApiResponse::success(record))
}

pub async fn create_record<F>(
    _admin: AdminSession,
    state: Data<AppState>,
    form: Json<F>,
) -> Result<HttpResponse, AppError>
where
    F: Form,
    F::Record: Stored,
{
    form.validate()?;
    let record = <F::Record as Stored>::collection(&state.store)
        .insert(form.into_inner().create())
        .await?;
    Ok(ApiResponse::created(record))
}

pub async fn update_record<F>(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
    form: Json<F>,
) -> Result<HttpResponse, AppError>
where
    F: Form,
    F::Record: Stored,
{
    form.validate()?;
    let form = form.into_inner();
    let record = <F::Record as Stored>::collection(&state.store)
        .update(path.into_inner(), |record| form.apply(record))
        .await?;
    Ok(ApiResponse::success(record))
}

pub async fn delete_record<T: Stored>(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    T::collection(&state.store).remove(path.into_inner()).await?;
    Ok(ApiResponse::no_content())
}

/// A record visitors can like.
pub trait Likeable: Stored {
    fn likes_mut(&mut self) -> &mut u32;
}

impl Likeable for Project {
    fn likes_mut(&mut self) -> &mut u32 {
        &mut self.likes
    }
}

impl Likeable for Course {
    fn likes_mut(&mut self) -> &mut u32 {
        &mut self.likes
    }
}

impl Likeable for Comment {
    fn likes_mut(&mut self) -> &mut u32 {
        &mut self.likes
    }
}

/// Unliking never drops below zero.
pub async fn adjust_likes<T: Likeable>(state: &AppState, id: u32, liked: bool) -> Result<T, AppError> {
    let record = T::collection(&state.store)
        .update(id, |record| {
            let likes = record.likes_mut();
            *likes = if liked {
                likes.saturating_add(1)
            } else {
                likes.saturating_sub(1)
            };
        })
        .await?;
    if liked {
        state.store.track(Event::Like).await;
    }
    Ok(record)
}

pub async fn like<T: Likeable>(
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let record: T = adjust_likes(&state, path.into_inner(), true).await?;
    Ok(ApiResponse::success(record))
}

pub async fn unlike<T: Likeable>(
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let record: T = adjust_likes(&state, path.into_inner(), false).await?;
    Ok(ApiResponse::success(record))
}

pub async fn list_services(state: Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(ApiResponse::success(state.store.services.all().await))
}

pub async fn submit_contact(
    state: Data<AppState>,
    form: Json<ContactForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;
    let message = state
        .store
        .messages
        .insert(form.into_inner().into_message())
        .await?;
    Ok(ApiResponse::created(message))
}

#[derive(Serialize)]
struct Status {
    status: &'static str,
    version: &'static str,
}

pub async fn status_handler() -> HttpResponse {
    ApiResponse::success(Status {
        status: "folio is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
