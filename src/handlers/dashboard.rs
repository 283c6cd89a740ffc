use actix_web::{
    web::{Data, Path},
    HttpResponse,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    analytics::MonthStats,
    error::{ApiResponse, AppError},
    handlers::AdminSession,
    server::AppState,
    types::{Course, Project},
};

const TOP_ITEMS: usize = 3;
const ANALYTICS_MONTHS: u32 = 7;

#[derive(Serialize)]
struct Counts {
    projects: usize,
    courses: usize,
    blog_posts: usize,
    comments: usize,
    materials: usize,
    entries: usize,
    messages: usize,
}

#[derive(Serialize)]
struct Overview {
    counts: Counts,
    unread_messages: usize,
    top_projects: Vec<Project>,
    top_courses: Vec<Course>,
    totals: MonthStats,
}

pub async fn overview(
    _admin: AdminSession,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let store = &state.store;

    let mut top_projects = store.projects.all().await;
    top_projects.sort_by(|a, b| b.likes.cmp(&a.likes));
    top_projects.truncate(TOP_ITEMS);

    let mut top_courses = store.courses.all().await;
    top_courses.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    top_courses.truncate(TOP_ITEMS);

    let counts = Counts {
        projects: store.projects.len().await,
        courses: store.courses.len().await,
        blog_posts: store.blogs.len().await,
        comments: store.comments.len().await,
        materials: store.materials.len().await,
        entries: store.entries.len().await,
        messages: store.messages.len().await,
    };
    let unread_messages = store.messages.filter(|message| !message.read).await.len();

    Ok(ApiResponse::success(Overview {
        counts,
        unread_messages,
        top_projects,
        top_courses,
        totals: store.analytics.get().await.totals(),
    }))
}

/// Monthly visits, likes and downloads for the chart, oldest month first.
pub async fn analytics(
    _admin: AdminSession,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let log = state.store.analytics.get().await;
    Ok(ApiResponse::success(log.series(Utc::now(), ANALYTICS_MONTHS)))
}

pub async fn messages(
    _admin: AdminSession,
    state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let mut messages = state.store.messages.all().await;
    messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
    Ok(ApiResponse::success(messages))
}

pub async fn mark_read(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let message = state
        .store
        .messages
        .update(path.into_inner(), |message| message.read = true)
        .await?;
    Ok(ApiResponse::success(message))
}
