use actix_web::{
    web::{Data, Path},
    HttpResponse,
};
use serde::Serialize;
use tracing::info;

use crate::{
    analytics::Event,
    error::{ApiResponse, AppError},
    handlers::AdminSession,
    server::AppState,
    types::{Course, Material},
};

#[derive(Serialize)]
struct CourseDetail {
    course: Course,
    materials: Vec<Material>,
}

pub async fn detail(state: Data<AppState>, path: Path<u32>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let course = state.store.courses.get(id).await?;
    let materials = state
        .store
        .materials
        .filter(|material| material.course_id == id)
        .await;
    Ok(ApiResponse::success(CourseDetail { course, materials }))
}

/// Counts a download of the course summary.
pub async fn download(state: Data<AppState>, path: Path<u32>) -> Result<HttpResponse, AppError> {
    let course = state
        .store
        .courses
        .try_update(path.into_inner(), |course| {
            if !course.has_summary {
                return Err(AppError::BadRequest(format!(
                    "{} has no summary to download",
                    course.code
                )));
            }
            course.downloads = course.downloads.saturating_add(1);
            Ok(())
        })
        .await?;
    state.store.track(Event::Download).await;
    Ok(ApiResponse::success(course))
}

/// Removes the course together with its materials.
pub async fn delete(
    _admin: AdminSession,
    state: Data<AppState>,
    path: Path<u32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    state.store.courses.remove(id).await?;
    let removed = state
        .store
        .materials
        .remove_where(|material| material.course_id == id)
        .await?;
    info!("Removed {} materials with course {}", removed, id);
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::handlers::testing::{bearer, env, test_app};

    fn course_body(summary: Option<&str>) -> Value {
        json!({
            "name": "Data Structures",
            "code": "cs201",
            "difficulty": "normal",
            "semester": 2,
            "credits": 4,
            "summary_format": summary
        })
    }

    fn material_body(course_id: u32) -> Value {
        json!({
            "title": "Lecture Notes",
            "description": "Week one notes on linked lists.",
            "type": "PDF",
            "course_id": course_id,
            "size": "2.4 MB"
        })
    }

    #[actix_web::test]
    async fn detail_includes_materials_and_delete_cascades() {
        let env = env();
        let app = test_app!(env.state);
        let auth = bearer(&env.state).await;

        let req = test::TestRequest::post()
            .uri("/api/courses")
            .insert_header(auth.clone())
            .set_json(course_body(None))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["data"]["code"], "CS201");

        let req = test::TestRequest::post()
            .uri("/api/materials")
            .insert_header(auth.clone())
            .set_json(material_body(1))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/courses/1").to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["data"]["materials"][0]["type"], "PDF");

        let req = test::TestRequest::delete()
            .uri("/api/courses/1")
            .insert_header(auth)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(env.state.store.materials.len().await, 0);
    }

    #[actix_web::test]
    async fn download_needs_a_summary() {
        let env = env();
        let app = test_app!(env.state);
        let auth = bearer(&env.state).await;
        for summary in [None, Some("pdf")] {
            let req = test::TestRequest::post()
                .uri("/api/courses")
                .insert_header(auth.clone())
                .set_json(course_body(summary))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::post().uri("/api/courses/1/download").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/courses/2/download").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["downloads"], 1);
        assert_eq!(env.state.store.analytics.get().await.totals().downloads, 1);
    }

    #[actix_web::test]
    async fn list_filters_by_difficulty() {
        let env = env();
        let app = test_app!(env.state);
        let auth = bearer(&env.state).await;
        let req = test::TestRequest::post()
            .uri("/api/courses")
            .insert_header(auth)
            .set_json(course_body(None))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/courses?category=hard")
            .to_request();
        let hard: Value = test::call_and_read_body_json(&app, req).await;
        let req = test::TestRequest::get()
            .uri("/api/courses?category=normal")
            .to_request();
        let normal: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(hard["data"]["total"], 0);
        assert_eq!(normal["data"]["total"], 1);
    }
}
