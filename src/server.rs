use std::{io::Result, net::SocketAddr, path::PathBuf};

use actix_cors::Cors;
use actix_web::{
    middleware::Logger,
    web::{self, resource, scope, Data, JsonConfig, PathConfig, QueryConfig},
    App, HttpServer,
};
use tracing::info;

use crate::{
    auth::Sessions,
    core::store::Store,
    error::AppError,
    forms::{BlogForm, CourseForm, EntryForm, ProjectForm},
    handlers::{
        blogs, courses, create_record, dashboard, delete_record, get_record, home, like,
        list_records, list_services, materials, profile, session, status_handler, submit_contact,
        terminal, unlike, update_record,
    },
    terminal::TerminalSessions,
    types::{BlogPost, Course, Material, Project, TimelineEntry},
};

/// Everything the handlers share across workers.
pub struct AppState {
    pub store: Store,
    pub sessions: Sessions,
    pub terminals: TerminalSessions,
    pub key_path: PathBuf,
}

impl AppState {
    pub fn new(store: Store, key_path: PathBuf, session_ttl_hours: u32) -> Self {
        AppState {
            store,
            sessions: Sessions::new(session_ttl_hours),
            terminals: TerminalSessions::default(),
            key_path,
        }
    }
}

pub async fn start_server(addr: SocketAddr, state: Data<AppState>) -> Result<()> {
    info!("Listening on http://{}", addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_header()
                    .allow_any_method(),
            )
    })
    .bind(addr)?
    .run()
    .await
}

/// Registers every `/api` route. Literal segments go before `{id}` siblings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|error, _| {
        AppError::BadRequest(error.to_string()).into()
    }))
    .app_data(QueryConfig::default().error_handler(|error, _| {
        AppError::BadRequest(error.to_string()).into()
    }))
    .app_data(PathConfig::default().error_handler(|error, _| {
        AppError::BadRequest(error.to_string()).into()
    }))
    .service(
        scope("/api")
            .service(resource("/status").route(web::get().to(status_handler)))
            .service(resource("/home").route(web::get().to(home::home)))
            .service(resource("/login").route(web::post().to(session::login)))
            .service(resource("/logout").route(web::post().to(session::logout)))
            // projects
            .service(
                resource("/projects")
                    .route(web::get().to(list_records::<Project>))
                    .route(web::post().to(create_record::<ProjectForm>)),
            )
            .service(
                resource("/projects/{id}")
                    .route(web::get().to(get_record::<Project>))
                    .route(web::put().to(update_record::<ProjectForm>))
                    .route(web::delete().to(delete_record::<Project>)),
            )
            .service(
                resource("/projects/{id}/like")
                    .route(web::post().to(like::<Project>))
                    .route(web::delete().to(unlike::<Project>)),
            )
            // courses
            .service(
                resource("/courses")
                    .route(web::get().to(list_records::<Course>))
                    .route(web::post().to(create_record::<CourseForm>)),
            )
            .service(
                resource("/courses/{id}")
                    .route(web::get().to(courses::detail))
                    .route(web::put().to(update_record::<CourseForm>))
                    .route(web::delete().to(courses::delete)),
            )
            .service(
                resource("/courses/{id}/like")
                    .route(web::post().to(like::<Course>))
                    .route(web::delete().to(unlike::<Course>)),
            )
            .service(resource("/courses/{id}/download").route(web::post().to(courses::download)))
            // blog
            .service(
                resource("/blogs")
                    .route(web::get().to(list_records::<BlogPost>))
                    .route(web::post().to(create_record::<BlogForm>)),
            )
            .service(resource("/blogs/categories").route(web::get().to(blogs::categories)))
            .service(
                resource("/blogs/{id}")
                    .route(web::get().to(blogs::detail))
                    .route(web::put().to(update_record::<BlogForm>))
                    .route(web::delete().to(blogs::delete)),
            )
            .service(
                resource("/blogs/{id}/comments")
                    .route(web::get().to(blogs::list_comments))
                    .route(web::post().to(blogs::add_comment)),
            )
            .service(
                resource("/blogs/{id}/comments/{comment_id}/like")
                    .route(web::post().to(blogs::like_comment))
                    .route(web::delete().to(blogs::unlike_comment)),
            )
            // materials
            .service(
                resource("/materials")
                    .route(web::get().to(materials::list))
                    .route(web::post().to(materials::create)),
            )
            .service(
                resource("/materials/{id}")
                    .route(web::get().to(get_record::<Material>))
                    .route(web::put().to(materials::update))
                    .route(web::delete().to(delete_record::<Material>)),
            )
            .service(
                resource("/materials/{id}/download").route(web::post().to(materials::download)),
            )
            // timeline
            .service(
                resource("/entries")
                    .route(web::get().to(list_records::<TimelineEntry>))
                    .route(web::post().to(create_record::<EntryForm>)),
            )
            .service(
                resource("/entries/{id}")
                    .route(web::get().to(get_record::<TimelineEntry>))
                    .route(web::put().to(update_record::<EntryForm>))
                    .route(web::delete().to(delete_record::<TimelineEntry>)),
            )
            // profile and site
            .service(
                resource("/profile")
                    .route(web::get().to(profile::get_profile))
                    .route(web::put().to(profile::put_profile)),
            )
            .service(resource("/services").route(web::get().to(list_services)))
            .service(resource("/contact").route(web::post().to(submit_contact)))
            // terminal
            .service(resource("/terminal").route(web::post().to(terminal::run)))
            .service(resource("/terminal/{session}").route(web::get().to(terminal::show)))
            .service(
                resource("/terminal/{session}/history").route(web::post().to(terminal::history)),
            )
            // dashboard
            .service(resource("/dashboard/overview").route(web::get().to(dashboard::overview)))
            .service(resource("/dashboard/analytics").route(web::get().to(dashboard::analytics)))
            .service(resource("/dashboard/messages").route(web::get().to(dashboard::messages)))
            .service(
                resource("/dashboard/messages/{id}/read").route(web::put().to(dashboard::mark_read)),
            ),
    );
}
