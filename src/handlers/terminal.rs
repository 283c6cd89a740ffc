use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiResponse, AppError},
    server::AppState,
    terminal::{CommandOutput, Direction, Outcome, TerminalContext, Theme},
};

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub command: String,
}

#[derive(Serialize)]
struct CommandReply {
    session_id: Uuid,
    output: Option<CommandOutput>,
    cleared: bool,
    theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub direction: Direction,
}

#[derive(Serialize)]
struct HistoryReply {
    input: String,
}

/// Runs one command, opening a session when the client has none yet.
pub async fn run(
    state: Data<AppState>,
    request: Json<CommandRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = state.store.profile.get().await;
    let projects = state.store.projects.all().await;
    let ctx = TerminalContext {
        profile: &profile,
        projects: &projects,
        now: Utc::now(),
    };

    let (session_id, (outcome, theme)) = state
        .terminals
        .with_session(request.session_id, ctx.now, |terminal| {
            let outcome = terminal.submit(&request.command, &ctx);
            (outcome, terminal.theme())
        })
        .await;

    let (output, cleared) = match outcome {
        Some(Outcome::Output(output)) => (Some(output), false),
        Some(Outcome::Cleared) => (None, true),
        None => (None, false),
    };
    Ok(ApiResponse::success(CommandReply {
        session_id,
        output,
        cleared,
        theme,
    }))
}

pub async fn history(
    state: Data<AppState>,
    path: Path<Uuid>,
    request: Json<HistoryRequest>,
) -> Result<HttpResponse, AppError> {
    let direction = request.direction;
    let input = state
        .terminals
        .with_existing(path.into_inner(), Utc::now(), |terminal| match direction {
            Direction::Up => terminal.history_up(),
            Direction::Down => terminal.history_down(),
        })
        .await
        .ok_or(AppError::NotFound("terminal session"))?;
    Ok(ApiResponse::success(HistoryReply { input }))
}

pub async fn show(state: Data<AppState>, path: Path<Uuid>) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let view = state
        .terminals
        .with_existing(session_id, Utc::now(), |terminal| terminal.view(session_id))
        .await
        .ok_or(AppError::NotFound("terminal session"))?;
    Ok(ApiResponse::success(view))
}
