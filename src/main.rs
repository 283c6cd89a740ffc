use std::{
    io::{Error, ErrorKind, Result},
    path::Path,
};

use actix_web::web::Data;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    core::{
        settings::{Settings, SETTINGS_PATH},
        store::Store,
    },
    server::{start_server, AppState},
};

mod analytics;
mod auth;
mod core;
mod error;
mod forms;
mod handlers;
mod server;
mod terminal;
mod types;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Starting folio...");

    let mut settings = Settings::load(Path::new(SETTINGS_PATH))
        .map_err(|err| Error::new(ErrorKind::InvalidData, err))?;
    settings
        .apply_overrides(|name| std::env::var(name).ok())
        .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

    let store = Store::open(&settings.data_dir()).map_err(Error::other)?;
    store.seed_services().await.map_err(Error::other)?;
    if let Some(url) = settings.remote_url() {
        match store.seed_projects(url).await {
            Ok(0) => {}
            Ok(count) => info!("Imported {} projects", count),
            Err(err) => warn!("Skipping remote seed: {}", err),
        }
    }

    let state = Data::new(AppState::new(
        store,
        settings.key_file(),
        settings.session_ttl_hours.value,
    ));
    start_server(settings.addr(), state).await
}
