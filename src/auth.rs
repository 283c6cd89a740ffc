use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read, Result},
    path::Path,
};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;

/// Reads the dashboard pass key; trailing whitespace and newlines are dropped.
pub fn get_local_passkey(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|error| {
        error!("Could not open key file {}: {}", path.display(), error);
        error
    })?;
    let mut buffer = String::new();
    BufReader::new(file)
        .read_to_string(&mut buffer)
        .map_err(|error| {
            error!("Could not read key file: {}", error);
            error
        })?;
    Ok(buffer.trim_end().to_string())
}

pub fn check_auth(local_key: &str, remote_key: &str) -> std::result::Result<(), AppError> {
    if local_key.is_empty() {
        warn!("Pass key file is empty, refusing every login");
        return Err(AppError::Unauthorized("login is disabled"));
    }
    if local_key == remote_key {
        Ok(())
    } else {
        warn!("Failed to authorize: pass key is incorrect");
        Err(AppError::Unauthorized("pass key is incorrect"))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Bearer tokens handed out by `/api/login`.
pub struct Sessions {
    ttl: Duration,
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Sessions {
    pub fn new(ttl_hours: u32) -> Self {
        Sessions {
            ttl: Duration::hours(i64::from(ttl_hours)),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub async fn login(&self, local_key: &str, remote_key: &str) -> std::result::Result<Session, AppError> {
        self.login_at(local_key, remote_key, Utc::now()).await
    }

    pub async fn authorize(&self, token: &str) -> std::result::Result<(), AppError> {
        self.authorize_at(token, Utc::now()).await
    }

    /// Returns whether the token was live.
    pub async fn logout(&self, token: &str) -> bool {
        let removed = self.tokens.write().await.remove(token).is_some();
        if removed {
            info!("Session revoked");
        }
        removed
    }

    async fn login_at(
        &self,
        local_key: &str,
        remote_key: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Session, AppError> {
        check_auth(local_key, remote_key)?;
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            expires_at: now + self.ttl,
        };
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, expires_at| *expires_at > now);
        tokens.insert(session.token.clone(), session.expires_at);
        info!("Issued session expiring at {}", session.expires_at);
        Ok(session)
    }

    async fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<(), AppError> {
        let expires_at = self.tokens.read().await.get(token).copied();
        match expires_at {
            Some(expires_at) if expires_at > now => Ok(()),
            Some(_) => {
                self.tokens.write().await.remove(token);
                Err(AppError::Unauthorized("session expired"))
            }
            None => Err(AppError::Unauthorized("unknown session token")),
        }
    }
}
