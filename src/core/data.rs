use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use awc::Client;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::AppError;

const MAX_REMOTE_BODY: usize = 8 * 1024 * 1024;

/// A row in one of the JSON collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Singular name used in logs and `not found` errors.
    const NAME: &'static str;

    fn id(&self) -> u32;
    fn set_id(&mut self, id: u32);
}

pub fn load_from_storage<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path).map_err(|error| {
        error!("Error opening {}: {}", path.display(), error);
        error
    })?;
    let mut buffer: Vec<u8> = Vec::new();
    let size = BufReader::new(file).read_to_end(&mut buffer)?;
    debug!("Read {} bytes from {}", size, path.display());
    serde_json::from_slice::<T>(&buffer).map_err(|error| {
        error!("Data in {} is malformed: {}", path.display(), error);
        error.into()
    })
}

/// Writes through a sibling `.json.tmp` file that is then renamed over `path`.
pub fn write_local_db<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp).map_err(|error| {
            error!("Could not create {}: {}", tmp.display(), error);
            error
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub async fn load_from_cdn<T: DeserializeOwned>(remote_path: &str) -> Result<T, AppError> {
    let client = Client::default();
    let mut response = client
        .get(remote_path)
        .send()
        .await
        .map_err(|error| AppError::Remote(format!("failed to reach {}: {}", remote_path, error)))?;

    if !response.status().is_success() {
        return Err(AppError::Remote(format!(
            "{} answered {}",
            remote_path,
            response.status()
        )));
    }

    let body = response
        .body()
        .limit(MAX_REMOTE_BODY)
        .await
        .map_err(|error| AppError::Remote(format!("failed to read remote body: {}", error)))?;
    info!("Remote data size: {}", body.len());

    serde_json::from_slice::<T>(&body)
        .map_err(|error| AppError::Remote(format!("remote data is malformed: {}", error)))
}

/// An in-memory copy of one JSON array file, written through on every change.
pub struct Collection<T: Record> {
    path: PathBuf,
    items: RwLock<Vec<T>>,
}

impl<T: Record> Collection<T> {
    /// Loads `path`, creating an empty collection file when it is missing.
    pub fn open(path: PathBuf) -> Result<Self, AppError> {
        let items = if path.exists() {
            load_from_storage::<Vec<T>>(&path)?
        } else {
            info!("Creating empty {} collection at {}", T::NAME, path.display());
            write_local_db(&path, &Vec::<T>::new())?;
            Vec::new()
        };
        Ok(Collection {
            path,
            items: RwLock::new(items),
        })
    }

    pub async fn all(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn get(&self, id: u32) -> Result<T, AppError> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or(AppError::NotFound(T::NAME))
    }

    pub async fn contains(&self, id: u32) -> bool {
        self.items.read().await.iter().any(|item| item.id() == id)
    }

    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Replaces the whole collection, e.g. after seeding from a remote copy.
    pub async fn reset(&self, items: Vec<T>) -> Result<(), AppError> {
        self.mutate(|current| {
            *current = items;
            Ok(())
        })
        .await
    }

    pub async fn insert(&self, mut item: T) -> Result<T, AppError> {
        let item = self
            .mutate(|items| {
                let id = items.iter().map(|item| item.id()).max().map_or(1, |max| max + 1);
                item.set_id(id);
                items.push(item.clone());
                Ok(item)
            })
            .await?;
        info!("Added {} {}", T::NAME, item.id());
        Ok(item)
    }

    pub async fn update<F>(&self, id: u32, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut T),
    {
        self.mutate(|items| {
            let slot = items
                .iter_mut()
                .find(|item| item.id() == id)
                .ok_or(AppError::NotFound(T::NAME))?;
            change(slot);
            slot.set_id(id);
            Ok(slot.clone())
        })
        .await
    }

    /// Like [`Collection::update`] but the closure may reject the change.
    pub async fn try_update<F>(&self, id: u32, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut T) -> Result<(), AppError>,
    {
        self.mutate(|items| {
            let slot = items
                .iter_mut()
                .find(|item| item.id() == id)
                .ok_or(AppError::NotFound(T::NAME))?;
            change(slot)?;
            slot.set_id(id);
            Ok(slot.clone())
        })
        .await
    }

    pub async fn remove(&self, id: u32) -> Result<T, AppError> {
        let removed = self
            .mutate(|items| {
                let index = items
                    .iter()
                    .position(|item| item.id() == id)
                    .ok_or(AppError::NotFound(T::NAME))?;
                Ok(items.remove(index))
            })
            .await?;
        info!("Deleted {} {}", T::NAME, id);
        Ok(removed)
    }

    /// Removes every record matching `predicate`, returning how many went.
    pub async fn remove_where<F>(&self, predicate: F) -> Result<usize, AppError>
    where
        F: Fn(&T) -> bool,
    {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            Ok(before - items.len())
        })
        .await
    }

    /// Applies `change` to a scratch copy and only swaps it in once it is on disk.
    async fn mutate<R, F>(&self, change: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, AppError>,
    {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        let result = change(&mut next)?;
        write_local_db(&self.path, &next)?;
        *items = next;
        Ok(result)
    }
}

/// A single JSON object file (profile, analytics).
pub struct Document<T> {
    path: PathBuf,
    value: RwLock<T>,
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned + Clone + Default + Send + Sync,
{
    pub fn open(path: PathBuf) -> Result<Self, AppError> {
        let value = if path.exists() {
            load_from_storage::<T>(&path)?
        } else {
            info!("Creating default document at {}", path.display());
            let value = T::default();
            write_local_db(&path, &value)?;
            value
        };
        Ok(Document {
            path,
            value: RwLock::new(value),
        })
    }

    pub async fn get(&self) -> T {
        self.value.read().await.clone()
    }

    pub async fn set(&self, value: T) -> Result<T, AppError> {
        self.update(|current| *current = value).await
    }

    pub async fn update<F>(&self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut T),
    {
        let mut value = self.value.write().await;
        let mut next = value.clone();
        change(&mut next);
        write_local_db(&self.path, &next)?;
        *value = next.clone();
        Ok(next)
    }
}
