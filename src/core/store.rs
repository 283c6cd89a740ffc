use std::{fs, path::Path};

use chrono::Utc;
use tracing::{info, warn};

use crate::analytics::{AnalyticsLog, Event};
use crate::core::data::{load_from_cdn, Collection, Document, Record};
use crate::error::AppError;

/// Catalogue written to an empty services collection.
const DEFAULT_SERVICES: &str = include_str!("../../core/services.json");
use crate::types::{
    BlogPost, Comment, ContactMessage, Course, Material, ProfileData, Project, Service,
    TimelineEntry,
};

/// Every collection the site serves, each backed by its own file in the data directory.
pub struct Store {
    pub projects: Collection<Project>,
    pub courses: Collection<Course>,
    pub blogs: Collection<BlogPost>,
    pub comments: Collection<Comment>,
    pub materials: Collection<Material>,
    pub entries: Collection<TimelineEntry>,
    pub services: Collection<Service>,
    pub messages: Collection<ContactMessage>,
    pub profile: Document<ProfileData>,
    pub analytics: Document<AnalyticsLog>,
}

/// A record type that lives in one of the [`Store`] collections.
pub trait Stored: Record {
    fn collection(store: &Store) -> &Collection<Self>;
}

macro_rules! stored_record {
    ($ty:ty, $name:literal, $field:ident) => {
        impl Record for $ty {
            const NAME: &'static str = $name;

            fn id(&self) -> u32 {
                self.id
            }

            fn set_id(&mut self, id: u32) {
                self.id = id;
            }
        }

        impl Stored for $ty {
            fn collection(store: &Store) -> &Collection<Self> {
                &store.$field
            }
        }
    };
}

stored_record!(Project, "project", projects);
stored_record!(Course, "course", courses);
stored_record!(BlogPost, "blog post", blogs);
stored_record!(Comment, "comment", comments);
stored_record!(Material, "material", materials);
stored_record!(TimelineEntry, "entry", entries);
stored_record!(Service, "service", services);
stored_record!(ContactMessage, "message", messages);

impl Store {
    /// Opens (and on first run creates) every file under `dir`.
    pub fn open(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        let store = Store {
            projects: Collection::open(dir.join("projects.json"))?,
            courses: Collection::open(dir.join("courses.json"))?,
            blogs: Collection::open(dir.join("blogs.json"))?,
            comments: Collection::open(dir.join("comments.json"))?,
            materials: Collection::open(dir.join("materials.json"))?,
            entries: Collection::open(dir.join("entries.json"))?,
            services: Collection::open(dir.join("services.json"))?,
            messages: Collection::open(dir.join("messages.json"))?,
            profile: Document::open(dir.join("profile.json"))?,
            analytics: Document::open(dir.join("analytics.json"))?,
        };
        info!("Opened data directory {}", dir.display());
        Ok(store)
    }

    /// Fills an empty projects collection from `remote_url`. Returns how many were imported.
    pub async fn seed_projects(&self, remote_url: &str) -> Result<usize, AppError> {
        if self.projects.len().await > 0 {
            return Ok(0);
        }
        let projects: Vec<Project> = load_from_cdn(remote_url).await?;
        let count = projects.len();
        self.projects.reset(renumber(projects)).await?;
        info!("Seeded {} projects from {}", count, remote_url);
        Ok(count)
    }

    /// Fills an empty services collection with the bundled catalogue.
    pub async fn seed_services(&self) -> Result<usize, AppError> {
        if self.services.len().await > 0 {
            return Ok(0);
        }
        let services: Vec<Service> = serde_json::from_str(DEFAULT_SERVICES)?;
        let count = services.len();
        self.services.reset(renumber(services)).await?;
        info!("Seeded {} services", count);
        Ok(count)
    }

    /// Best effort: a failed analytics write never fails the request.
    pub async fn track(&self, event: Event) {
        if let Err(error) = self
            .analytics
            .update(|log| log.record(event, Utc::now()))
            .await
        {
            warn!("Could not record {:?}: {}", event, error);
        }
    }
}

/// Ids from outside sources can repeat or be zero; stored ids run from 1.
fn renumber<T: Record>(mut items: Vec<T>) -> Vec<T> {
    for (id, item) in (1..).zip(items.iter_mut()) {
        item.set_id(id);
    }
    items
}
