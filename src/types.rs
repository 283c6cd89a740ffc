use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Project {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub likes: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Pdf,
    Markdown,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Course {
    pub id: u32,
    pub name: String,
    pub code: String,
    pub difficulty: Difficulty,
    pub semester: u32,
    pub credits: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary_format: Option<SummaryFormat>,
    #[serde(default)]
    pub has_summary: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub downloads: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlogPost {
    pub id: u32,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub date: NaiveDate,
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub comment_count: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CommentAuthor {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Stored flat; `parent_id` points at a top-level comment of the same post.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: u32,
    pub post_id: u32,
    #[serde(default)]
    pub parent_id: Option<u32>,
    pub author: CommentAuthor,
    pub content: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub likes: u32,
}

/// A top-level comment with its replies, oldest reply first.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "ZIP")]
    Zip,
    #[serde(rename = "DOC")]
    Doc,
    #[serde(rename = "PPT")]
    Ppt,
    #[serde(rename = "XLS")]
    Xls,
    #[serde(rename = "MP4")]
    Mp4,
    Other,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Pdf => "PDF",
            MaterialKind::Zip => "ZIP",
            MaterialKind::Doc => "DOC",
            MaterialKind::Ppt => "PPT",
            MaterialKind::Xls => "XLS",
            MaterialKind::Mp4 => "MP4",
            MaterialKind::Other => "Other",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Material {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub course_id: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub downloads: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Experience,
    Education,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Experience => "experience",
            EntryKind::Education => "education",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileLinks {
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub start_year: String,
    pub end_year: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Experience {
    pub position: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProfileData {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub avatar_url: String,
    #[serde(default)]
    pub links: ProfileLinks,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Default for ProfileData {
    fn default() -> Self {
        ProfileData {
            full_name: "New Owner".to_string(),
            title: "Developer".to_string(),
            email: "owner@example.com".to_string(),
            phone: "00000".to_string(),
            location: "Earth".to_string(),
            bio: "Tell visitors who you are.".to_string(),
            avatar_url: "https://example.com/avatar.svg".to_string(),
            links: ProfileLinks::default(),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Service {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub price: String,
    #[serde(default)]
    pub popular: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContactMessage {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}
