//! Dashboard and visitor write payloads, their field rules, and how they
//! become stored records.

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use crate::core::data::Record;
use crate::core::validation::{clean_tags, non_blank, Validate, Validator};
use crate::types::{
    BlogPost, CommentAuthor, ContactMessage, Course, Difficulty, EntryKind, Material,
    MaterialKind, ProfileData, Project, SummaryFormat, TimelineEntry,
};

const VALID_URL: &str = "Please enter a valid URL.";

/// A validated payload that creates or overwrites a record.
pub trait Form: Validate + DeserializeOwned + 'static {
    type Record: Record;

    fn create(self) -> Self::Record;

    /// Overwrites the editable fields, leaving counters alone.
    fn apply(self, record: &mut Self::Record);
}

fn default_project_category() -> String {
    "web".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default = "default_project_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Validate for ProjectForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("title", &self.title, 2, "Title must be at least 2 characters.");
        rules.min_chars(
            "description",
            &self.description,
            10,
            "Description must be at least 10 characters.",
        );
        rules.url("image_url", &self.image_url, VALID_URL);
        rules.optional_url("demo_url", self.demo_url.as_deref(), VALID_URL);
        rules.optional_url("repo_url", self.repo_url.as_deref(), VALID_URL);
    }
}

impl Form for ProjectForm {
    type Record = Project;

    fn create(self) -> Project {
        let mut project = Project {
            id: 0,
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            demo_url: None,
            repo_url: None,
            category: String::new(),
            tags: Vec::new(),
            featured: false,
            likes: 0,
        };
        self.apply(&mut project);
        project
    }

    fn apply(self, project: &mut Project) {
        project.title = self.title.trim().to_string();
        project.description = self.description.trim().to_string();
        project.image_url = self.image_url.trim().to_string();
        project.demo_url = non_blank(self.demo_url);
        project.repo_url = non_blank(self.repo_url);
        project.category = self.category.trim().to_lowercase();
        project.tags = clean_tags(self.tags);
        project.featured = self.featured;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseForm {
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
    pub featured: bool,
}

impl Validate for CourseForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("name", &self.name, 2, "Name must be at least 2 characters.");
        rules.min_chars("code", &self.code, 2, "Code must be at least 2 characters.");
        rules.at_least("semester", self.semester, 1, "Semester must be at least 1.");
        rules.at_least("credits", self.credits, 1, "Credits must be at least 1.");
        if let Some(description) = &self.description {
            rules.min_chars(
                "description",
                description,
                10,
                "Description must be at least 10 characters.",
            );
        }
    }
}

impl Form for CourseForm {
    type Record = Course;

    fn create(self) -> Course {
        let mut course = Course {
            id: 0,
            name: String::new(),
            code: String::new(),
            difficulty: self.difficulty,
            semester: 0,
            credits: 0,
            description: None,
            summary_format: None,
            has_summary: false,
            featured: false,
            likes: 0,
            downloads: 0,
        };
        self.apply(&mut course);
        course
    }

    fn apply(self, course: &mut Course) {
        course.name = self.name.trim().to_string();
        course.code = self.code.trim().to_uppercase();
        course.difficulty = self.difficulty;
        course.semester = self.semester;
        course.credits = self.credits;
        course.description = non_blank(self.description);
        course.summary_format = self.summary_format;
        course.has_summary = self.summary_format.is_some();
        course.featured = self.featured;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogForm {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Validate for BlogForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("title", &self.title, 5, "Title must be at least 5 characters");
        rules.min_chars("excerpt", &self.excerpt, 10, "Excerpt must be at least 10 characters");
        rules.min_chars("content", &self.content, 50, "Content must be at least 50 characters");
        rules.optional_url("image_url", Some(&self.image_url), "Please enter a valid URL");
        rules.required("category", &self.category, "Category is required");
        rules.required("author", &self.author, "Author is required");
    }
}

impl Form for BlogForm {
    type Record = BlogPost;

    fn create(self) -> BlogPost {
        let mut post = BlogPost {
            id: 0,
            title: String::new(),
            excerpt: String::new(),
            content: String::new(),
            date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
            author: String::new(),
            image_url: String::new(),
            category: String::new(),
            tags: Vec::new(),
            featured: false,
            comment_count: 0,
        };
        self.apply(&mut post);
        post
    }

    fn apply(self, post: &mut BlogPost) {
        post.title = self.title.trim().to_string();
        post.excerpt = self.excerpt.trim().to_string();
        post.content = self.content;
        post.image_url = self.image_url.trim().to_string();
        post.category = self.category.trim().to_string();
        post.tags = clean_tags(self.tags);
        post.author = self.author.trim().to_string();
        post.featured = self.featured;
        if let Some(date) = self.date {
            post.date = date;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialForm {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub course_id: u32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Validate for MaterialForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("title", &self.title, 2, "Title must be at least 2 characters.");
        rules.min_chars(
            "description",
            &self.description,
            10,
            "Description must be at least 10 characters.",
        );
        rules.optional_url("url", self.url.as_deref(), VALID_URL);
    }
}

impl Form for MaterialForm {
    type Record = Material;

    fn create(self) -> Material {
        let mut material = Material {
            id: 0,
            title: String::new(),
            description: String::new(),
            kind: self.kind,
            course_id: self.course_id,
            size: String::new(),
            url: None,
            downloads: 0,
        };
        self.apply(&mut material);
        material
    }

    fn apply(self, material: &mut Material) {
        material.title = self.title.trim().to_string();
        material.description = self.description.trim().to_string();
        material.kind = self.kind;
        material.course_id = self.course_id;
        material.size = self.size.trim().to_string();
        material.url = non_blank(self.url);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryForm {
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

impl EntryForm {
    /// `end_date: "Present"` is the same as `current: true`.
    fn is_current(&self) -> bool {
        self.current
            || self
                .end_date
                .as_deref()
                .is_some_and(|end| end.trim().eq_ignore_ascii_case("present"))
    }
}

impl Validate for EntryForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("title", &self.title, 2, "Title must be at least 2 characters.");
        rules.min_chars(
            "organization",
            &self.organization,
            2,
            "Organization must be at least 2 characters.",
        );
        if let Some(description) = &self.description {
            rules.min_chars(
                "description",
                description,
                10,
                "Description must be at least 10 characters.",
            );
        }
        rules.min_chars("start_date", &self.start_date, 4, "Start date is required.");
        if !self.is_current() {
            rules.min_chars(
                "end_date",
                self.end_date.as_deref().unwrap_or(""),
                4,
                "End date is required.",
            );
        }
    }
}

impl Form for EntryForm {
    type Record = TimelineEntry;

    fn create(self) -> TimelineEntry {
        let mut entry = TimelineEntry {
            id: 0,
            kind: self.kind,
            title: String::new(),
            organization: String::new(),
            location: None,
            start_date: String::new(),
            end_date: None,
            current: false,
            description: None,
        };
        self.apply(&mut entry);
        entry
    }

    fn apply(self, entry: &mut TimelineEntry) {
        let current = self.is_current();
        entry.kind = self.kind;
        entry.title = self.title.trim().to_string();
        entry.organization = self.organization.trim().to_string();
        entry.location = non_blank(self.location);
        entry.start_date = self.start_date.trim().to_string();
        entry.end_date = if current { None } else { non_blank(self.end_date) };
        entry.current = current;
        entry.description = non_blank(self.description);
    }
}

impl Validate for ProfileData {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("full_name", &self.full_name, 2, "Name must be at least 2 characters.");
        rules.min_chars("title", &self.title, 2, "Title must be at least 2 characters.");
        rules.min_chars("bio", &self.bio, 10, "Bio must be at least 10 characters.");
        rules.email("email", &self.email, "Please enter a valid email address.");
        rules.min_chars("phone", &self.phone, 5, "Phone number must be at least 5 characters.");
        rules.min_chars("location", &self.location, 2, "Location must be at least 2 characters.");
        rules.url("avatar_url", &self.avatar_url, VALID_URL);
        rules.optional_url("links.github", Some(&self.links.github), VALID_URL);
        rules.optional_url("links.linkedin", Some(&self.links.linkedin), VALID_URL);
        rules.optional_url("links.twitter", Some(&self.links.twitter), VALID_URL);
        rules.optional_url("links.website", Some(&self.links.website), VALID_URL);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl Validate for ContactForm {
    fn check(&self, rules: &mut Validator) {
        rules.min_chars("name", &self.name, 2, "Name must be at least 2 characters.");
        rules.email("email", &self.email, "Please enter a valid email address.");
        rules.min_chars("subject", &self.subject, 5, "Subject must be at least 5 characters.");
        rules.min_chars("message", &self.message, 10, "Message must be at least 10 characters.");
    }
}

impl ContactForm {
    pub fn into_message(self) -> ContactMessage {
        ContactMessage {
            id: 0,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
            received_at: Utc::now(),
            read: false,
        }
    }
}

pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub author: CommentAuthor,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<u32>,
}

impl Validate for CommentForm {
    fn check(&self, rules: &mut Validator) {
        rules.required("author.name", &self.author.name, "Name is required");
        rules.required("content", &self.content, "Comment cannot be empty");
        rules.max_chars(
            "content",
            &self.content,
            MAX_COMMENT_CHARS,
            "Comment must be at most 2000 characters",
        );
    }
}
