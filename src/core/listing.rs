use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::data::Record;
use crate::types::{BlogPost, Course, Material, Project, TimelineEntry};

pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Latest,
    Oldest,
    #[serde(alias = "popular")]
    Comments,
}

/// Query string accepted by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
}

/// A record that can be searched, bucketed by category and ordered.
pub trait Listable: Record {
    /// Page size used when the query gives none; `None` returns everything.
    const DEFAULT_PER_PAGE: Option<u32> = None;
    const DEFAULT_SORT: Option<SortOrder> = None;

    fn haystacks(&self) -> Vec<&str>;
    fn category(&self) -> &str;

    fn date(&self) -> Option<NaiveDate> {
        None
    }

    /// Comment count for posts, likes or downloads elsewhere.
    fn popularity(&self) -> u32 {
        0
    }
}

pub fn matches_search<T: Listable>(item: &T, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || item
            .haystacks()
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
}

pub fn matches_category<T: Listable>(item: &T, category: Option<&str>) -> bool {
    match category.map(str::trim) {
        None | Some("") | Some("all") => true,
        Some(category) => item.category().eq_ignore_ascii_case(category),
    }
}

pub fn filter<T: Listable>(items: Vec<T>, query: &ListQuery) -> Vec<T> {
    let term = query.search.as_deref().unwrap_or("");
    items
        .into_iter()
        .filter(|item| matches_search(item, term) && matches_category(item, query.category.as_deref()))
        .collect()
}

fn recency<T: Listable>(a: &T, b: &T) -> Ordering {
    match (a.date(), b.date()) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => a.id().cmp(&b.id()),
    }
}

/// Stable: equal keys keep their incoming order.
pub fn sort<T: Listable>(items: &mut [T], order: SortOrder) {
    match order {
        SortOrder::Latest => items.sort_by(|a, b| recency(b, a)),
        SortOrder::Oldest => items.sort_by(recency),
        SortOrder::Comments => items.sort_by(|a, b| b.popularity().cmp(&a.popularity())),
    }
}

/// 1-based pages; page 0 reads as page 1 and a page past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Page<T> {
    let total = items.len() as u32;
    let per_page = match per_page {
        Some(size) => size.clamp(1, MAX_PER_PAGE),
        None => total.max(1),
    };
    let page = page.unwrap_or(1).max(1);
    let total_pages = total.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page) as usize;

    Page {
        items: items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect(),
        page,
        per_page,
        total,
        total_pages,
    }
}

pub fn list<T: Listable>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let mut items = filter(items, query);
    if let Some(order) = query.sort.or(T::DEFAULT_SORT) {
        sort(&mut items, order);
    }
    paginate(items, query.page, query.per_page.or(T::DEFAULT_PER_PAGE))
}

/// `"all"` followed by each distinct category in first-seen order.
pub fn categories<T: Listable>(items: &[T]) -> Vec<String> {
    let mut categories = vec!["all".to_string()];
    for item in items {
        if !categories.iter().any(|seen| seen == item.category()) {
            categories.push(item.category().to_string());
        }
    }
    categories
}

impl Listable for Project {
    fn haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn popularity(&self) -> u32 {
        self.likes
    }
}

impl Listable for Course {
    fn haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.code.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn category(&self) -> &str {
        self.difficulty.as_str()
    }

    fn popularity(&self) -> u32 {
        self.likes
    }
}

impl Listable for BlogPost {
    const DEFAULT_PER_PAGE: Option<u32> = Some(4);
    const DEFAULT_SORT: Option<SortOrder> = Some(SortOrder::Latest);

    fn haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.excerpt.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn popularity(&self) -> u32 {
        self.comment_count
    }
}

impl Listable for Material {
    fn haystacks(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }

    fn category(&self) -> &str {
        self.kind.as_str()
    }

    fn popularity(&self) -> u32 {
        self.downloads
    }
}

impl Listable for TimelineEntry {
    fn haystacks(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.organization.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn category(&self) -> &str {
        self.kind.as_str()
    }
}
