use email_address::EmailAddress;
use url::Url;

use crate::error::{AppError, FieldErrors};

/// A write payload with declarative field rules.
pub trait Validate {
    fn check(&self, rules: &mut Validator);

    fn validate(&self) -> Result<(), AppError> {
        let mut rules = Validator::default();
        self.check(&mut rules);
        rules.finish()
    }
}

/// Collects the first failing message per field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn fail(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Length counts characters after trimming.
    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.fail(field, message);
        }
    }

    pub fn max_chars(&mut self, field: &str, value: &str, max: usize, message: &str) {
        if value.trim().chars().count() > max {
            self.fail(field, message);
        }
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) {
        self.min_chars(field, value, 1, message);
    }

    pub fn at_least(&mut self, field: &str, value: u32, min: u32, message: &str) {
        if value < min {
            self.fail(field, message);
        }
    }

    pub fn url(&mut self, field: &str, value: &str, message: &str) {
        if !is_url(value) {
            self.fail(field, message);
        }
    }

    /// Absent or blank passes; anything else must parse as a URL.
    pub fn optional_url(&mut self, field: &str, value: Option<&str>, message: &str) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.url(field, value, message);
        }
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) {
        if !EmailAddress::is_valid(value.trim()) {
            self.fail(field, message);
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

pub fn is_url(value: &str) -> bool {
    Url::parse(value.trim()).is_ok()
}

/// `None` for blank strings, trimmed otherwise.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims tags, drops blanks and repeats while keeping first-seen order.
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|seen| seen == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut rules = Validator::default();
        rules.min_chars("title", "", 2, "too short");
        rules.required("title", "", "required");

        match rules.finish() {
            Err(AppError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["title"], "too short");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn length_ignores_surrounding_whitespace_and_counts_chars() {
        let mut rules = Validator::default();
        rules.min_chars("a", "  x  ", 2, "short");
        rules.min_chars("b", "éé", 2, "short");

        let err = rules.finish().unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains_key("a"));
                assert!(!fields.contains_key("b"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn urls_and_emails() {
        assert!(is_url("https://github.com/someone"));
        assert!(!is_url("/placeholder.svg"));
        assert!(!is_url("not a url"));

        let mut rules = Validator::default();
        rules.optional_url("demo", Some(""), "bad");
        rules.optional_url("repo", None, "bad");
        rules.email("email", "hadi@example.com", "bad");
        assert!(rules.errors.is_empty());

        rules.email("email", "hadi@", "Please enter a valid email address.");
        assert_eq!(rules.errors["email"], "Please enter a valid email address.");
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![
            " React ".to_string(),
            "".to_string(),
            "React".to_string(),
            "CSS".to_string(),
        ];

        assert_eq!(clean_tags(tags), vec!["React", "CSS"]);
    }

    #[test]
    fn non_blank_drops_whitespace() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" x ".to_string())), Some("x".to_string()));
    }
}
