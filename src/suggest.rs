//! Draft-title suggestions.
//!
//! A keyword scan over the in-progress title proposes a category, a
//! priority, and tags for the new-task form. Suggestions only ever
//! touch the draft; stored tasks are never modified, and the view skips
//! any field the user has already set by hand.

use crate::tasks::models::{normalize_tags, parse_tag_list, Priority};
use once_cell::sync::Lazy;
use regex::Regex;

static STUDY_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(study|studying|revise|exam)\b").unwrap());
static WORK_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(meeting|client|report)\b").unwrap());
static SHOPPING_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(groceries|shopping|buy)\b").unwrap());
static URGENT_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(urgent|today)\b").unwrap());
static TOMORROW_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btomorrow\b").unwrap());

/// A proposed adjustment to the new-task draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestion {
    /// Proposed category name, if a keyword matched.
    pub category: Option<String>,
    /// Proposed priority, if a keyword matched.
    pub priority: Option<Priority>,
    /// Proposed tags, already `#`-prefixed.
    pub tags: Vec<String>,
}

impl Suggestion {
    /// Whether the scan produced nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.priority.is_none() && self.tags.is_empty()
    }
}

/// Scan `title` for keyword patterns.
///
/// Category keywords are exclusive (first match wins); the urgency scan
/// runs independently so a title can suggest both.
#[must_use]
pub fn suggest_for_title(title: &str) -> Suggestion {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Suggestion::default();
    }

    let mut suggestion = Suggestion::default();

    if STUDY_WORDS.is_match(trimmed) {
        suggestion.category = Some("Personal".to_string());
        suggestion.tags.push("#study".to_string());
        suggestion.tags.push("#exam".to_string());
    } else if WORK_WORDS.is_match(trimmed) {
        suggestion.category = Some("Work".to_string());
        suggestion.tags.push("#work".to_string());
    } else if SHOPPING_WORDS.is_match(trimmed) {
        suggestion.category = Some("Shopping".to_string());
        suggestion.tags.push("#shopping".to_string());
    }

    if URGENT_WORDS.is_match(trimmed) {
        suggestion.priority = Some(Priority::High);
        suggestion.tags.push("#urgent".to_string());
    } else if TOMORROW_WORD.is_match(trimmed) {
        suggestion.priority = Some(Priority::Normal);
    }

    suggestion
}

/// Merge suggested tags into the user's tag text.
///
/// Existing fragments keep their order and spelling; suggested tags are
/// appended unless already present case-insensitively. The result is
/// space-joined, ready for the tags box.
#[must_use]
pub fn merge_tags(existing: &str, suggested: &[String]) -> String {
    let mut tags = parse_tag_list(existing);
    let additions = normalize_tags(suggested.iter().map(String::as_str));
    for tag in additions {
        if !tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            tags.push(tag);
        }
    }
    tags.join(" ")
}
