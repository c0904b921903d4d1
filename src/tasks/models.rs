//! Task model types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category given to tasks created without an explicit choice.
pub const DEFAULT_CATEGORY: &str = "General";

/// Task priority levels (stored as the integer value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    /// Low priority.
    Low = 0,
    /// Normal priority (default).
    #[default]
    Normal = 1,
    /// High priority.
    High = 2,
}

impl Priority {
    /// Create a priority from its stored integer value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not 0, 1, or 2.
    pub const fn from_i64(value: i64) -> Result<Self, InvalidPriority> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            _ => Err(InvalidPriority(value)),
        }
    }

    /// Get the stored integer value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Error when an invalid priority value is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPriority(pub i64);

impl std::fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid priority: {} (must be 0-2)", self.0)
    }
}

impl std::error::Error for InvalidPriority {}

/// One entry of a task's checklist.
///
/// Subtasks are stored inside the task row as a JSON document and
/// re-derived from it on every read; they are never rows of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Subtask label.
    pub title: String,
    /// Whether this entry is checked off.
    #[serde(default)]
    pub is_done: bool,
}

/// A task owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Database id; 0 until first persisted.
    pub id: i64,
    /// Owning account id.
    pub owner_id: i64,
    /// Position in the manual ordering; 0 means never assigned.
    pub order_index: i64,
    /// Task title.
    pub title: String,
    /// Whether the task is finished.
    pub is_done: bool,
    /// Free-form category name.
    pub category: String,
    /// Priority level.
    pub priority: Priority,
    /// Optional calendar due date (no time component).
    pub due_date: Option<NaiveDate>,
    /// Raw comma-separated tag text as typed by the user.
    pub tags_raw: String,
    /// JSON document holding the checklist.
    pub subtasks_json: String,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When any field last changed.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a task for `owner_id` with defaults for everything else.
    ///
    /// Timestamps and the order index are assigned by the store when the
    /// task is first persisted.
    #[must_use]
    pub fn new(owner_id: i64, title: impl Into<String>) -> Self {
        Self {
            id: 0,
            owner_id,
            order_index: 0,
            title: title.into(),
            is_done: false,
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::default(),
            due_date: None,
            tags_raw: String::new(),
            subtasks_json: "[]".to_string(),
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    /// Normalized tags derived from [`Self::tags_raw`].
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        normalize_tags(self.tags_raw.split(','))
    }

    /// Whether the task carries any tags.
    #[must_use]
    pub fn has_tags(&self) -> bool {
        !self.tags().is_empty()
    }

    /// Checklist entries parsed from [`Self::subtasks_json`].
    ///
    /// Unparseable text reads as an empty list; a corrupt document is
    /// recoverable drift, not an error.
    #[must_use]
    pub fn subtasks(&self) -> Vec<Subtask> {
        if self.subtasks_json.trim().is_empty() {
            return Vec::new();
        }
        serde_json::from_str(&self.subtasks_json).unwrap_or_default()
    }

    /// Replace the checklist, re-serializing the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn set_subtasks(&mut self, subtasks: &[Subtask]) -> crate::error::Result<()> {
        self.subtasks_json = serde_json::to_string(subtasks)?;
        Ok(())
    }

    /// Total checklist entries.
    #[must_use]
    pub fn subtask_total(&self) -> usize {
        self.subtasks().len()
    }

    /// Checked-off checklist entries.
    #[must_use]
    pub fn subtask_done(&self) -> usize {
        self.subtasks().iter().filter(|subtask| subtask.is_done).count()
    }

    /// Fraction of the checklist that is done (0 when it is empty).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn subtask_progress(&self) -> f64 {
        let total = self.subtask_total();
        if total == 0 {
            0.0
        } else {
            self.subtask_done() as f64 / total as f64
        }
    }
}

/// Normalize a sequence of raw tag fragments.
///
/// Trims each fragment, drops blanks, prefixes `#` when absent, and
/// de-duplicates case-insensitively keeping the first occurrence.
pub fn normalize_tags<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut tags = Vec::new();
    for part in parts {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let tag = if trimmed.starts_with('#') {
            trimmed.to_string()
        } else {
            format!("#{trimmed}")
        };
        let key = tag.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        tags.push(tag);
    }
    tags
}

/// Parse a free-typed tag filter: fragments split on commas and spaces.
#[must_use]
pub fn parse_tag_list(text: &str) -> Vec<String> {
    normalize_tags(text.split([',', ' ']))
}
