//! Category registry: the user's category list plus per-category icon
//! and color assignments.
//!
//! Everything is stored as JSON documents inside the preferences file.
//! Reads are lenient throughout: a missing, empty, or unparseable
//! document falls back to the built-in defaults instead of failing.

use crate::error::Result;
use crate::prefs::Preferences;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The built-in category set, in display order.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["General", "Work", "Personal", "Shopping", "Health"];

/// Icon for categories with no assignment of their own.
pub const DEFAULT_ICON: &str = "category_general.svg";

/// Color for categories with no assignment of their own.
pub const DEFAULT_COLOR: &str = "#5C6BC0";

/// Built-in icon assignments, keyed by lowercased category name.
static DEFAULT_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("general", "category_general.svg"),
        ("work", "category_work.svg"),
        ("personal", "category_personal.svg"),
        ("shopping", "category_shopping.svg"),
        ("health", "category_health.svg"),
    ])
});

/// Built-in color assignments, keyed by lowercased category name.
static DEFAULT_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("general", "#5C6BC0"),
        ("work", "#3949AB"),
        ("personal", "#8E24AA"),
        ("shopping", "#00897B"),
        ("health", "#43A047"),
    ])
});

/// Category list and style assignments over the preferences file.
#[derive(Debug, Clone)]
pub struct CategoryService {
    prefs: Preferences,
}

impl CategoryService {
    /// Create the service over the given preferences file.
    #[must_use]
    pub const fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    /// The stored category list, or the built-in set.
    ///
    /// De-duplicated case-insensitively with the first occurrence kept;
    /// blank entries are dropped.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let stored = self.prefs.get().custom_categories;
        let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
            return default_categories();
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(parsed) if !parsed.is_empty() => dedupe(parsed),
            _ => default_categories(),
        }
    }

    /// Append `name` unless already present (case-insensitive) and
    /// persist the full list. Returns the updated list either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn add_category(&self, name: &str) -> Result<Vec<String>> {
        let mut categories = self.categories();
        if categories.iter().any(|existing| eq_fold(existing, name)) {
            return Ok(categories);
        }

        categories.push(name.to_string());
        self.save_categories(&categories)?;
        Ok(categories)
    }

    /// Persist the full category list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn save_categories(&self, categories: &[String]) -> Result<()> {
        let payload = serde_json::to_string(categories)?;
        self.prefs.update(|data| data.custom_categories = Some(payload))
    }

    /// The stored icon map, or the built-in assignments.
    #[must_use]
    pub fn icons(&self) -> HashMap<String, String> {
        read_style_map(self.prefs.get().category_icons.as_deref(), &DEFAULT_ICONS)
    }

    /// Assign an icon to a category and persist the whole map.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be persisted.
    pub fn set_icon(&self, category: &str, icon_key: &str) -> Result<()> {
        let mut icons = self.icons();
        icons.insert(category.to_string(), icon_key.to_string());
        let payload = serde_json::to_string(&icons)?;
        self.prefs.update(|data| data.category_icons = Some(payload))
    }

    /// Icon for `category`: its stored assignment, the built-in default
    /// for that name (case-insensitive), or [`DEFAULT_ICON`].
    #[must_use]
    pub fn icon_for(&self, category: &str) -> String {
        self.icons()
            .get(category)
            .cloned()
            .unwrap_or_else(|| default_icon(category).to_string())
    }

    /// The stored color map, or the built-in assignments.
    #[must_use]
    pub fn colors(&self) -> HashMap<String, String> {
        read_style_map(self.prefs.get().category_colors.as_deref(), &DEFAULT_COLORS)
    }

    /// Assign a color to a category and persist the whole map.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be persisted.
    pub fn set_color(&self, category: &str, color: &str) -> Result<()> {
        let mut colors = self.colors();
        colors.insert(category.to_string(), color.to_string());
        let payload = serde_json::to_string(&colors)?;
        self.prefs.update(|data| data.category_colors = Some(payload))
    }

    /// Color for `category`: its stored assignment, the built-in
    /// default for that name (case-insensitive), or [`DEFAULT_COLOR`].
    #[must_use]
    pub fn color_for(&self, category: &str) -> String {
        self.colors()
            .get(category)
            .cloned()
            .unwrap_or_else(|| default_color(category).to_string())
    }
}

/// The built-in category set as owned strings.
fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

/// Built-in icon for a category name, case-insensitive.
fn default_icon(category: &str) -> &'static str {
    DEFAULT_ICONS.get(category.to_lowercase().as_str()).copied().unwrap_or(DEFAULT_ICON)
}

/// Built-in color for a category name, case-insensitive.
fn default_color(category: &str) -> &'static str {
    DEFAULT_COLORS.get(category.to_lowercase().as_str()).copied().unwrap_or(DEFAULT_COLOR)
}

/// Parse a stored style map, falling back to the defaults on anything
/// suspect.
fn read_style_map(
    stored: Option<&str>,
    defaults: &HashMap<&'static str, &'static str>,
) -> HashMap<String, String> {
    let fallback = || {
        defaults
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    };

    let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
        return fallback();
    };

    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(parsed) if !parsed.is_empty() => parsed,
        _ => fallback(),
    }
}

/// Case-insensitive string equality.
fn eq_fold(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Drop blanks and case-insensitive duplicates, keeping first
/// occurrences in order.
fn dedupe(categories: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for category in categories {
        let trimmed = category.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(trimmed.to_string());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (TempDir, CategoryService) {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::new(dir.path().join("preferences.yaml"));
        (dir, CategoryService::new(prefs))
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let (_dir, service) = create_test_service();
        assert_eq!(service.categories(), default_categories());
    }

    #[test]
    fn test_defaults_when_stored_data_is_malformed() {
        let (_dir, service) = create_test_service();
        service
            .prefs
            .update(|data| data.custom_categories = Some("not json [".to_string()))
            .unwrap();
        assert_eq!(service.categories(), default_categories());
    }

    #[test]
    fn test_defaults_when_stored_list_is_empty() {
        let (_dir, service) = create_test_service();
        service.prefs.update(|data| data.custom_categories = Some("[]".to_string())).unwrap();
        assert_eq!(service.categories(), default_categories());
    }

    #[test]
    fn test_stored_list_is_deduplicated_case_insensitively() {
        let (_dir, service) = create_test_service();
        service
            .save_categories(&[
                "Work".to_string(),
                "home".to_string(),
                "WORK".to_string(),
                "  ".to_string(),
                "Home".to_string(),
            ])
            .unwrap();

        assert_eq!(service.categories(), vec!["Work", "home"]);
    }

    #[test]
    fn test_add_category_appends_and_persists() {
        let (_dir, service) = create_test_service();

        let updated = service.add_category("Projects").unwrap();
        assert_eq!(updated.last().map(String::as_str), Some("Projects"));

        // Re-read from storage.
        assert!(service.categories().contains(&"Projects".to_string()));
    }

    #[test]
    fn test_add_category_ignores_case_insensitive_duplicate() {
        let (_dir, service) = create_test_service();
        let before = service.add_category("Projects").unwrap();
        let after = service.add_category("PROJECTS").unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_builtin_icons_and_colors() {
        let (_dir, service) = create_test_service();

        assert_eq!(service.icon_for("Work"), "category_work.svg");
        assert_eq!(service.icon_for("health"), "category_health.svg");
        assert_eq!(service.color_for("Personal"), "#8E24AA");
        assert_eq!(service.color_for("SHOPPING"), "#00897B");
    }

    #[test]
    fn test_unknown_category_falls_back_to_generic_default() {
        let (_dir, service) = create_test_service();
        assert_eq!(service.icon_for("Gardening"), DEFAULT_ICON);
        assert_eq!(service.color_for("Gardening"), DEFAULT_COLOR);
    }

    #[test]
    fn test_set_icon_and_color_persist() {
        let (_dir, service) = create_test_service();

        service.set_icon("Gardening", "category_plant.svg").unwrap();
        service.set_color("Gardening", "#2E7D32").unwrap();

        assert_eq!(service.icon_for("Gardening"), "category_plant.svg");
        assert_eq!(service.color_for("Gardening"), "#2E7D32");

        // Built-ins keep their defaults alongside the new entry.
        assert_eq!(service.icon_for("Work"), "category_work.svg");
    }

    #[test]
    fn test_malformed_style_map_falls_back_to_defaults() {
        let (_dir, service) = create_test_service();
        service
            .prefs
            .update(|data| data.category_colors = Some("{broken".to_string()))
            .unwrap();

        assert_eq!(service.color_for("Work"), "#3949AB");
        assert_eq!(service.colors().len(), DEFAULT_COLORS.len());
    }
}
