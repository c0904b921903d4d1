//! Session context: which account is active and how the app is themed.
//!
//! Modeled as an explicitly-injected object over the preferences file
//! rather than ambient global state, so every service that needs it can
//! be built against a temporary directory in tests. The active account
//! is set on successful login or registration, read at startup to
//! decide where to navigate, and cleared on sign-out.

use crate::error::Result;
use crate::prefs::Preferences;

/// Theme used when none has been chosen.
pub const DEFAULT_THEME: &str = "system";

/// Process-wide session state, persisted in the preferences file.
#[derive(Debug, Clone)]
pub struct SessionContext {
    prefs: Preferences,
}

impl SessionContext {
    /// Create a session context over the given preferences file.
    #[must_use]
    pub const fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    /// The preferences file backing this session.
    #[must_use]
    pub const fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Id of the signed-in account, if any.
    #[must_use]
    pub fn current_user_id(&self) -> Option<i64> {
        self.prefs.get().current_user_id
    }

    /// Record `user_id` as the active account.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences file cannot be written.
    pub fn set_current_user(&self, user_id: i64) -> Result<()> {
        self.prefs.update(|data| data.current_user_id = Some(user_id))
    }

    /// Clear the active account.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences file cannot be written.
    pub fn sign_out(&self) -> Result<()> {
        self.prefs.update(|data| data.current_user_id = None)
    }

    /// The stored theme choice, or [`DEFAULT_THEME`].
    #[must_use]
    pub fn theme(&self) -> String {
        self.prefs.get().theme.unwrap_or_else(|| DEFAULT_THEME.to_string())
    }

    /// Persist a theme choice (`"system"`, `"light"`, or `"dark"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences file cannot be written.
    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.prefs.update(|data| data.theme = Some(theme.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_session() -> (TempDir, SessionContext) {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::new(dir.path().join("preferences.yaml"));
        (dir, SessionContext::new(prefs))
    }

    #[test]
    fn test_no_session_by_default() {
        let (_dir, session) = create_test_session();
        assert_eq!(session.current_user_id(), None);
    }

    #[test]
    fn test_set_and_clear_current_user() {
        let (_dir, session) = create_test_session();

        session.set_current_user(42).unwrap();
        assert_eq!(session.current_user_id(), Some(42));

        session.sign_out().unwrap();
        assert_eq!(session.current_user_id(), None);
    }

    #[test]
    fn test_session_survives_a_new_handle() {
        let (dir, session) = create_test_session();
        session.set_current_user(9).unwrap();

        let reopened =
            SessionContext::new(Preferences::new(dir.path().join("preferences.yaml")));
        assert_eq!(reopened.current_user_id(), Some(9));
    }

    #[test]
    fn test_theme_defaults_to_system() {
        let (_dir, session) = create_test_session();
        assert_eq!(session.theme(), DEFAULT_THEME);

        session.set_theme("dark").unwrap();
        assert_eq!(session.theme(), "dark");
    }

    #[test]
    fn test_sign_out_keeps_theme() {
        let (_dir, session) = create_test_session();
        session.set_theme("light").unwrap();
        session.set_current_user(1).unwrap();

        session.sign_out().unwrap();
        assert_eq!(session.theme(), "light");
    }
}
