//! Account registration, login, and display-name changes.
//!
//! Passwords are never stored. Each account keeps a random 16-byte
//! salt and the SHA-256 digest of `password:salt`, both base64-encoded;
//! login recomputes the digest with the stored salt and compares. An
//! unknown email and a wrong password fail with the same error so the
//! result does not reveal whether an account exists.

use crate::error::{Error, Result};
use crate::logging;
use crate::session::SessionContext;
use crate::storage::{decode_instant, encode_instant, Database};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Columns selected for every account query, in [`parse_account`] order.
const ACCOUNT_COLUMNS: &str = "Id, Email, Name, PasswordHash, PasswordSalt, CreatedAt";

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Database id, assigned on creation.
    pub id: i64,
    /// Normalized (trimmed, lowercased) email; unique per account.
    pub email: String,
    /// Display name shown on the profile page.
    pub name: String,
    /// Base64 SHA-256 digest of the password and salt.
    pub password_hash: String,
    /// Base64-encoded random salt.
    pub password_salt: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Registration and login over the account table.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    session: SessionContext,
}

impl AuthService {
    /// Create the service over an opened database and a session context.
    #[must_use]
    pub const fn new(db: Database, session: SessionContext) -> Self {
        Self { db, session }
    }

    /// The session context this service was built with.
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Register a new account.
    ///
    /// The email is trimmed and lowercased before the uniqueness check
    /// and before storage; the display name is trimmed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when the email or password is blank,
    /// [`Error::EmailTaken`] when the normalized email is already
    /// registered, or a storage error.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        let normalized = normalize_email(email);
        if normalized.is_empty() {
            return Err(Error::InvalidInput("email"));
        }
        if password.trim().is_empty() {
            return Err(Error::InvalidInput("password"));
        }

        let conn = self.db.connect()?;
        let existing: Option<i64> = conn
            .query_row("SELECT Id FROM Account WHERE Email = ?1", params![normalized], |row| {
                row.get(0)
            })
            .optional()?;
        if existing.is_some() {
            return Err(Error::EmailTaken);
        }

        let salt = create_salt();
        let hash = hash_password(password, &salt);
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO Account (Email, Name, PasswordHash, PasswordSalt, CreatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![normalized, name.trim(), hash, salt, encode_instant(created_at)],
        )
        .map_err(Error::StorageWriteFailed)?;

        let account = Account {
            id: conn.last_insert_rowid(),
            email: normalized,
            name: name.trim().to_string(),
            password_hash: hash,
            password_salt: salt,
            created_at,
        };

        logging::log_data_event(
            self.session.preferences(),
            "account_registered",
            &serde_json::json!({ "id": account.id }),
        );

        Ok(account)
    }

    /// Log in with an email and password.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredentials`] for an unknown email or a wrong
    /// password, or a storage error.
    pub fn login(&self, email: &str, password: &str) -> Result<Account> {
        let normalized = normalize_email(email);
        let Some(account) = self.find_by_email(&normalized)? else {
            return Err(Error::InvalidCredentials);
        };

        let hash = hash_password(password, &account.password_salt);
        if hash != account.password_hash {
            return Err(Error::InvalidCredentials);
        }

        logging::log_data_event(
            self.session.preferences(),
            "login",
            &serde_json::json!({ "id": account.id }),
        );

        Ok(account)
    }

    /// Resolve the active session to its account row.
    ///
    /// # Errors
    ///
    /// Returns an error if the account lookup fails.
    pub fn current_user(&self) -> Result<Option<Account>> {
        match self.session.current_user_id() {
            Some(id) => self.find_by_id(id),
            None => Ok(None),
        }
    }

    /// Update the display name of the signed-in account.
    ///
    /// Returns `false` without touching storage when no session is
    /// active or the trimmed name is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_display_name(&self, name: &str) -> Result<bool> {
        let Some(id) = self.session.current_user_id() else {
            return Ok(false);
        };
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let conn = self.db.connect()?;
        let rows = conn
            .execute("UPDATE Account SET Name = ?1 WHERE Id = ?2", params![trimmed, id])
            .map_err(Error::StorageWriteFailed)?;
        Ok(rows > 0)
    }

    /// Look up an account by its normalized email.
    fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.db.connect()?;
        let account = conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM Account WHERE Email = ?1"),
                params![email],
                parse_account,
            )
            .optional()?;
        Ok(account)
    }

    /// Look up an account by id.
    fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.db.connect()?;
        let account = conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM Account WHERE Id = ?1"),
                params![id],
                parse_account,
            )
            .optional()?;
        Ok(account)
    }
}

/// Parse an account from a row (column order fixed by `ACCOUNT_COLUMNS`).
fn parse_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
    let created_at: Option<String> = row.get(5)?;
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        password_hash: row.get(3)?,
        password_salt: row.get(4)?,
        created_at: decode_instant(created_at.as_deref()),
    })
}

/// Trim and lowercase an email for comparison and storage.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate a random 16-byte salt, base64-encoded.
fn create_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64_STANDARD.encode(bytes)
}

/// Digest `password:salt` with SHA-256, base64-encoded.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(b":");
    hasher.update(salt.as_bytes());
    BASE64_STANDARD.encode(hasher.finalize())
}
