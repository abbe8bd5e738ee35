//! # User Repository
//!
//! Back-office accounts. Passwords arrive already hashed; this module never
//! sees plaintext.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use shopdesk_core::{NewUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Errors
    /// * `Conflict("Email already registered")` - the email is taken,
    ///   whatever the role of the existing account
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        debug!(email = %user.email, role = ?user.role, "Creating user");

        if self.get_by_email(&user.email).await?.is_some() {
            return Err(DbError::conflict("Email already registered"));
        }

        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.name.trim())
        .bind(user.email.trim())
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::conflict("Email already registered"),
            other => other,
        })?;

        info!(id = created.id, "User created");
        Ok(created)
    }

    /// Looks a user up by email (the token subject).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
