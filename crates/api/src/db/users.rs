//! User repository for database operations.

use sqlx::PgPool;

use brightkit_core::{Role, UserId};

use super::RepositoryError;
use crate::models::{User, UserPublic};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     role, phone_number, address, created_at, updated_at";

const PUBLIC_COLUMNS: &str =
    "id, username, email, first_name, last_name, role, phone_number, address";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get the client-facing shape of a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn public_by_id(&self, id: UserId) -> Result<UserPublic, RepositoryError> {
        sqlx::query_as::<_, UserPublic>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Create a new user. New accounts always start as customers; role
    /// escalation is a manual database operation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        address: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, role, phone_number, address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(Role::Customer)
        .bind(phone_number)
        .bind(address)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(user)
    }
}
