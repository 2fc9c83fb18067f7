//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brightkit_core::{Role, UserId};

/// Session storage keys.
pub mod session_keys {
    /// Key under which the logged-in user is stored in the session.
    pub const CURRENT_USER: &str = "current_user";
}

/// A full user row, including the password hash.
///
/// Never serialized to clients; use [`UserPublic`] for responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing user representation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserPublic {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: String,
    pub address: String,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
        }
    }
}

/// The authenticated user as stored in the session cookie store.
///
/// Deliberately small: id and role are all the permission checks need, the
/// username is kept for log context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}
