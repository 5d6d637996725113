use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role. Admins are promoted directly in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,                  // unique display name
    pub email: String,                 // unique, lowercased
    pub password_hash: Option<String>, // None for federated-only accounts
    pub role: Role,
    pub google_id: Option<String>,     // linked federated identity
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
