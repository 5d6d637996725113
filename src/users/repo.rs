use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, google_id, created_at, updated_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, user: &User) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_google_id(&self, google_id: &str) -> anyhow::Result<Option<User>>;
    /// Write name, linked identity and `updated_at`. Returns matched rows.
    async fn update_profile(&self, user: &User) -> anyhow::Result<u64>;
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: OffsetDateTime,
    ) -> anyhow::Result<u64>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<u64>;
}

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("find user by {column}"))?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, google_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.google_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .context("insert user")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>> {
        self.find_one("name", name).await
    }

    async fn find_by_google_id(&self, google_id: &str) -> anyhow::Result<Option<User>> {
        self.find_one("google_id", google_id).await
    }

    async fn update_profile(&self, user: &User) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET name = $2, google_id = $3, updated_at = $4
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.google_id)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .context("update user profile")?;
        Ok(res.rows_affected())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        updated_at: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(updated_at)
            .execute(&self.db)
            .await
            .context("update user password")?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected())
    }
}
