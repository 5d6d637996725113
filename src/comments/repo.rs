use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Comment;

const COMMENT_COLUMNS: &str = "id, user_id, user_name, recipe_id, text, created_at";

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: &Comment) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Newest first.
    async fn list_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<u64>;
}

pub struct PgCommentRepo {
    db: PgPool,
}

impl PgCommentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepo for PgCommentRepo {
    async fn insert(&self, comment: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, user_id, user_name, recipe_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(comment.id)
        .bind(comment.user_id)
        .bind(&comment.user_name)
        .bind(comment.recipe_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.db)
        .await
        .context("insert comment")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find comment by id")?;
        Ok(row)
    }

    async fn list_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE recipe_id = $1 ORDER BY created_at DESC"
        ))
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await
        .context("list comments by recipe")?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected())
    }
}
