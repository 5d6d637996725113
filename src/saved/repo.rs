use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{SavedRecipe, TopSavedRecipe};

#[async_trait]
pub trait SavedRecipeRepo: Send + Sync {
    async fn insert(&self, saved: &SavedRecipe) -> anyhow::Result<()>;
    async fn exists(&self, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool>;
    async fn delete(&self, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<u64>;
    /// Newest bookmark first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedRecipe>>;
    async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64>;
    /// Recipes with the most bookmarks, highest count first.
    async fn most_saved(&self, limit: i64) -> anyhow::Result<Vec<TopSavedRecipe>>;
}

pub struct PgSavedRecipeRepo {
    db: PgPool,
}

impl PgSavedRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SavedRecipeRepo for PgSavedRecipeRepo {
    async fn insert(&self, saved: &SavedRecipe) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO saved_recipes (id, user_id, recipe_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(saved.id)
        .bind(saved.user_id)
        .bind(saved.recipe_id)
        .bind(saved.created_at)
        .execute(&self.db)
        .await
        .context("insert saved recipe")?;
        Ok(())
    }

    async fn exists(&self, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<bool> {
        let (found,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&self.db)
        .await
        .context("check saved recipe")?;
        Ok(found)
    }

    async fn delete(&self, user_id: Uuid, recipe_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.db)
            .await
            .context("delete saved recipe")?;
        Ok(res.rows_affected())
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<SavedRecipe>> {
        let rows = sqlx::query_as::<_, SavedRecipe>(
            r#"
            SELECT id, user_id, recipe_id, created_at
              FROM saved_recipes
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list saved recipes")?;
        Ok(rows)
    }

    async fn count_by_recipe(&self, recipe_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM saved_recipes WHERE recipe_id = $1")
                .bind(recipe_id)
                .fetch_one(&self.db)
                .await
                .context("count saves")?;
        Ok(count)
    }

    async fn most_saved(&self, limit: i64) -> anyhow::Result<Vec<TopSavedRecipe>> {
        let rows = sqlx::query_as::<_, TopSavedRecipe>(
            r#"
            SELECT recipe_id, COUNT(*) AS count
              FROM saved_recipes
             GROUP BY recipe_id
             ORDER BY count DESC, recipe_id
             LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list most saved recipes")?;
        Ok(rows)
    }
}
