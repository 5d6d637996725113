use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeFilter};

const RECIPE_COLUMNS: &str = "id, user_id, title, description, visibility, total_time, steps, \
     difficulty, tags, ingredients, image, average_rating, created_at, updated_at";

#[async_trait]
pub trait RecipeRepo: Send + Sync {
    async fn insert(&self, recipe: &Recipe) -> anyhow::Result<()>;
    /// Write the client-settable fields and `updated_at`. Returns matched rows.
    async fn update_content(&self, recipe: &Recipe) -> anyhow::Result<u64>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<u64>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>>;
    /// Public recipes matching every clause of the filter, newest first.
    async fn search(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>>;
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Recipe>>;
    /// Every recipe, highest average rating first.
    async fn list_all(&self) -> anyhow::Result<Vec<Recipe>>;
    async fn top_rated(&self, limit: i64) -> anyhow::Result<Vec<Recipe>>;
    async fn set_average_rating(&self, id: Uuid, average: f64) -> anyhow::Result<u64>;
}

pub struct PgRecipeRepo {
    db: PgPool,
}

impl PgRecipeRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// `%needle%` with LIKE metacharacters escaped, so user input matches literally.
fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

pub(crate) fn search_query(filter: &RecipeFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE visibility = 'public'"
    ));

    if let Some(title) = &filter.title {
        qb.push(" AND title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(description) = &filter.description {
        qb.push(" AND description ILIKE ")
            .push_bind(contains_pattern(description));
    }
    if let Some(difficulty) = &filter.difficulty {
        qb.push(" AND difficulty::text ILIKE ")
            .push_bind(contains_pattern(difficulty));
    }
    if let Some(max) = filter.max_total_time {
        qb.push(" AND total_time <= ").push_bind(max);
    }
    // every requested tag must match at least one tag of the recipe
    for tag in &filter.tags {
        qb.push(" AND EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ")
            .push_bind(contains_pattern(tag))
            .push(")");
    }

    qb.push(" ORDER BY created_at DESC");
    qb
}

#[async_trait]
impl RecipeRepo for PgRecipeRepo {
    async fn insert(&self, recipe: &Recipe) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, user_id, title, description, visibility, total_time, steps,
                                 difficulty, tags, ingredients, image, average_rating,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.user_id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.visibility)
        .bind(recipe.total_time)
        .bind(&recipe.steps)
        .bind(recipe.difficulty)
        .bind(&recipe.tags)
        .bind(&recipe.ingredients)
        .bind(&recipe.image)
        .bind(recipe.average_rating)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.db)
        .await
        .context("insert recipe")?;
        Ok(())
    }

    async fn update_content(&self, recipe: &Recipe) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE recipes
               SET title = $2, description = $3, visibility = $4, total_time = $5,
                   steps = $6, difficulty = $7, tags = $8, ingredients = $9,
                   image = $10, updated_at = $11
             WHERE id = $1
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.visibility)
        .bind(recipe.total_time)
        .bind(&recipe.steps)
        .bind(recipe.difficulty)
        .bind(&recipe.tags)
        .bind(&recipe.ingredients)
        .bind(&recipe.image)
        .bind(recipe.updated_at)
        .execute(&self.db)
        .await
        .context("update recipe")?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(res.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find recipe by id")?;
        Ok(recipe)
    }

    async fn search(&self, filter: &RecipeFilter) -> anyhow::Result<Vec<Recipe>> {
        let rows = search_query(filter)
            .build_query_as::<Recipe>()
            .fetch_all(&self.db)
            .await
            .context("search recipes")?;
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list recipes by user")?;
        Ok(rows)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY average_rating DESC, created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list recipes")?;
        Ok(rows)
    }

    async fn top_rated(&self, limit: i64) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes \
             ORDER BY average_rating DESC, created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list top rated recipes")?;
        Ok(rows)
    }

    async fn set_average_rating(&self, id: Uuid, average: f64) -> anyhow::Result<u64> {
        let res = sqlx::query("UPDATE recipes SET average_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(average)
            .execute(&self.db)
            .await
            .context("write recipe average rating")?;
        Ok(res.rows_affected())
    }
}
