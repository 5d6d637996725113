use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A user's bookmark of a recipe. At most one per (user, recipe).
#[derive(Debug, Clone, FromRow)]
pub struct SavedRecipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TopSavedRecipe {
    pub recipe_id: Uuid,
    pub count: i64,
}
