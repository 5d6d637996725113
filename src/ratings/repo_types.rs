use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One user's stars for one recipe. At most one row per (user, recipe).
#[derive(Debug, Clone, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub stars: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Mean and count of all ratings of a recipe; both zero when unrated.
#[derive(Debug, Clone, Copy, PartialEq, Default, FromRow)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}
