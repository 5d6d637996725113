use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Rating, RatingSummary};

#[derive(Debug, Deserialize)]
pub struct RateRecipeRequest {
    pub stars: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub stars: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Rating> for RatingResponse {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            recipe_id: r.recipe_id,
            stars: r.stars,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingSummaryResponse {
    pub average: f64,
    pub count: i64,
}

impl From<RatingSummary> for RatingSummaryResponse {
    fn from(s: RatingSummary) -> Self {
        Self {
            average: s.average,
            count: s.count,
        }
    }
}
