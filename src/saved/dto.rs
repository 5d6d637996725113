use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{SavedRecipe, TopSavedRecipe};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecipeRequest {
    pub recipe_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<SavedRecipe> for SavedRecipeResponse {
    fn from(s: SavedRecipe) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            recipe_id: s.recipe_id,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCountResponse {
    pub recipe_id: Uuid,
    pub count: i64,
}

impl From<TopSavedRecipe> for SaveCountResponse {
    fn from(t: TopSavedRecipe) -> Self {
        Self {
            recipe_id: t.recipe_id,
            count: t.count,
        }
    }
}
