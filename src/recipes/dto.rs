use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Difficulty, Ingredient, Recipe, Step, Visibility};

/// Body of create/update. Enumerated fields arrive as free text and are
/// checked by the service so that an empty value is a validation error, not
/// a decoding error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeRequest {
    pub title: String,
    pub description: String,
    pub visibility: String,
    pub total_time: i32,
    #[serde(alias = "step")]
    pub steps: Vec<Step>,
    #[serde(rename = "dificultyLevel", alias = "difficultyLevel")]
    pub difficulty: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub image: String,
}

/// Search filters; every field is optional and blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeSearch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "dificultyLevel", alias = "difficultyLevel")]
    pub difficulty: Option<String>,
    /// Upper bound in minutes; zero means unset.
    pub total_time: Option<i32>,
    pub tags: Vec<String>,
}

/// Query string of `GET /recipes/search`.
#[derive(Debug, Default, Deserialize)]
pub struct QuickSearchParams {
    pub q: Option<String>,
    pub desc: Option<String>,
    pub difficulty: Option<String>,
    pub time: Option<String>,
    pub tags: Option<String>,
}

impl From<QuickSearchParams> for RecipeSearch {
    fn from(p: QuickSearchParams) -> Self {
        let tags = p
            .tags
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            title: p.q,
            description: p.desc,
            difficulty: p.difficulty,
            total_time: p.time.and_then(|t| t.trim().parse().ok()),
            tags,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub total_time: i32,
    pub steps: Vec<Step>,
    #[serde(rename = "dificultyLevel")]
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub image: String,
    pub average_rating: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Recipe> for RecipeResponse {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            user_name: None,
            title: r.title,
            description: r.description,
            visibility: r.visibility,
            total_time: r.total_time,
            steps: r.steps.0,
            difficulty: r.difficulty,
            tags: r.tags,
            ingredients: r.ingredients.0,
            image: r.image,
            average_rating: r.average_rating,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl RecipeResponse {
    pub fn with_owner_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}
