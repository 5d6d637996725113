use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "recipe_visibility", rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "recipe_difficulty", rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    #[serde(alias = "descripcion")]
    pub description: String,
    /// Minutes for this step.
    #[serde(default)]
    pub time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
}

/// Validated, client-settable part of a recipe.
#[derive(Debug, Clone)]
pub struct RecipeContent {
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub total_time: i32,
    pub steps: Vec<Step>,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub ingredients: Vec<Ingredient>,
    pub image: String,
}

/// Recipe record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid, // owner
    pub title: String,
    pub description: String,
    pub visibility: Visibility,
    pub total_time: i32, // minutes
    pub steps: Json<Vec<Step>>,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub ingredients: Json<Vec<Ingredient>>,
    pub image: String,
    pub average_rating: f64, // mean of ratings.stars, written only by the rating service
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Recipe {
    pub fn new(id: Uuid, owner: Uuid, content: RecipeContent, now: OffsetDateTime) -> Self {
        Self {
            id,
            user_id: owner,
            title: content.title,
            description: content.description,
            visibility: content.visibility,
            total_time: content.total_time,
            steps: Json(content.steps),
            difficulty: content.difficulty,
            tags: content.tags,
            ingredients: Json(content.ingredients),
            image: content.image,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the client-settable fields; owner, creation time and the
    /// rating aggregate are left alone.
    pub fn apply(&mut self, content: RecipeContent, now: OffsetDateTime) {
        self.title = content.title;
        self.description = content.description;
        self.visibility = content.visibility;
        self.total_time = content.total_time;
        self.steps = Json(content.steps);
        self.difficulty = content.difficulty;
        self.tags = content.tags;
        self.ingredients = Json(content.ingredients);
        self.image = content.image;
        self.updated_at = now;
    }
}

/// Normalized search criteria handed to the repository. `None`/empty means
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub max_total_time: Option<i32>,
    pub tags: Vec<String>,
}

impl From<&super::dto::RecipeSearch> for RecipeFilter {
    fn from(s: &super::dto::RecipeSearch) -> Self {
        fn text(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        }
        Self {
            title: text(&s.title),
            description: text(&s.description),
            difficulty: text(&s.difficulty),
            // zero is indistinguishable from unset
            max_total_time: s.total_time.filter(|t| *t != 0),
            tags: s
                .tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}
