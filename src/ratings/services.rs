use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::RatingResponse,
    repo::RatingRepo,
    repo_types::{Rating, RatingSummary},
};
use crate::{
    auth::policy::Requester,
    error::{is_foreign_key_violation, parse_id, AppError},
    recipes::repo::RecipeRepo,
};

pub const MIN_STARS: i32 = 1;
pub const MAX_STARS: i32 = 5;

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepo>,
    recipes: Arc<dyn RecipeRepo>,
}

impl RatingService {
    pub fn new(ratings: Arc<dyn RatingRepo>, recipes: Arc<dyn RecipeRepo>) -> Self {
        Self { ratings, recipes }
    }

    /// Record the caller's stars for a recipe (replacing an earlier rating)
    /// and refresh the recipe's stored average.
    pub async fn rate_recipe(
        &self,
        stars: i32,
        recipe_id: &str,
        user: &Requester,
    ) -> Result<RatingResponse, AppError> {
        if !(MIN_STARS..=MAX_STARS).contains(&stars) {
            return Err(AppError::validation(format!(
                "stars must be between {MIN_STARS} and {MAX_STARS}"
            )));
        }
        let recipe_id = parse_id(recipe_id)?;
        if self.recipes.find_by_id(recipe_id).await?.is_none() {
            return Err(AppError::not_found("recipe not found"));
        }

        let now = OffsetDateTime::now_utc();
        let candidate = Rating {
            id: Uuid::new_v4(),
            user_id: user.id,
            recipe_id,
            stars,
            created_at: now,
            updated_at: now,
        };
        let stored = self.ratings.upsert(&candidate).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("recipe not found")
            } else {
                AppError::from(e)
            }
        })?;
        info!(recipe_id = %recipe_id, user_id = %user.id, stars, "recipe rated");

        // Not atomic with the upsert: two concurrent raters may each write an
        // average that misses the other's stars until the next rating lands.
        let summary = self.ratings.summary(recipe_id).await?;
        self.recipes
            .set_average_rating(recipe_id, summary.average)
            .await?;
        debug!(recipe_id = %recipe_id, average = summary.average, count = summary.count, "average rating refreshed");

        Ok(stored.into())
    }

    pub async fn get_rating_by_recipe(&self, recipe_id: &str) -> Result<RatingSummary, AppError> {
        let recipe_id = parse_id(recipe_id)?;
        Ok(self.ratings.summary(recipe_id).await?)
    }

    /// The caller's own rating of a recipe.
    pub async fn get_user_rating(
        &self,
        recipe_id: &str,
        user: &Requester,
    ) -> Result<RatingResponse, AppError> {
        let recipe_id = parse_id(recipe_id)?;
        self.ratings
            .find_by_user_and_recipe(user.id, recipe_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("rating not found"))
    }
}
