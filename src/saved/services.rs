use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::SavedRecipeResponse,
    repo::SavedRecipeRepo,
    repo_types::{SavedRecipe, TopSavedRecipe},
};
use crate::{
    auth::policy::Requester,
    error::{is_foreign_key_violation, is_unique_violation, parse_id, AppError},
    recipes::{dto::RecipeResponse, repo::RecipeRepo},
};

const MOST_SAVED: i64 = 10;

#[derive(Clone)]
pub struct SavedRecipeService {
    saved: Arc<dyn SavedRecipeRepo>,
    recipes: Arc<dyn RecipeRepo>,
}

impl SavedRecipeService {
    pub fn new(saved: Arc<dyn SavedRecipeRepo>, recipes: Arc<dyn RecipeRepo>) -> Self {
        Self { saved, recipes }
    }

    pub async fn save_recipe(
        &self,
        recipe_id: &str,
        user: &Requester,
    ) -> Result<SavedRecipeResponse, AppError> {
        let recipe_id = parse_id(recipe_id)?;
        if self.saved.exists(user.id, recipe_id).await? {
            return Err(AppError::conflict("already saved"));
        }

        let saved = SavedRecipe {
            id: Uuid::new_v4(),
            user_id: user.id,
            recipe_id,
            created_at: OffsetDateTime::now_utc(),
        };
        // the unique index and the recipe reference settle races the pre-check misses
        self.saved.insert(&saved).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("already saved")
            } else if is_foreign_key_violation(&e) {
                AppError::not_found("recipe not found")
            } else {
                AppError::from(e)
            }
        })?;

        info!(recipe_id = %recipe_id, user_id = %user.id, "recipe saved");
        Ok(saved.into())
    }

    pub async fn unsave_recipe(&self, user: &Requester, recipe_id: &str) -> Result<(), AppError> {
        let recipe_id = parse_id(recipe_id)?;
        if self.saved.delete(user.id, recipe_id).await? == 0 {
            return Err(AppError::not_found("saved recipe not found"));
        }
        info!(recipe_id = %recipe_id, user_id = %user.id, "recipe unsaved");
        Ok(())
    }

    /// Recipes bookmarked by the user. Bookmarks whose recipe can no longer be
    /// loaded are skipped.
    pub async fn get_recipes_saved_by_user(
        &self,
        user: &Requester,
    ) -> Result<Vec<RecipeResponse>, AppError> {
        let bookmarks = self.saved.list_by_user(user.id).await?;
        let mut recipes = Vec::with_capacity(bookmarks.len());
        for bookmark in bookmarks {
            match self.recipes.find_by_id(bookmark.recipe_id).await {
                Ok(Some(recipe)) => recipes.push(recipe.into()),
                Ok(None) => {}
                Err(e) => {
                    warn!(recipe_id = %bookmark.recipe_id, error = ?e, "skipping unreadable saved recipe");
                }
            }
        }
        Ok(recipes)
    }

    pub async fn get_saved_count_by_recipe(&self, recipe_id: &str) -> Result<i64, AppError> {
        let recipe_id = parse_id(recipe_id)?;
        Ok(self.saved.count_by_recipe(recipe_id).await?)
    }

    pub async fn get_top10_most_saved(&self) -> Result<Vec<TopSavedRecipe>, AppError> {
        Ok(self.saved.most_saved(MOST_SAVED).await?)
    }
}
