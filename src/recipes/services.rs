use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{RecipeRequest, RecipeResponse, RecipeSearch},
    repo::RecipeRepo,
    repo_types::{Difficulty, Recipe, RecipeContent, RecipeFilter, Visibility},
};
use crate::{
    auth::policy::{can_modify_recipe, Requester},
    error::{parse_id, AppError},
    users::repo::UserRepo,
};

const TOP_RECIPES: i64 = 5;
const UNKNOWN_OWNER: &str = "Unknown";

#[derive(Clone)]
pub struct RecipeService {
    recipes: Arc<dyn RecipeRepo>,
    users: Arc<dyn UserRepo>,
}

/// Check a create/update body and turn it into typed content.
fn validate(req: RecipeRequest) -> Result<RecipeContent, AppError> {
    fn required(value: &str, field: &str) -> Result<String, AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::validation(format!("{field} is required")));
        }
        Ok(value.to_string())
    }

    let title = required(&req.title, "title")?;
    let description = required(&req.description, "description")?;
    let visibility = required(&req.visibility, "visibility")?
        .parse::<Visibility>()
        .map_err(|_| AppError::validation("visibility must be public or private"))?;
    let difficulty = required(&req.difficulty, "difficulty level")?
        .parse::<Difficulty>()
        .map_err(|_| AppError::validation("difficulty level must be easy, medium or hard"))?;

    if req.total_time <= 0 {
        return Err(AppError::validation("total time must be greater than zero"));
    }
    if req.steps.is_empty() {
        return Err(AppError::validation("at least one step is required"));
    }
    if req.ingredients.is_empty() {
        return Err(AppError::validation("at least one ingredient is required"));
    }

    let tags = req
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(RecipeContent {
        title,
        description,
        visibility,
        total_time: req.total_time,
        steps: req.steps,
        difficulty,
        tags,
        ingredients: req.ingredients,
        image: req.image.trim().to_string(),
    })
}

impl RecipeService {
    pub fn new(recipes: Arc<dyn RecipeRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { recipes, users }
    }

    pub async fn create_recipe(
        &self,
        req: RecipeRequest,
        owner: &Requester,
    ) -> Result<RecipeResponse, AppError> {
        let content = validate(req)?;
        let user = self
            .users
            .find_by_id(owner.id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;

        let recipe = Recipe::new(Uuid::new_v4(), user.id, content, OffsetDateTime::now_utc());
        self.recipes.insert(&recipe).await?;

        info!(recipe_id = %recipe.id, user_id = %user.id, "recipe created");
        Ok(RecipeResponse::from(recipe).with_owner_name(user.name))
    }

    pub async fn update_recipe(
        &self,
        req: RecipeRequest,
        id: &str,
        requester: &Requester,
    ) -> Result<RecipeResponse, AppError> {
        let content = validate(req)?;
        let mut recipe = self.load(parse_id(id)?).await?;
        if !can_modify_recipe(requester, recipe.user_id) {
            warn!(recipe_id = %recipe.id, user_id = %requester.id, "recipe update denied");
            return Err(AppError::forbidden("unauthorized to modify this recipe"));
        }

        recipe.apply(content, OffsetDateTime::now_utc());
        if self.recipes.update_content(&recipe).await? == 0 {
            return Err(AppError::not_found("recipe not found"));
        }

        info!(recipe_id = %recipe.id, user_id = %requester.id, "recipe updated");
        self.with_owner_name(recipe).await
    }

    pub async fn delete_recipe(&self, id: &str, requester: &Requester) -> Result<(), AppError> {
        let recipe = self.load(parse_id(id)?).await?;
        if !can_modify_recipe(requester, recipe.user_id) {
            warn!(recipe_id = %recipe.id, user_id = %requester.id, "recipe delete denied");
            return Err(AppError::forbidden("unauthorized to delete this recipe"));
        }
        if self.recipes.delete(recipe.id).await? == 0 {
            return Err(AppError::not_found("recipe not found"));
        }
        info!(recipe_id = %recipe.id, user_id = %requester.id, "recipe deleted");
        Ok(())
    }

    /// Public recipes matching the search, newest first.
    pub async fn get_recipes(&self, search: &RecipeSearch) -> Result<Vec<RecipeResponse>, AppError> {
        let filter = RecipeFilter::from(search);
        let rows = self.recipes.search(&filter).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_recipe_by_id(&self, id: &str) -> Result<RecipeResponse, AppError> {
        let recipe = self.load(parse_id(id)?).await?;
        self.with_owner_name(recipe).await
    }

    pub async fn get_recipes_by_user(&self, user_id: &str) -> Result<Vec<RecipeResponse>, AppError> {
        let user_id = parse_id(user_id)?;
        let rows = self.recipes.list_by_user(user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_all(&self) -> Result<Vec<RecipeResponse>, AppError> {
        let rows = self.recipes.list_all().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_top_recipes(&self) -> Result<Vec<RecipeResponse>, AppError> {
        let rows = self.recipes.top_rated(TOP_RECIPES).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn load(&self, id: Uuid) -> Result<Recipe, AppError> {
        self.recipes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("recipe not found"))
    }

    // Owner lookup is best effort: a failed or empty lookup degrades to a placeholder.
    async fn with_owner_name(&self, recipe: Recipe) -> Result<RecipeResponse, AppError> {
        let name = match self.users.find_by_id(recipe.user_id).await {
            Ok(Some(user)) => user.name,
            Ok(None) => UNKNOWN_OWNER.to_string(),
            Err(e) => {
                warn!(recipe_id = %recipe.id, error = ?e, "owner lookup failed");
                UNKNOWN_OWNER.to_string()
            }
        };
        Ok(RecipeResponse::from(recipe).with_owner_name(name))
    }
}
