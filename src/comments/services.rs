use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CommentRequest, CommentResponse},
    repo::CommentRepo,
    repo_types::Comment,
};
use crate::{
    auth::policy::{can_delete_comment, Requester},
    error::{is_foreign_key_violation, parse_id, AppError},
    recipes::repo::RecipeRepo,
    users::repo::UserRepo,
};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepo>,
    recipes: Arc<dyn RecipeRepo>,
    users: Arc<dyn UserRepo>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepo>,
        recipes: Arc<dyn RecipeRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            comments,
            recipes,
            users,
        }
    }

    /// Post a comment under the caller's current display name.
    pub async fn create_comment(
        &self,
        req: CommentRequest,
        user: &Requester,
    ) -> Result<CommentResponse, AppError> {
        let text = req.text.trim();
        if text.is_empty() {
            return Err(AppError::validation("comment text is required"));
        }
        let recipe_id = parse_id(&req.recipe_id)?;

        let author = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;
        if self.recipes.find_by_id(recipe_id).await?.is_none() {
            return Err(AppError::not_found("recipe not found"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: author.id,
            user_name: author.name,
            recipe_id,
            text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.comments.insert(&comment).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("recipe not found")
            } else {
                AppError::from(e)
            }
        })?;

        info!(comment_id = %comment.id, recipe_id = %recipe_id, user_id = %user.id, "comment created");
        Ok(comment.into())
    }

    pub async fn delete_comment(&self, id: &str, requester: &Requester) -> Result<(), AppError> {
        let id = parse_id(id)?;
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("comment not found"))?;
        let recipe = self
            .recipes
            .find_by_id(comment.recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("associated recipe not found"))?;

        if !can_delete_comment(requester, comment.user_id, recipe.user_id) {
            warn!(comment_id = %id, user_id = %requester.id, "comment delete denied");
            return Err(AppError::forbidden("unauthorized to delete this comment"));
        }
        if self.comments.delete(id).await? == 0 {
            return Err(AppError::not_found("could not delete comment"));
        }

        info!(comment_id = %id, user_id = %requester.id, "comment deleted");
        Ok(())
    }

    /// Newest first.
    pub async fn get_comments_by_recipe(
        &self,
        recipe_id: &str,
    ) -> Result<Vec<CommentResponse>, AppError> {
        let recipe_id = parse_id(recipe_id)?;
        let rows = self.comments.list_by_recipe(recipe_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_comment_by_id(&self, id: &str) -> Result<CommentResponse, AppError> {
        let id = parse_id(id)?;
        self.comments
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("comment not found"))
    }
}
