use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::{
        google::{GoogleExchange, IdentityExchange},
        jwt::JwtKeys,
        password::{Argon2Hasher, SecretHasher},
    },
    comments::{
        repo::{CommentRepo, PgCommentRepo},
        services::CommentService,
    },
    config::AppConfig,
    ratings::{
        repo::{PgRatingRepo, RatingRepo},
        services::RatingService,
    },
    recipes::{
        repo::{PgRecipeRepo, RecipeRepo},
        services::RecipeService,
    },
    saved::{
        repo::{PgSavedRecipeRepo, SavedRecipeRepo},
        services::SavedRecipeService,
    },
    users::{
        repo::{PgUserRepo, UserRepo},
        services::UserService,
    },
};

/// One handle per stored entity.
pub struct Repositories {
    pub users: Arc<dyn UserRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
    pub ratings: Arc<dyn RatingRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub saved: Arc<dyn SavedRecipeRepo>,
}

impl Repositories {
    pub fn postgres(db: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            recipes: Arc::new(PgRecipeRepo::new(db.clone())),
            ratings: Arc::new(PgRatingRepo::new(db.clone())),
            comments: Arc::new(PgCommentRepo::new(db.clone())),
            saved: Arc::new(PgSavedRecipeRepo::new(db)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: UserService,
    pub recipes: RecipeService,
    pub ratings: RatingService,
    pub comments: CommentService,
    pub saved: SavedRecipeService,
    pub identity: Option<Arc<dyn IdentityExchange>>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        repos: Repositories,
        hasher: Arc<dyn SecretHasher>,
        identity: Option<Arc<dyn IdentityExchange>>,
    ) -> Self {
        let Repositories {
            users,
            recipes,
            ratings,
            comments,
            saved,
        } = repos;

        Self {
            jwt: JwtKeys::new(&config.jwt),
            users: UserService::new(users.clone(), hasher),
            recipes: RecipeService::new(recipes.clone(), users.clone()),
            ratings: RatingService::new(ratings, recipes.clone()),
            comments: CommentService::new(comments, recipes.clone(), users),
            saved: SavedRecipeService::new(saved, recipes),
            identity,
            config,
        }
    }

    /// Production wiring: Postgres repositories, argon2 hashing and, when
    /// credentials are configured, Google sign-in.
    pub fn from_pool(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        let identity = match config.google.clone() {
            Some(google) => {
                info!("google sign-in enabled");
                Some(Arc::new(GoogleExchange::new(google)?) as Arc<dyn IdentityExchange>)
            }
            None => None,
        };
        Ok(Self::new(
            config,
            Repositories::postgres(db),
            Arc::new(Argon2Hasher),
            identity,
        ))
    }
}
