use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{FederatedIdentity, RegisterRequest, UserResponse},
    repo::UserRepo,
    repo_types::{Role, User},
};
use crate::{
    auth::password::{is_valid_email, meets_policy, SecretHasher},
    error::{is_unique_violation, parse_id, AppError},
};

const WEAK_PASSWORD: &str = "password does not meet the security requirements";
const FEDERATED_NAME_ATTEMPTS: usize = 5;

fn suffixed_name(base: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{base}-{suffix}")
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepo>,
    hasher: Arc<dyn SecretHasher>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepo>, hasher: Arc<dyn SecretHasher>) -> Self {
        Self { repo, hasher }
    }

    /// Register a local account. The name/email pre-checks give friendly
    /// errors; the unique indexes decide races.
    pub async fn create_user(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        let email = req.email.trim().to_lowercase();
        let name = req.name.trim().to_string();

        if !is_valid_email(&email) {
            return Err(AppError::validation("invalid email"));
        }
        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if !meets_policy(&req.password) {
            return Err(AppError::validation(WEAK_PASSWORD));
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::conflict("email is already in use"));
        }
        if self.repo.find_by_name(&name).await?.is_some() {
            warn!(%name, "name already registered");
            return Err(AppError::conflict("name is already in use"));
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: Some(self.hasher.hash(&req.password)?),
            role: Role::User,
            google_id: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(&user).await?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.into())
    }

    /// Verify local credentials. Unknown accounts and federated-only accounts
    /// are indistinguishable from a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserResponse, AppError> {
        let email = email.trim().to_lowercase();
        let invalid = || AppError::unauthorized("invalid credentials");

        let user = self.repo.find_by_email(&email).await?.ok_or_else(|| {
            warn!(%email, "login unknown email");
            invalid()
        })?;
        let Some(hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "login on account without local password");
            return Err(invalid());
        };
        if !self.hasher.verify(password, hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(invalid());
        }
        Ok(user.into())
    }

    pub async fn update_user(&self, id: &str, new_name: &str) -> Result<UserResponse, AppError> {
        let id = parse_id(id)?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::validation("name is required"));
        }

        let mut user = self.load(id).await?;
        if let Some(other) = self.repo.find_by_name(new_name).await? {
            if other.id != id {
                return Err(AppError::conflict("name is already in use"));
            }
        }

        user.name = new_name.to_string();
        user.updated_at = OffsetDateTime::now_utc();
        self.write_profile(&user).await?;
        Ok(user.into())
    }

    pub async fn update_password(
        &self,
        id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<UserResponse, AppError> {
        let id = parse_id(id)?;
        let mut user = self.load(id).await?;

        let Some(current) = user.password_hash.as_deref() else {
            return Err(AppError::unauthorized("wrong credentials"));
        };
        if !self.hasher.verify(old_password, current)? {
            warn!(user_id = %id, "password change with wrong credentials");
            return Err(AppError::unauthorized("wrong credentials"));
        }
        if !meets_policy(new_password) {
            return Err(AppError::validation(WEAK_PASSWORD));
        }
        if self.hasher.verify(new_password, current)? {
            return Err(AppError::validation(
                "the new password cannot be the same as the current one",
            ));
        }

        let hash = self.hasher.hash(new_password)?;
        let now = OffsetDateTime::now_utc();
        if self.repo.update_password(id, &hash, now).await? == 0 {
            return Err(AppError::not_found("user not found"));
        }

        info!(user_id = %id, "password changed");
        user.password_hash = Some(hash);
        user.updated_at = now;
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::not_found("user not found"));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<UserResponse, AppError> {
        let id = parse_id(id)?;
        Ok(self.load(id).await?.into())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserResponse, AppError> {
        let email = email.trim().to_lowercase();
        self.repo
            .find_by_email(&email)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    pub async fn get_user_by_name(&self, name: &str) -> Result<UserResponse, AppError> {
        self.repo
            .find_by_name(name.trim())
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// Resolve a federated login to a local account: by provider id, then by
    /// email (linking the provider id), else a fresh account without a local
    /// password.
    pub async fn login_or_register_federated(
        &self,
        identity: FederatedIdentity,
    ) -> Result<UserResponse, AppError> {
        if identity.provider_id.trim().is_empty() {
            return Err(AppError::validation("missing provider id"));
        }
        if let Some(user) = self.repo.find_by_google_id(&identity.provider_id).await? {
            return Ok(user.into());
        }

        let email = identity.email.trim().to_lowercase();
        if let Some(mut user) = self.repo.find_by_email(&email).await? {
            user.google_id = Some(identity.provider_id);
            user.updated_at = OffsetDateTime::now_utc();
            self.write_profile(&user).await?;
            info!(user_id = %user.id, "federated identity linked to existing account");
            return Ok(user.into());
        }

        let base = match identity.name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let now = OffsetDateTime::now_utc();
        let mut user = User {
            id: Uuid::new_v4(),
            name: base.clone(),
            email,
            password_hash: None,
            role: Role::User,
            google_id: Some(identity.provider_id),
            created_at: now,
            updated_at: now,
        };

        // Names are unique; a taken one gets a random suffix.
        for attempt in 1..=FEDERATED_NAME_ATTEMPTS {
            if self.repo.find_by_name(&user.name).await?.is_some() {
                user.name = suffixed_name(&base);
                continue;
            }
            match self.repo.insert(&user).await {
                Ok(()) => {
                    info!(user_id = %user.id, name = %user.name, "user registered through federated login");
                    return Ok(user.into());
                }
                Err(e) if is_unique_violation(&e) && attempt < FEDERATED_NAME_ATTEMPTS => {
                    if self.repo.find_by_email(&user.email).await?.is_some() {
                        return Err(AppError::conflict("email is already in use"));
                    }
                    warn!(name = %user.name, "display name taken concurrently, retrying");
                    user.name = suffixed_name(&base);
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(AppError::conflict("name or email is already in use"))
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::conflict("no free display name"))
    }

    async fn load(&self, id: Uuid) -> Result<User, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.repo.insert(user).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("name or email is already in use")
            } else {
                e.into()
            }
        })
    }

    async fn write_profile(&self, user: &User) -> Result<(), AppError> {
        let matched = self.repo.update_profile(user).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("name is already in use")
            } else {
                AppError::from(e)
            }
        })?;
        if matched == 0 {
            return Err(AppError::not_found("user not found"));
        }
        Ok(())
    }
}
