use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{config::GoogleConfig, users::dto::FederatedIdentity};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "openid email profile";

/// Trades an authorization code for the identity of the person who granted it.
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    fn authorize_url(&self, state: &str) -> Result<String>;
    async fn exchange(&self, code: &str) -> Result<FederatedIdentity>;
}

/// Random value tying a callback to the login that started it.
pub fn new_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: String,
}

pub struct GoogleExchange {
    client: Client,
    config: GoogleConfig,
}

impl GoogleExchange {
    pub fn new(config: GoogleConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("burned/0.1")
            .build()
            .context("build http client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IdentityExchange for GoogleExchange {
    fn authorize_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .context("build google authorize url")?;
        Ok(url.into())
    }

    async fn exchange(&self, code: &str) -> Result<FederatedIdentity> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .context("request google token")?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("google token exchange failed: status={status}, body={body}");
        }
        let token: TokenResponse = response.json().await.context("decode google token")?;

        let info: UserInfo = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("request google userinfo")?
            .error_for_status()
            .context("google userinfo status")?
            .json()
            .await
            .context("decode google userinfo")?;
        debug!(provider_id = %info.id, "google identity resolved");

        let name = if info.name.trim().is_empty() {
            info.email.split('@').next().unwrap_or_default().to_string()
        } else {
            info.name
        };
        Ok(FederatedIdentity {
            provider_id: info.id,
            email: info.email,
            name,
        })
    }
}
