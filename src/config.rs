use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Upper bound for a single store round-trip, in seconds.
    pub store_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub frontend_url: String,
    pub google: Option<GoogleConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "burned".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "burned-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24),
        };

        // Federated login is only wired up when both credentials are present
        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: std::env::var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/auth/google/callback".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            store_timeout_secs: env_parse("STORE_TIMEOUT_SECS").unwrap_or(10),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(30),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(8080),
            jwt,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            google,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
