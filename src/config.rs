use anyhow::ensure;
use serde::Deserialize;

/// One year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;
/// Thirty days.
pub const MAX_INVITATION_TTL_HOURS: i64 = 24 * 30;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub from_email: String,
    pub from_name: String,
    pub sendgrid_api_key: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub invitation_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub query_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub frontend_url: String,
    pub env: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gophersocial".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gophersocial".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60 * 24 * 3),
        };
        let mail = MailConfig {
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "hello@demomailtrap.co".into()),
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "GopherSocial".into()),
            sendgrid_api_key: std::env::var("SENDGRID_API_KEY").unwrap_or_default(),
            max_retries: env_or("MAIL_MAX_RETRIES", 3),
            retry_base_delay_ms: env_or("MAIL_RETRY_BASE_DELAY_MS", 1000),
            invitation_ttl_hours: env_or("INVITATION_TTL_HOURS", 24 * 3),
        };
        let config = Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            query_timeout_secs: env_or("DB_QUERY_TIMEOUT_SECS", 5),
            jwt,
            mail,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would overflow date arithmetic or make no sense.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_JWT_TTL_MINUTES).contains(&self.jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}, got {}",
            self.jwt.ttl_minutes
        );
        ensure!(
            (1..=MAX_INVITATION_TTL_HOURS).contains(&self.mail.invitation_ttl_hours),
            "INVITATION_TTL_HOURS must be between 1 and {MAX_INVITATION_TTL_HOURS}, got {}",
            self.mail.invitation_ttl_hours
        );
        ensure!(!self.jwt.secret.is_empty(), "JWT_SECRET must not be empty");
        ensure!(self.query_timeout_secs > 0, "DB_QUERY_TIMEOUT_SECS must be positive");
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.query_timeout_secs)
    }

    pub fn invitation_ttl(&self) -> time::Duration {
        time::Duration::seconds(self.mail.invitation_ttl_hours.saturating_mul(3600))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
