use serde::Deserialize;

/// Locales the site is published in.
pub const SUPPORTED_LOCALES: &[&str] = &["ar", "en"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Shared secret for the admin routes. Admin routes refuse every call when unset.
    pub admin_token: Option<String>,
    pub default_locale: String,
    pub max_body_bytes: usize,
    pub rate_limit_replenish_secs: u64,
    pub rate_limit_burst: u32,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

/// Reads an optional numeric variable, falling back to `default` when unset.
fn numeric_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            admin_token: std::env::var("ADMIN_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            default_locale: std::env::var("DEFAULT_LOCALE")
                .unwrap_or_else(|_| "ar".to_string())
                .trim()
                .to_lowercase(),
            max_body_bytes: numeric_var("MAX_BODY_BYTES", 1024 * 1024)?,
            rate_limit_replenish_secs: numeric_var("RATE_LIMIT_REPLENISH_SECS", 2)?,
            rate_limit_burst: numeric_var("RATE_LIMIT_BURST", 20)?,
            db_max_connections: numeric_var("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout_secs: numeric_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        };

        if !SUPPORTED_LOCALES.contains(&config.default_locale.as_str()) {
            anyhow::bail!(
                "DEFAULT_LOCALE must be one of: {}",
                SUPPORTED_LOCALES.join(", ")
            );
        }
        if config.rate_limit_replenish_secs == 0 || config.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_REPLENISH_SECS and RATE_LIMIT_BURST must be positive");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Default locale: {}", config.default_locale);
        if config.admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set - admin routes will reject every request");
        }

        Ok(config)
    }

    /// Configuration for tests and local tooling that never touch the network.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgresql://localhost/brokerage_test".to_string(),
            port: 0,
            admin_token: Some("test-admin-token".to_string()),
            default_locale: "ar".to_string(),
            max_body_bytes: 1024 * 1024,
            rate_limit_replenish_secs: 2,
            rate_limit_burst: 20,
            db_max_connections: 2,
            db_acquire_timeout_secs: 1,
        }
    }
}
