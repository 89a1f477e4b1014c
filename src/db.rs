use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config::Config;

/// Idempotent DDL for the two document collections.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id            TEXT PRIMARY KEY,
        name          JSONB NOT NULL,
        status        TEXT NOT NULL DEFAULT 'active',
        display_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_requests (
        id           TEXT PRIMARY KEY,
        service_type TEXT NOT NULL,
        status       TEXT NOT NULL,
        service_id   TEXT NOT NULL,
        document     JSONB NOT NULL,
        created_at   TIMESTAMPTZ NOT NULL,
        updated_at   TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS service_requests_status_idx ON service_requests (status)",
    "CREATE INDEX IF NOT EXISTS service_requests_type_idx ON service_requests (service_type)",
    "CREATE INDEX IF NOT EXISTS service_requests_created_idx ON service_requests (created_at DESC)",
];

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        Self::connect(
            &config.database_url,
            config.db_max_connections,
            Duration::from_secs(config.db_acquire_timeout_secs),
        )
        .await
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema verified");
        Ok(())
    }
}
