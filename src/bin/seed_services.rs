//! Loads catalog entries from a JSON file into the `services` table.
//!
//! Usage: `seed_services <services.json>` where the file holds an array of
//! `{ "id", "name", "status", "displayOrder" }` objects. `name` is either a
//! plain string or a locale map such as `{ "ar": "...", "en": "..." }`.
//! Existing entries with the same id are replaced.

use anyhow::Context;
use std::env;

use brokerage_intake_api::config::Config;
use brokerage_intake_api::db::Database;
use brokerage_intake_api::models::Service;
use brokerage_intake_api::storage::PgServiceCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed_services=info,brokerage_intake_api=info".into()),
        )
        .init();

    let path = env::args()
        .nth(1)
        .context("usage: seed_services <services.json>")?;

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path))?;
    let services: Vec<Service> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    db.ensure_schema().await?;

    let catalog = PgServiceCatalog::new(db.pool.clone());
    for service in &services {
        catalog
            .upsert(service)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        println!("- {} {} ({})", service.id, service.name.resolve("en"), service.status);
    }

    println!("Seeded {} services", services.len());
    Ok(())
}
