use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies the embedded migrations in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to apply database migrations")?;
    info!("Database migrations applied");
    Ok(())
}

/// Clamps `page`/`per_page` query values and returns `(page, per_page, offset)`.
pub fn paginate(page: Option<i64>, per_page: Option<i64>, max_per_page: i64) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, max_per_page);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_defaults() {
        assert_eq!(paginate(None, None, 50), (1, 20, 0));
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        assert_eq!(paginate(Some(0), Some(500), 50), (1, 50, 0));
        assert_eq!(paginate(Some(-3), Some(0), 50), (1, 1, 0));
    }

    #[test]
    fn test_paginate_offset() {
        assert_eq!(paginate(Some(3), Some(10), 50), (3, 10, 20));
    }
}
