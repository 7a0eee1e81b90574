use anyhow::Result;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

/// Schema migrations embedded from `backend/migrations` at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies every embedded migration not yet recorded in the database.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    tracing::info!(known = MIGRATOR.iter().count(), "Database schema is up to date");
    Ok(())
}

/// `(version, description)` of every embedded migration, oldest first.
pub fn embedded_migrations() -> Vec<(i64, String)> {
    MIGRATOR
        .iter()
        .map(|m| (m.version, m.description.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_migrations_are_ordered() {
        let migrations = embedded_migrations();
        let descriptions: Vec<&str> = migrations.iter().map(|(_, d)| d.as_str()).collect();
        assert_eq!(descriptions, vec!["create users", "create swipes", "create matches"]);
        assert!(migrations.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
