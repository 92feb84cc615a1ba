use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::migrate::MigrateDatabase;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

/// Owns the Postgres pool behind the remote data service.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DatabaseStats {
    pub folder_count: i64,
    pub work_count: i64,
    pub qtree_count: i64,
    pub node_count: i64,
}

impl DatabaseManager {
    /// Connects, creating the database when missing, and applies migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        if !Postgres::database_exists(database_url).await.unwrap_or(false) {
            warn!("Database does not exist, creating...");
            Postgres::create_database(database_url)
                .await
                .context("failed to create database")?;
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .context("failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;

        info!(max_connections, "PostgreSQL pool initialized and migrations applied");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let stats = sqlx::query_as::<_, DatabaseStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM folders) AS folder_count,
                (SELECT COUNT(*) FROM works) AS work_count,
                (SELECT COUNT(*) FROM qtree_roots) AS qtree_count,
                (SELECT COUNT(*) FROM qtree_nodes) AS node_count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn close(&self) {
        info!("Closing database connections...");
        self.pool.close().await;
    }
}
