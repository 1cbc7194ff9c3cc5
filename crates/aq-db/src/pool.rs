//! Database connection pool management

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }

    /// Build from the application's database section
    pub fn from_app(config: &aq_core::config::DatabaseConfig) -> Option<Self> {
        let url = config.url.as_ref()?;
        Some(Self {
            url: url.clone(),
            max_connections: config.pool_size,
            connect_timeout_secs: config.pool_timeout_seconds,
        })
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS models (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        project_id BIGINT,
        scope TEXT NOT NULL DEFAULT 'public'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS model_templates (
        model_id BIGINT NOT NULL REFERENCES models(id) ON DELETE CASCADE,
        template_id BIGINT NOT NULL,
        PRIMARY KEY (model_id, template_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS network_models (
        model_id BIGINT NOT NULL REFERENCES models(id) ON DELETE CASCADE,
        network_id BIGINT NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        settings JSONB,
        PRIMARY KEY (model_id, network_id)
    )
    "#,
];

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        tracing::info!(
            "Database pool created with {} max connections",
            config.max_connections
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the model tables if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Check if the database is reachable
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}
