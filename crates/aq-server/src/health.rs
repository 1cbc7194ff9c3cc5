//! Health checks
//!
//! Reports on the stores the API depends on.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aq_db::Database;
use aq_store::ResourceStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    fn worst(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Health checker configuration
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Timeout for individual health checks
    pub check_timeout: Duration,
    /// Cache duration for health results
    pub cache_duration: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            cache_duration: Duration::from_secs(10),
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

/// Health checker service
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    resources: Option<Arc<dyn ResourceStore>>,
    database: Option<Database>,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            resources: None,
            database: None,
        }
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceStore>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Get cached health or perform checks
    pub async fn check(&self) -> HealthReport {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.cached_at.elapsed() < self.config.cache_duration {
                    debug!("Returning cached health report");
                    return cached.report.clone();
                }
            }
        }

        let report = self.perform_checks().await;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedHealth {
            report: report.clone(),
            cached_at: Instant::now(),
        });

        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let mut components = Vec::new();

        if let Some(resources) = &self.resources {
            components.push(self.check_resource_store(resources.as_ref()).await);
        }
        components.push(match &self.database {
            Some(database) => self.check_database(database).await,
            // memory-backed model store still serves requests
            None => ComponentHealth {
                name: "model_store".to_string(),
                status: HealthStatus::Degraded,
                message: Some("In-memory model store, bindings are not persisted".to_string()),
                response_time_ms: 0,
                details: None,
            },
        });

        let status = components
            .iter()
            .fold(HealthStatus::Healthy, |acc, c| acc.worst(c.status));

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }

    async fn timed<F, T, E>(&self, name: &str, check: F) -> (Result<T, String>, u64)
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.config.check_timeout, check).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("{name} check timed out")),
        };
        if let Err(ref message) = result {
            warn!(component = name, %message, "Health check failed");
        }
        (result, start.elapsed().as_millis() as u64)
    }

    async fn check_resource_store(&self, resources: &dyn ResourceStore) -> ComponentHealth {
        let (result, response_time_ms) = self
            .timed("resource_store", resources.get_templates())
            .await;

        match result {
            Ok(templates) => ComponentHealth {
                name: "resource_store".to_string(),
                status: HealthStatus::Healthy,
                message: Some("Reachable".to_string()),
                response_time_ms,
                details: Some(serde_json::json!({ "templates": templates.len() })),
            },
            Err(message) => ComponentHealth {
                name: "resource_store".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(message),
                response_time_ms,
                details: None,
            },
        }
    }

    async fn check_database(&self, database: &Database) -> ComponentHealth {
        let (result, response_time_ms) = self.timed("database", database.ping()).await;
        let stats = database.stats();

        ComponentHealth {
            name: "database".to_string(),
            status: if result.is_ok() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            message: Some(result.err().unwrap_or_else(|| "Connected".to_string())),
            response_time_ms,
            details: Some(serde_json::json!({
                "type": "postgresql",
                "pool_size": stats.size,
                "idle_connections": stats.idle
            })),
        }
    }
}

/// Simple liveness check
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness and full health check
pub async fn health(State(health): State<Arc<HealthChecker>>) -> (StatusCode, Json<HealthReport>) {
    let report = health.check().await;
    (report.http_status(), Json(report))
}
