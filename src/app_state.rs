use crate::{
    database::DatabaseManager,
    repositories::{
        FolderStore, MemoryStore, PgFolderRepository, PgQTreeRepository, PgWorkRepository, QTreeStore, WorkStore,
    },
    services::{
        as_directory, spawn_cache_invalidation, AuthService, EventBus, FolderService, HostedAuthClient, IdentityProvider,
        QTreeService, WorkService,
    },
};
use anyhow::{bail, Context, Result};
use axum::extract::FromRef;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBackendKind {
    Postgres,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_backend: DataBackendKind,
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth_url: Url,
    pub auth_api_key: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub server_host: String,
    pub server_port: u16,
    pub cache_ttl: Duration,
    pub preview_length: usize,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: Environment,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Reads configuration from the environment. Call `dotenvy::dotenv()`
    /// first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let environment = match env_or("ENVIRONMENT", "development").as_str() {
            "production" => Environment::Production,
            "testing" => Environment::Testing,
            _ => Environment::Development,
        };

        let data_backend = match env_or("DATA_BACKEND", "postgres").as_str() {
            "postgres" => DataBackendKind::Postgres,
            "memory" => DataBackendKind::Memory,
            other => bail!("DATA_BACKEND must be 'postgres' or 'memory', got {:?}", other),
        };

        let jwt_secret = env_or("JWT_SECRET", DEV_JWT_SECRET);
        if environment == Environment::Production && jwt_secret == DEV_JWT_SECRET {
            bail!("JWT_SECRET must be set in production");
        }

        let auth_url = env_or("AUTH_URL", "http://localhost:9999/");
        let auth_url = Url::parse(&auth_url)
            .map(as_directory)
            .with_context(|| format!("AUTH_URL is not a valid URL: {}", auth_url))?;

        let log_format = match env_or("LOG_FORMAT", "pretty").as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            data_backend,
            database_url: env_or("DATABASE_URL", "postgresql://localhost/works_qtree"),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 20)?,
            auth_url,
            auth_api_key: env_or("AUTH_API_KEY", ""),
            jwt_secret,
            jwt_audience: env_or("JWT_AUDIENCE", "authenticated"),
            server_host: env_or("SERVER_HOST", "0.0.0.0"),
            server_port: parse_env("SERVER_PORT", 8000)?,
            cache_ttl: Duration::from_secs(parse_env("CACHE_TTL_SECS", 30)?),
            preview_length: parse_env("PREVIEW_LENGTH", crate::models::DEFAULT_PREVIEW_LENGTH)?,
            cors_origins,
            log_level: env_or("LOG_LEVEL", "info"),
            log_format,
            environment,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Where entity rows live.
#[derive(Clone)]
pub enum DataBackend {
    Postgres(DatabaseManager),
    Memory(Arc<MemoryStore>),
}

impl DataBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Postgres(db) => db.health_check().await,
            Self::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Self::Postgres(db) = self {
            db.close().await;
        }
    }

    fn stores(&self) -> (Arc<dyn FolderStore>, Arc<dyn WorkStore>, Arc<dyn QTreeStore>) {
        match self {
            Self::Postgres(db) => {
                let folders: Arc<dyn FolderStore> = Arc::new(PgFolderRepository::new(db.pool().clone()));
                let works: Arc<dyn WorkStore> = Arc::new(PgWorkRepository::new(db.pool().clone()));
                let qtrees: Arc<dyn QTreeStore> = Arc::new(PgQTreeRepository::new(db.pool().clone()));
                (folders, works, qtrees)
            }
            Self::Memory(store) => {
                let folders: Arc<dyn FolderStore> = store.clone();
                let works: Arc<dyn WorkStore> = store.clone();
                let qtrees: Arc<dyn QTreeStore> = store.clone();
                (folders, works, qtrees)
            }
        }
    }
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub folder_service: Arc<FolderService>,
    pub work_service: Arc<WorkService>,
    pub qtree_service: Arc<QTreeService>,
    #[from_ref(skip)]
    pub events: EventBus,
    #[from_ref(skip)]
    pub backend: DataBackend,
    #[from_ref(skip)]
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects the configured backend and the hosted auth client.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let backend = match config.data_backend {
            DataBackendKind::Postgres => DataBackend::Postgres(
                DatabaseManager::connect(&config.database_url, config.database_max_connections).await?,
            ),
            DataBackendKind::Memory => DataBackend::Memory(Arc::new(MemoryStore::new())),
        };

        let provider = HostedAuthClient::new(config.auth_url.clone(), config.auth_api_key.clone(), Duration::from_secs(10))?;

        Self::with_backend(config, backend, Arc::new(provider))
    }

    /// Wires services over an existing backend. Must run inside a Tokio
    /// runtime since it spawns the cache invalidation listener.
    pub fn with_backend(config: AppConfig, backend: DataBackend, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        let (folder_store, work_store, qtree_store) = backend.stores();
        let events = EventBus::default();

        let auth_service = Arc::new(AuthService::new(provider, &config.jwt_secret, &config.jwt_audience));

        let folder_service = Arc::new(
            FolderService::new(folder_store.clone(), config.cache_ttl).with_event_bus(events.clone()),
        );

        let work_service = Arc::new(
            WorkService::new(work_store, folder_store.clone(), config.cache_ttl)
                .with_event_bus(events.clone())
                .with_preview_length(config.preview_length),
        );

        let qtree_service = Arc::new(
            QTreeService::new(qtree_store, folder_store, config.cache_ttl)
                .with_event_bus(events.clone())
                .with_preview_length(config.preview_length),
        );

        spawn_cache_invalidation(events.subscribe(), work_service.clone(), qtree_service.clone());

        info!(backend = backend.name(), cache_ttl_secs = config.cache_ttl.as_secs(), "Application state ready");

        Ok(Self {
            auth_service,
            folder_service,
            work_service,
            qtree_service,
            events,
            backend,
            config: Arc::new(config),
        })
    }

    pub async fn health_check(&self) -> HealthStatus {
        let mut checks = HashMap::new();

        let started = Instant::now();
        let backend_check = match self.backend.ping().await {
            Ok(()) => ServiceHealth {
                status: "healthy".to_string(),
                response_time_ms: started.elapsed().as_millis() as u64,
                last_checked: chrono::Utc::now(),
                details: Some(format!("{} backend reachable", self.backend.name())),
            },
            Err(e) => ServiceHealth {
                status: "unhealthy".to_string(),
                response_time_ms: started.elapsed().as_millis() as u64,
                last_checked: chrono::Utc::now(),
                details: Some(format!("Connection failed: {}", e)),
            },
        };
        checks.insert("data_service".to_string(), backend_check);

        let status = if checks.values().all(|check| check.status == "healthy") {
            "healthy"
        } else {
            "unhealthy"
        };

        HealthStatus {
            status: status.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: get_uptime_seconds(),
            checks,
            system_info: get_system_info(),
        }
    }

    pub async fn graceful_shutdown(&self) {
        info!("Releasing data backend...");
        self.backend.close().await;
        info!("Graceful shutdown completed");
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HashMap<String, ServiceHealth>,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    pub response_time_ms: u64,
    pub last_checked: chrono::DateTime<chrono::Utc>,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub platform: String,
    pub architecture: String,
    pub rust_version: String,
    pub build_timestamp: String,
    pub git_commit: String,
}

fn get_system_info() -> SystemInfo {
    SystemInfo {
        hostname: gethostname::gethostname().to_string_lossy().to_string(),
        platform: std::env::consts::OS.to_string(),
        architecture: std::env::consts::ARCH.to_string(),
        rust_version: env!("RUSTC_VERSION").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        git_commit: env!("GIT_COMMIT").to_string(),
    }
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Pins the uptime origin. Called once at startup.
pub fn mark_started() {
    START_TIME.get_or_init(Instant::now);
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}
