//! Registry configuration.
//!
//! Values come from `CERTREG_*` environment variables with local defaults. A
//! YAML file named by `CERTREG_CONFIG` may override any of them.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

/// Admin account upserted at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    /// Prefix for share links and QR codes, e.g. `https://certs.example.org`.
    pub public_base_url: String,
    /// HS256 secret for admin sessions; a random one is generated when unset.
    pub session_secret: Option<String>,
    pub session_ttl_secs: u64,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub seed_demo: bool,
}

#[derive(Debug, Deserialize)]
struct RegistryConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres: Option<PostgresOverride>,
    public_base_url: Option<String>,
    session_secret: Option<String>,
    session_ttl_secs: Option<u64>,
    bootstrap_admin: Option<BootstrapAdminOverride>,
    seed_demo: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PostgresOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BootstrapAdminOverride {
    email: String,
    password: String,
    name: Option<String>,
}

const DEFAULT_ADMIN_NAME: &str = "AAA Administrator";

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("CERTREG_BIND")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .with_context(|| "parse CERTREG_BIND")?;
        let metrics_bind = std::env::var("CERTREG_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse CERTREG_METRICS_BIND")?;
        let storage = StorageBackend::parse(
            &std::env::var("CERTREG_STORAGE").unwrap_or_else(|_| "memory".to_string()),
        )
        .with_context(|| "parse CERTREG_STORAGE")?;
        let postgres = match std::env::var("CERTREG_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
        {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("CERTREG_PG_MAX_CONNECTIONS", 10)?,
                connect_timeout_ms: env_parse("CERTREG_PG_CONNECT_TIMEOUT_MS", 5_000)?,
                acquire_timeout_ms: env_parse("CERTREG_PG_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        let public_base_url = std::env::var("CERTREG_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let session_secret = std::env::var("CERTREG_SESSION_SECRET").ok();
        let session_ttl_secs = env_parse("CERTREG_SESSION_TTL_SECS", 60 * 60 * 24)?;
        let bootstrap_admin = match (
            std::env::var("CERTREG_ADMIN_EMAIL"),
            std::env::var("CERTREG_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: std::env::var("CERTREG_ADMIN_NAME")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_NAME.to_string()),
            }),
            _ => None,
        };
        let seed_demo = env_parse("CERTREG_SEED_DEMO", false)?;
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            public_base_url,
            session_secret,
            session_ttl_secs,
            bootstrap_admin,
            seed_demo,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("CERTREG_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read CERTREG_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: RegistryConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse registry config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = StorageBackend::parse(&value).with_context(|| "parse storage")?;
        }
        if let Some(pg) = override_cfg.postgres {
            let base = self.postgres.take();
            let url = pg
                .url
                .or_else(|| base.as_ref().map(|cfg| cfg.url.clone()))
                .context("postgres.url missing")?;
            self.postgres = Some(PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or(base.as_ref().map(|cfg| cfg.max_connections))
                    .unwrap_or(10),
                connect_timeout_ms: pg
                    .connect_timeout_ms
                    .or(base.as_ref().map(|cfg| cfg.connect_timeout_ms))
                    .unwrap_or(5_000),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or(base.as_ref().map(|cfg| cfg.acquire_timeout_ms))
                    .unwrap_or(5_000),
            });
        }
        if let Some(value) = override_cfg.public_base_url {
            self.public_base_url = value;
        }
        if let Some(value) = override_cfg.session_secret {
            self.session_secret = Some(value);
        }
        if let Some(value) = override_cfg.session_ttl_secs {
            self.session_ttl_secs = value;
        }
        if let Some(admin) = override_cfg.bootstrap_admin {
            self.bootstrap_admin = Some(BootstrapAdmin {
                email: admin.email,
                password: admin.password,
                name: admin.name.unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            });
        }
        if let Some(value) = override_cfg.seed_demo {
            self.seed_demo = value;
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
