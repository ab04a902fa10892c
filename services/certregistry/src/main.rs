//! Certificate registry HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, session signing, and the HTTP router, then
//! starts the API server and the metrics listener.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use certregistry::app::{AppState, build_router};
use certregistry::auth::token::SessionSigner;
use certregistry::config::{RegistryConfig, StorageBackend};
use certregistry::observability;
use certregistry::seed;
use certregistry::store::RegistryStore;
use certregistry::store::memory::InMemoryStore;
use certregistry::store::postgres::PostgresStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RegistryConfig::from_env_or_yaml().context("registry config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: RegistryConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("certregistry");
    let state = build_state(config.clone()).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());

    let addr = config.bind_addr;
    tracing::info!(%addr, backend = state.store.backend_name(), "certificate registry listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: RegistryConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn RegistryStore + Send + Sync> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres store")?,
            )
        }
    };

    let ttl = Duration::from_secs(config.session_ttl_secs);
    let signer = match &config.session_secret {
        Some(secret) => {
            SessionSigner::from_secret(secret.as_bytes(), ttl).context("session secret")?
        }
        None => {
            tracing::warn!("CERTREG_SESSION_SECRET unset; sessions will not survive a restart");
            SessionSigner::ephemeral(ttl)
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        seed::ensure_bootstrap_admin(store.as_ref(), admin).await?;
    }
    if config.seed_demo {
        let inserted = seed::seed_demo_certificates(store.as_ref()).await?;
        tracing::info!(inserted, "demo certificates checked");
    }

    Ok(AppState::new(store, signer, config.public_base_url))
}
