use certregistry::app::{AppState, build_router};
use certregistry::auth::token::SessionSigner;
use certregistry::config::BootstrapAdmin;
use certregistry::seed;
use certregistry::store::memory::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub const ADMIN_EMAIL: &str = "admin@aaa.org";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const PUBLIC_BASE_URL: &str = "https://certs.example.org";

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

/// Router over a fresh in-memory store with the bootstrap admin in place.
pub async fn test_app() -> axum::routing::RouterIntoService<axum::body::Body, ()> {
    let store = Arc::new(InMemoryStore::new());
    seed::ensure_bootstrap_admin(
        store.as_ref(),
        &BootstrapAdmin {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
            name: "AAA Administrator".to_string(),
        },
    )
    .await
    .expect("bootstrap admin");
    let signer = SessionSigner::from_secret(&[42u8; 32], Duration::from_secs(3600)).expect("signer");
    build_router(AppState::new(store, signer, PUBLIC_BASE_URL)).into_service()
}
