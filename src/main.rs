mod db;
mod frame;
mod llm;
mod media;
mod rate_limit;
mod routes;
mod services;
mod state;
mod validation;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::llm::LlmChat;
use crate::media::MediaStore;
use crate::media::config::{MediaConfig, MediaProviderKind};
use crate::routes::StaticDirs;
use crate::services::content::PgContentStore;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WEB_DIR: &str = "./web";
const DEFAULT_LOG_FILTER: &str = "formflow=info,tower_http=info";

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("DATABASE_URL required")]
    MissingDatabaseUrl,
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

/// Parse an env var, falling back to `default` when unset or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| StartupError::MissingDatabaseUrl)?;
    let port: u16 = env_parse("PORT", DEFAULT_PORT);
    let web_dir = std::env::var("WEB_DIR").map_or_else(|_| PathBuf::from(DEFAULT_WEB_DIR), PathBuf::from);

    let pool = db::init_pool(&database_url).await?;

    // Initialize LLM client (non-fatal: submissions rejected if config missing).
    let llm: Option<Arc<dyn LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured; sanitization disabled");
            None
        }
    };

    let (media, media_dir) = init_media();

    let state = state::AppState::new(Arc::new(PgContentStore::new(pool)), llm, media);
    let app = routes::app(state, StaticDirs { web_dir, media_dir });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "formflow listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(StartupError::Serve)
}

/// Media store and, for the local provider, the directory to serve.
/// Non-fatal: image attachments are rejected if config is missing or bad.
fn init_media() -> (Option<Arc<dyn MediaStore>>, Option<PathBuf>) {
    let config = match MediaConfig::from_env() {
        Ok(Some(config)) => config,
        Ok(None) => {
            tracing::warn!("MEDIA_PROVIDER not set; image attachments disabled");
            return (None, None);
        }
        Err(e) => {
            tracing::warn!(error = %e, "media store misconfigured; image attachments disabled");
            return (None, None);
        }
    };

    let media_dir = match &config.provider {
        MediaProviderKind::Local { dir } => Some(dir.clone()),
        MediaProviderKind::Cloudinary(_) => None,
    };
    match media::from_config(config) {
        Ok(store) => {
            tracing::info!(local = media_dir.is_some(), "media store initialized");
            (Some(store), media_dir)
        }
        Err(e) => {
            tracing::warn!(error = %e, "media store init failed; image attachments disabled");
            (None, None)
        }
    }
}
