//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the REST and websocket endpoints under a single Axum
//! router. The static page is served from `WEB_DIR` as the fallback, and a
//! local media directory, when configured, is mounted at `/media`.

pub mod content;
pub mod ws;

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::media::local::PUBLIC_PREFIX;
use crate::state::AppState;

/// Headroom above the image limit for the text field and multipart framing.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

/// Filesystem locations the router serves.
#[derive(Debug, Clone, Default)]
pub struct StaticDirs {
    /// Directory holding `index.html`.
    pub web_dir: PathBuf,
    /// Local media directory, if the local media provider is active.
    pub media_dir: Option<PathBuf>,
}

/// API routes, shared by the binary and tests.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state
        .limits
        .max_image_bytes
        .saturating_add(state.limits.max_chars.saturating_mul(4))
        .saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        .route("/api/content", get(content::list_content).post(content::create_content))
        .route(
            "/api/content/{id}",
            get(content::get_content)
                .patch(content::update_content)
                .delete(content::delete_content),
        )
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Full application: API routes, local media and the static page.
pub fn app(state: AppState, dirs: StaticDirs) -> Router {
    let mut router = api_routes(state);
    if let Some(media_dir) = dirs.media_dir {
        router = router.nest_service(PUBLIC_PREFIX, ServeDir::new(media_dir));
    }
    let web_service = ServeDir::new(&dirs.web_dir).append_index_html_on_directories(true);

    router
        .fallback_service(web_service)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::net::SocketAddr;

    use super::*;

    /// Serve `app(state)` on an ephemeral local port and return its address.
    pub(crate) async fn spawn(state: AppState, dirs: StaticDirs) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let router = app(state, dirs);
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .expect("test server failed");
        });
        addr
    }
}
