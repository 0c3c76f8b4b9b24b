use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod prompts;
pub mod quiz;
pub mod routes;
pub mod session;
pub mod store;
pub mod streak;
pub mod transcript;
pub mod video;

use gateway::Gateway;
use session::IdentityProvider;
use store::LearningStore;
use streak::Clock;
use transcript::TranscriptFetcher;

/// Everything a handler can reach. Built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LearningStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Gateway,
    pub clock: Arc<dyn Clock>,
    pub transcripts: TranscriptFetcher,
}

/// The API router, serving the built front end for everything else when
/// `frontend_dir` is given.
pub fn app(state: AppState, frontend_dir: Option<&Path>) -> Router {
    let router = routes::router();

    let router = match frontend_dir {
        Some(dir) => router
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
