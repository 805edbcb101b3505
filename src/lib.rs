use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod follows;
pub mod posts;
pub mod response;
pub mod store;

use config::settings::Settings;
use store::{DynStore, MemoryStore, SocialStore};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub settings: Settings,
}

impl AppState {
    pub fn new(store: impl SocialStore + 'static, settings: Settings) -> Self {
        Self {
            store: Arc::new(store),
            settings,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(MemoryStore::new(), settings)
    }
}

impl FromRef<AppState> for DynStore {
    fn from_ref(app_state: &AppState) -> DynStore {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(app_state: &AppState) -> Settings {
        app_state.settings.clone()
    }
}

pub fn router(app_state: AppState) -> Router {
    let auth_router = Router::new()
        .route("/", get(auth::handler::index))
        .route(
            "/login",
            get(auth::handler::login_page).post(auth::handler::login),
        )
        .route(
            "/logout",
            get(auth::handler::logout).post(auth::handler::logout),
        )
        .route(
            "/register",
            get(auth::handler::register_page).post(auth::handler::register),
        );

    // Verb checks for these live in the handlers so that the error bodies
    // stay JSON.
    let api_router = Router::new()
        .route("/new_post", any(posts::handler::new_post))
        .route("/posts/:selector/", get(posts::handler::feed))
        .route("/edit_post/:id/", any(posts::handler::edit_post))
        .route("/like_post/:id/", any(posts::handler::like_post))
        .route("/profile/:username/", get(follows::handler::profile))
        .route("/follow/:username/", any(follows::handler::follow_user));

    Router::new()
        .merge(auth_router)
        .merge(api_router)
        .fallback(auth::handler::index)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
