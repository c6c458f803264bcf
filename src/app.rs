use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/practices", get(handlers::list_practices))
        .route("/api/practices/:id/progress", get(handlers::get_progress))
        .route("/api/practices/:id/tap", post(handlers::tap))
        .route("/api/practices/:id/count", post(handlers::add_count))
        .route("/api/daily", get(handlers::get_daily))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/notices", get(handlers::get_notices))
        .route("/api/login", post(handlers::login))
        .route("/api/register", post(handlers::register))
        .route("/api/logout", post(handlers::logout))
        .route("/api/admin/practices", post(handlers::add_practice))
        .route("/api/admin/practices/:id", delete(handlers::delete_practice))
        .with_state(state)
}
