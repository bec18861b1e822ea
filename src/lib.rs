pub mod config;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod templating;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::PgPool;

use crate::services::storage::LocalStorage;
use crate::templating::TemplateEngine;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Arc<LocalStorage>,
    pub templates: Arc<TemplateEngine>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::gallery::index))
        .route(
            "/upload",
            get(handlers::gallery::upload_form).post(handlers::files::upload),
        )
        .route("/search", get(handlers::gallery::search))
        .route("/image/:id", get(handlers::gallery::image_detail))
        .route(
            "/image/:id/comments/post",
            post(handlers::gallery::post_comment),
        )
        .route("/image/:id/metadata", get(handlers::files::image_metadata))
        .route("/img/:filename", get(handlers::files::raw_image))
        .with_state(state)
}
