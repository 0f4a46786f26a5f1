//! HTTP transport: the REST-style endpoint, the well-known path and health.

mod endpoint;
mod middleware;
mod response;
mod virtual_path;

pub use response::XML_CONTENT_TYPE;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use sqlx::Error as SqlxError;

use crate::{
    application::{error::ErrorReport, sitemap::SitemapService},
    config::SitemapSettings,
    infra::db::MySqlRepositories,
};

use middleware::{log_responses, set_request_context};

/// Where the sitemap is served.
#[derive(Debug, Clone)]
pub struct SitemapRoutes {
    pub endpoint_path: String,
    pub virtual_path: String,
    pub query_var: String,
}

impl From<&SitemapSettings> for SitemapRoutes {
    fn from(settings: &SitemapSettings) -> Self {
        Self {
            endpoint_path: settings.endpoint_path(),
            virtual_path: settings.virtual_path.clone(),
            query_var: settings.query_var.clone(),
        }
    }
}

impl Default for SitemapRoutes {
    fn default() -> Self {
        Self::from(&SitemapSettings::default())
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub sitemap: Arc<SitemapService>,
    /// `None` when no database is configured.
    pub db: Option<Arc<MySqlRepositories>>,
    pub routes: Arc<SitemapRoutes>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route(&state.routes.endpoint_path, get(endpoint::forum_sitemap))
        .route("/_health/db", get(db_health))
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            virtual_path::serve_virtual_path,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = status.into_response();
            ErrorReport::from_message("infra::http::db_health", status, "database not configured")
                .attach(&mut response);
            response
        }
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
