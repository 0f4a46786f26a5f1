//! Well-known path adapter.
//!
//! `GET /forum-sitemap.xml` is rewritten to the internal flag
//! `?<query_var>=1`; any request carrying that flag is answered here and
//! never reaches the router.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::{
    error::{ErrorReport, HttpError},
    sitemap::{SitemapError, SitemapRequest},
    xml::render_error,
};

use super::{
    HttpState, SitemapRoutes,
    response::{query_value, sitemap_response, wants_bypass, xml_error_response},
};

pub(super) async fn serve_virtual_path(
    State(state): State<HttpState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD)
        || !wants_sitemap(&state.routes, request.uri())
    {
        return next.run(request).await;
    }

    let bypass_cache = wants_bypass(request.uri());

    match state
        .sitemap
        .sitemap_xml(SitemapRequest { bypass_cache })
        .await
    {
        Ok(document) => {
            let mut response = sitemap_response(document.xml);
            response.extensions_mut().insert(document.outcome);
            response
        }
        Err(err @ SitemapError::Unavailable) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response = xml_error_response(status, render_error(&err.to_string()));
            ErrorReport::from_error("infra::http::virtual_path", status, &err)
                .attach(&mut response);
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

/// The rewrite rule plus the flag check.
fn wants_sitemap(routes: &SitemapRoutes, uri: &Uri) -> bool {
    if uri.path() == routes.virtual_path {
        return true;
    }
    query_value(uri, &routes.query_var).is_some_and(|value| flag_is_set(&value))
}

/// Any non-empty value other than `0` sets the flag.
fn flag_is_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0"
}
