//! REST-style endpoint: `GET /<namespace>/forum-sitemap`.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::application::{
    error::{ErrorReport, HttpError},
    sitemap::{SitemapError, SitemapRequest},
    xml::render_coded_error,
};

use super::{
    HttpState,
    response::{sitemap_response, wants_bypass, xml_error_response},
};

pub(super) const UNAVAILABLE_CODE: &str = "asgaros_not_loaded";

pub(super) async fn forum_sitemap(
    State(state): State<HttpState>,
    uri: Uri,
) -> Response {
    let request = SitemapRequest {
        bypass_cache: wants_bypass(&uri),
    };

    match state.sitemap.sitemap_xml(request).await {
        Ok(document) => {
            let mut response = sitemap_response(document.xml);
            response.extensions_mut().insert(document.outcome);
            response
        }
        Err(err @ SitemapError::Unavailable) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response =
                xml_error_response(status, render_coded_error(UNAVAILABLE_CODE, &err.to_string()));
            ErrorReport::from_error("infra::http::endpoint::forum_sitemap", status, &err)
                .attach(&mut response);
            response
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}
