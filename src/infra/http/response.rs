use axum::{
    body::Body,
    http::{HeaderName, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=UTF-8";

const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");

/// Successful sitemap answer, identical for every transport.
pub fn sitemap_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, XML_CONTENT_TYPE)
        .header(X_ROBOTS_TAG, "noindex")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub fn xml_error_response(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, XML_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// `1`, `true`, `yes` and `on`, ignoring case and surrounding whitespace.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    ["1", "true", "yes", "on"]
        .iter()
        .any(|candidate| value.eq_ignore_ascii_case(candidate))
}

/// First value of `name` in the query string; repeated keys are tolerated.
pub fn query_value(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Whether the request asks to skip the cached document.
pub fn wants_bypass(uri: &Uri) -> bool {
    query_value(uri, "nocache").is_some_and(|value| is_truthy(&value))
}
