//! Request body format detection for `POST /login`.

/// How a login request body is encoded, which also picks the response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFormat {
    /// HTML form post: answered with redirects
    Form,
    /// JSON API call: answered with JSON bodies and status codes
    Json,
}

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Pick the request format from a `Content-Type` header value. A missing or
/// empty header counts as a form post; any other media type is treated as JSON.
pub fn negotiate(content_type: Option<&str>) -> RequestFormat {
    let media_type = content_type
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if media_type.is_empty() || media_type.eq_ignore_ascii_case(FORM_MEDIA_TYPE) {
        RequestFormat::Form
    } else {
        RequestFormat::Json
    }
}
