pub mod movie_handler;
pub mod user_handler;

use axum::http::Uri;

use crate::util::error::HandlerError;

pub async fn health() -> &'static str {
    "OK"
}

pub async fn not_found(uri: Uri) -> HandlerError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    HandlerError::not_found(format!("Can't find {} on the server", path))
}
