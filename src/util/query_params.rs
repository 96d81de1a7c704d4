//! Query-string extractor whose rejection uses the JSON error envelope.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::util::error::HandlerError;

/// Like `Query<T>`, but a malformed query string is a 400 `{status: "fail", message}`.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| HandlerError::bad_request(e.body_text()))?;
        Ok(QueryParams(value))
    }
}
