use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::dto::movie_dto::{CreateMovieRequest, UpdateMovieRequest};
use crate::middlewares::auth_middleware::CurrentUser;
use crate::service::movie_service::MovieService;
use crate::util::error::HandlerError;
use crate::util::query_params::QueryParams;
use crate::util::validated_json::ValidatedJson;

pub const HIGHEST_RATED_LIMIT: &str = "5";
pub const HIGHEST_RATED_SORT: &str = "-ratings";

/// Replaces any client `limit`/`sort` with the top-rated preset.
pub fn highest_rated_params(mut params: Vec<(String, String)>) -> Vec<(String, String)> {
    params.retain(|(key, _)| key != "limit" && key != "sort");
    params.push(("limit".to_string(), HIGHEST_RATED_LIMIT.to_string()));
    params.push(("sort".to_string(), HIGHEST_RATED_SORT.to_string()));
    params
}

pub async fn list_movies_handler(
    State(service): State<Arc<dyn MovieService>>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
) -> Result<impl IntoResponse, HandlerError> {
    let movies = service.list_movies(params).await?;
    Ok(Json(json!({
        "status": "success",
        "length": movies.len(),
        "data": { "movies": movies },
    })))
}

pub async fn highest_rated_handler(
    State(service): State<Arc<dyn MovieService>>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
) -> Result<impl IntoResponse, HandlerError> {
    let movies = service.list_movies(highest_rated_params(params)).await?;
    Ok(Json(json!({
        "status": "success",
        "length": movies.len(),
        "data": { "movies": movies },
    })))
}

pub async fn get_movie_handler(
    State(service): State<Arc<dyn MovieService>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let movie = service.get_movie(&id).await?;
    Ok(Json(json!({ "status": "success", "data": { "movie": movie } })))
}

pub async fn create_movie_handler(
    State(service): State<Arc<dyn MovieService>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let movie = service.create_movie(payload, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "movie": movie } })),
    ))
}

pub async fn update_movie_handler(
    State(service): State<Arc<dyn MovieService>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateMovieRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let movie = service.update_movie(&id, payload).await?;
    Ok(Json(json!({ "status": "success", "data": { "movie": movie } })))
}

pub async fn delete_movie_handler(
    State(service): State<Arc<dyn MovieService>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    service.delete_movie(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn movie_stats_handler(
    State(service): State<Arc<dyn MovieService>>,
) -> Result<impl IntoResponse, HandlerError> {
    let stats = service.movie_stats().await?;
    Ok(Json(json!({
        "status": "success",
        "count": stats.len(),
        "data": { "stats": stats },
    })))
}

pub async fn movies_by_genre_handler(
    State(service): State<Arc<dyn MovieService>>,
    Path(genre): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let movies = service.movies_by_genre(&genre).await?;
    Ok(Json(json!({
        "status": "success",
        "count": movies.len(),
        "data": { "movies": movies },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_rated_overrides_client_paging() {
        let params = vec![
            ("limit".to_string(), "50".to_string()),
            ("sort".to_string(), "name".to_string()),
            ("genres".to_string(), "Drama".to_string()),
        ];
        let params = highest_rated_params(params);
        assert_eq!(
            params,
            vec![
                ("genres".to_string(), "Drama".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("sort".to_string(), "-ratings".to_string()),
            ]
        );
    }
}
