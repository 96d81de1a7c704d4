mod common;

use axum::http::StatusCode;
use bson::doc;
use chrono::{Duration, Utc};
use serde_json::json;

use cineflix_backend::middlewares::auth_middleware::{NOT_LOGGED_IN, NO_PERMISSION};
use cineflix_backend::model::user::Role;

use common::{empty_request, json_request, test_app};

fn new_movie_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": "A thief who steals corporate secrets.",
        "duration": 148,
        "ratings": 4.8,
        "releaseYear": 2010,
        "releaseDate": "2010-07-16T00:00:00Z",
        "genres": ["Action", "Sci-Fi"],
        "directors": ["Christopher Nolan"],
        "coverImage": "inception.jpg",
        "actors": ["Leonardo DiCaprio"],
        "price": 12.5,
    })
}

#[tokio::test]
async fn test_list_requires_login() {
    let app = test_app();

    let (status, body) = app.send(empty_request("GET", "/api/v1/movies", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], NOT_LOGGED_IN);

    let (status, _) = app
        .send(empty_request("GET", "/api/v1/movies", Some("garbage.token.value")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected() {
    let app = test_app();
    let (_, token) = app.seed_user("gone@example.com", Role::User);
    app.users.users.lock().unwrap().clear();

    let (status, _) = app.send(empty_request("GET", "/api/v1/movies", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_movies_passes_query_to_repository() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);
    app.seed_movie("Inception");

    let (status, body) = app
        .send(empty_request(
            "GET",
            "/api/v1/movies?price%5Bgte%5D=10&sort=-ratings,name&page=2&limit=5",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["length"], 0);

    let query = app.movies.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.filter, doc! { "price": { "$gte": 10.0 } });
    assert_eq!(query.sort, doc! { "ratings": -1, "name": 1 });
    assert_eq!(query.skip, 5);
    assert_eq!(query.limit, 5);
}

#[tokio::test]
async fn test_list_movies_rejects_unknown_field() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);

    let (status, body) = app
        .send(empty_request("GET", "/api/v1/movies?budget%5Bgte%5D=5", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_highest_rated_forces_limit_and_sort() {
    let app = test_app();
    for name in ["Alpha Movie", "Bravo Movie", "Charlie Movie"] {
        app.seed_movie(name);
    }

    let (status, body) = app
        .send(empty_request("GET", "/api/v1/movies/highest-rated?limit=100&sort=name", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["length"], 3);

    let query = app.movies.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.limit, 5);
    assert_eq!(query.sort, doc! { "ratings": -1 });
}

#[tokio::test]
async fn test_create_movie_records_author() {
    let app = test_app();
    let (user, token) = app.seed_user("author@example.com", Role::User);

    let (status, body) = app
        .send(json_request("POST", "/api/v1/movies", new_movie_body("Inception"), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["movie"]["name"], "Inception");
    assert_eq!(body["data"]["movie"]["createdBy"], user.name.as_str());
}

#[tokio::test]
async fn test_create_movie_validates_body() {
    let app = test_app();
    let (_, token) = app.seed_user("author@example.com", Role::User);

    let (status, _) = app
        .send(json_request("POST", "/api/v1/movies", new_movie_body("abc"), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.movies.movies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_and_update_movie() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);
    let movie = app.seed_movie("Inception");
    let uri = format!("/api/v1/movies/{}", movie.id.unwrap().to_hex());

    let (status, body) = app.send(empty_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["movie"]["name"], "Inception");

    let (status, body) = app
        .send(json_request("PATCH", &uri, json!({ "price": 20.0 }), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["movie"]["price"], 20.0);

    let (status, _) = app.send(json_request("PATCH", &uri, json!({}), Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_movie_bad_and_missing_ids() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);

    let (status, _) = app
        .send(empty_request("GET", "/api/v1/movies/not-an-id", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(empty_request("GET", "/api/v1/movies/64b7f0c2a1b2c3d4e5f60718", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_delete_requires_admin() {
    let app = test_app();
    let movie = app.seed_movie("Inception");
    let uri = format!("/api/v1/movies/{}", movie.id.unwrap().to_hex());

    let (_, user_token) = app.seed_user("user@example.com", Role::User);
    let (status, body) = app.send(empty_request("DELETE", &uri, Some(&user_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], NO_PERMISSION);
    assert_eq!(app.movies.movies.lock().unwrap().len(), 1);

    let (status, _) = app.send(empty_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, admin_token) = app.seed_user("admin@example.com", Role::Admin);
    let (status, body) = app.send(empty_request("DELETE", &uri, Some(&admin_token))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(app.movies.movies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reports_are_public_and_skip_unreleased_movies() {
    let app = test_app();
    let last_month = Utc::now() - Duration::days(30);
    app.seed_movie_with("Cheap Movie", &["Drama"], 8.0, last_month);
    app.seed_movie_with("Pricey Movie", &["Drama", "Comedy"], 14.0, last_month);
    app.seed_upcoming_movie("Upcoming Movie");

    let (status, body) = app.send(empty_request("GET", "/api/v1/movies/movie-stats", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let stats = &body["data"]["stats"][0];
    assert_eq!(stats["year"], 2020);
    assert_eq!(stats["movieCount"], 2);
    assert_eq!(stats["minPrice"], 8.0);
    assert_eq!(stats["maxPrice"], 14.0);
    assert_eq!(stats["priceTotal"], 22.0);

    let (status, body) = app
        .send(empty_request("GET", "/api/v1/movies/movies-by-genre/Drama", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"]["movies"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["genre"], "Drama");
    assert_eq!(rows[0]["movieCount"], 2);
    assert_eq!(rows[0]["movies"], json!(["Cheap Movie", "Pricey Movie"]));
}

#[tokio::test]
async fn test_genre_outside_top_six_is_empty() {
    let app = test_app();
    let popular = ["Action", "Comedy", "Drama", "Fantasy", "Romance", "Thriller"];
    let mut with_horror = popular.to_vec();
    with_horror.push("Horror");
    let released = Utc::now() - Duration::days(10);
    app.seed_movie_with("First Movie", &popular, 10.0, released);
    app.seed_movie_with("Second Movie", &with_horror, 12.0, released);

    let (status, body) = app
        .send(empty_request("GET", "/api/v1/movies/movies-by-genre/Horror", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["movies"], json!([]));
}

#[tokio::test]
async fn test_unreleased_movie_is_hidden() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);
    app.seed_movie("Released Movie");
    let upcoming = app.seed_upcoming_movie("Upcoming Movie");

    let (status, body) = app.send(empty_request("GET", "/api/v1/movies", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["length"], 1);
    assert_eq!(body["data"]["movies"][0]["name"], "Released Movie");

    let uri = format!("/api/v1/movies/{}", upcoming.id.unwrap().to_hex());
    let (status, _) = app.send(empty_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_huge_page_is_not_a_server_error() {
    let app = test_app();
    let (_, token) = app.seed_user("viewer@example.com", Role::User);
    app.seed_movie("Inception");

    let (status, body) = app
        .send(empty_request(
            "GET",
            "/api/v1/movies?page=9223372036854775807&limit=10",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["length"], 0);
    assert_eq!(app.movies.last_query.lock().unwrap().clone().unwrap().skip, i64::MAX as u64);
}

#[tokio::test]
async fn test_unknown_route_and_health() {
    let app = test_app();

    let (status, body) = app.send(empty_request("GET", "/api/v1/nothing?x=1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Can't find /api/v1/nothing?x=1 on the server");

    let (status, body) = app.send(empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
