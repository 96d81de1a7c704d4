use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Movie document as stored in the `movies` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    /// Minutes
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rating: Option<f64>,
    pub release_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub cover_image: String,
    pub actors: Vec<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// A movie read through a projection, so any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieProjection {
    #[serde(rename = "_id", default)]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub ratings: Option<f64>,
    #[serde(default)]
    pub total_rating: Option<f64>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub release_date: Option<DateTime>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub directors: Option<Vec<String>>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub actors: Option<Vec<String>>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl From<Movie> for MovieProjection {
    fn from(movie: Movie) -> Self {
        MovieProjection {
            id: movie.id,
            name: Some(movie.name),
            description: Some(movie.description),
            duration: Some(movie.duration),
            ratings: movie.ratings,
            total_rating: movie.total_rating,
            release_year: Some(movie.release_year),
            release_date: movie.release_date,
            genres: Some(movie.genres),
            directors: Some(movie.directors),
            cover_image: Some(movie.cover_image),
            actors: Some(movie.actors),
            price: Some(movie.price),
            created_by: movie.created_by,
        }
    }
}

/// One row of the per-release-year report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearStats {
    #[serde(rename(deserialize = "_id", serialize = "year"))]
    pub release_year: Option<i32>,
    pub avg_rating: Option<f64>,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub price_total: f64,
    pub movie_count: i64,
}

/// One row of the per-genre report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreCount {
    pub genre: String,
    pub movie_count: i64,
    pub movies: Vec<String>,
}
