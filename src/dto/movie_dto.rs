use std::borrow::Cow;

use bson::{doc, Bson, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::model::movie::{Movie, MovieProjection};

const MOVIE_NAME_MIN: usize = 4;
const MOVIE_NAME_MAX: usize = 100;

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Names are measured after trimming.
pub fn validate_movie_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length < MOVIE_NAME_MIN {
        return Err(validation_error("name_length", "Movie name must not have less than 4 characters"));
    }
    if length > MOVIE_NAME_MAX {
        return Err(validation_error("name_length", "Movie name must not have more than 100 characters"));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("blank", "This field is required."));
    }
    Ok(())
}

pub fn validate_string_list(values: &[String]) -> Result<(), ValidationError> {
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        return Err(validation_error("list", "Must be a non-empty list of names."));
    }
    Ok(())
}

fn trimmed(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_string()).collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    #[validate(custom(function = "validate_movie_name"))]
    pub name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "Duration must be a positive number of minutes"))]
    pub duration: f64,
    #[validate(range(min = 1.0, max = 10.0, message = "Rating must be between 1 and 10"))]
    pub ratings: Option<f64>,
    #[validate(range(min = 0.0))]
    pub total_rating: Option<f64>,
    pub release_year: i32,
    pub release_date: DateTime<Utc>,
    #[validate(custom(function = "validate_string_list"))]
    pub genres: Vec<String>,
    #[validate(custom(function = "validate_string_list"))]
    pub directors: Vec<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub cover_image: String,
    #[validate(custom(function = "validate_string_list"))]
    pub actors: Vec<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
}

impl CreateMovieRequest {
    /// Builds the stored document; `created_by` and `created_at` are always server-side.
    pub fn into_movie(self, created_by: String, now: DateTime<Utc>) -> Movie {
        Movie {
            id: None,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            duration: self.duration,
            ratings: self.ratings,
            total_rating: self.total_rating,
            release_year: self.release_year,
            release_date: Some(bson::DateTime::from_chrono(self.release_date)),
            created_at: Some(bson::DateTime::from_chrono(now)),
            genres: trimmed(&self.genres),
            directors: trimmed(&self.directors),
            cover_image: self.cover_image.trim().to_string(),
            actors: trimmed(&self.actors),
            price: self.price,
            created_by: Some(created_by),
        }
    }
}

/// Partial update; every supplied field is validated with the same rules as create.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    #[validate(custom(function = "validate_movie_name"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Duration must be a positive number of minutes"))]
    pub duration: Option<f64>,
    #[validate(range(min = 1.0, max = 10.0, message = "Rating must be between 1 and 10"))]
    pub ratings: Option<f64>,
    #[validate(range(min = 0.0))]
    pub total_rating: Option<f64>,
    pub release_year: Option<i32>,
    pub release_date: Option<DateTime<Utc>>,
    #[validate(custom(function = "validate_string_list"))]
    pub genres: Option<Vec<String>>,
    #[validate(custom(function = "validate_string_list"))]
    pub directors: Option<Vec<String>>,
    #[validate(custom(function = "validate_not_blank"))]
    pub cover_image: Option<String>,
    #[validate(custom(function = "validate_string_list"))]
    pub actors: Option<Vec<String>>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
}

impl UpdateMovieRequest {
    /// The `$set` body for the supplied fields; `None` when nothing was supplied.
    pub fn to_update_document(&self) -> Option<Document> {
        let mut set = Document::new();
        if let Some(ref name) = self.name {
            set.insert("name", name.trim());
        }
        if let Some(ref description) = self.description {
            set.insert("description", description.trim());
        }
        if let Some(duration) = self.duration {
            set.insert("duration", duration);
        }
        if let Some(ratings) = self.ratings {
            set.insert("ratings", ratings);
        }
        if let Some(total_rating) = self.total_rating {
            set.insert("totalRating", total_rating);
        }
        if let Some(release_year) = self.release_year {
            set.insert("releaseYear", release_year);
        }
        if let Some(release_date) = self.release_date {
            set.insert("releaseDate", Bson::DateTime(bson::DateTime::from_chrono(release_date)));
        }
        if let Some(ref genres) = self.genres {
            set.insert("genres", trimmed(genres));
        }
        if let Some(ref directors) = self.directors {
            set.insert("directors", trimmed(directors));
        }
        if let Some(ref cover_image) = self.cover_image {
            set.insert("coverImage", cover_image.trim());
        }
        if let Some(ref actors) = self.actors {
            set.insert("actors", trimmed(actors));
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }

        if set.is_empty() {
            None
        } else {
            Some(doc! { "$set": set })
        }
    }
}

/// Client view of a movie. Absent fields were projected away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl From<MovieProjection> for MovieResponse {
    fn from(movie: MovieProjection) -> Self {
        MovieResponse {
            id: movie.id.map(|id| id.to_hex()),
            duration_hours: movie.duration.map(|minutes| minutes / 60.0),
            name: movie.name,
            description: movie.description,
            duration: movie.duration,
            ratings: movie.ratings,
            total_rating: movie.total_rating,
            release_year: movie.release_year,
            release_date: movie
                .release_date
                .map(|date| date.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)),
            genres: movie.genres,
            directors: movie.directors,
            cover_image: movie.cover_image,
            actors: movie.actors,
            price: movie.price,
            created_by: movie.created_by,
        }
    }
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        MovieProjection::from(movie).into()
    }
}
