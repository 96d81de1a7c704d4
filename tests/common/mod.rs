#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use cineflix_backend::app::app::{build_router, AppState};
use cineflix_backend::config::{JwtConfig, PasswordResetConfig};
use cineflix_backend::model::movie::{GenreCount, Movie, MovieProjection, YearStats};
use cineflix_backend::model::user::{normalize_email, Role, User};
use cineflix_backend::repository::movie_repo::{MovieRepository, STATS_MIN_RATING, TOP_GENRES};
use cineflix_backend::repository::query_builder::BuiltQuery;
use cineflix_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use cineflix_backend::repository::user_repo::UserRepository;
use cineflix_backend::util::email::{EmailError, EmailMessage, EmailService};
use cineflix_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn stored(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.users.lock().unwrap().iter().find(|u| u.email == email).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists("A user with this email already exists."));
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str, include_password: bool) -> RepositoryResult<Option<User>> {
        Ok(self.stored(email).map(|mut user| {
            if !include_password {
                user.password = None;
            }
            user
        }))
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned().map(|mut user| {
            user.password = None;
            user
        }))
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> RepositoryResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token_hash)
                    && u.password_reset_token_expire_date
                        .map(|expires| expires.to_chrono() > now)
                        .unwrap_or(false)
            })
            .cloned())
    }

    async fn save(&self, user: &User, validate: bool) -> RepositoryResult<()> {
        if validate {
            user.validate_fields().map_err(RepositoryError::validation)?;
        }
        let mut users = self.users.lock().unwrap();
        let existing = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| RepositoryError::not_found("User not found"))?;
        let stored_password = existing.password.clone();
        *existing = user.clone();
        // Records loaded without the hash must not wipe it
        if existing.password.is_none() {
            existing.password = stored_password;
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

/// Keeps movies in memory and remembers the last query it was asked to run.
///
/// Filters are recorded, not applied; the release cutoff and both reports are.
#[derive(Default, Clone)]
pub struct InMemoryMovieRepository {
    pub movies: Arc<Mutex<Vec<Movie>>>,
    pub last_query: Arc<Mutex<Option<BuiltQuery>>>,
}

impl InMemoryMovieRepository {
    fn not_found(id: ObjectId) -> RepositoryError {
        RepositoryError::not_found(format!("Movie with id {} not found.", id))
    }
}

fn is_released(movie: &Movie, now: DateTime<Utc>) -> bool {
    movie.release_date.map(|date| date.to_chrono() <= now).unwrap_or(false)
}

#[async_trait]
impl MovieRepository for InMemoryMovieRepository {
    async fn create(&self, mut movie: Movie) -> RepositoryResult<Movie> {
        movie.id = Some(ObjectId::new());
        self.movies.lock().unwrap().push(movie.clone());
        Ok(movie)
    }

    async fn find(&self, query: &BuiltQuery, now: DateTime<Utc>) -> RepositoryResult<Vec<MovieProjection>> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        let movies = self.movies.lock().unwrap();
        Ok(movies
            .iter()
            .filter(|m| is_released(m, now))
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .map(MovieProjection::from)
            .collect())
    }

    async fn get_by_id(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<Movie> {
        let movies = self.movies.lock().unwrap();
        movies
            .iter()
            .find(|m| m.id == Some(id) && is_released(m, now))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update(&self, id: ObjectId, update: Document, now: DateTime<Utc>) -> RepositoryResult<Movie> {
        let mut movies = self.movies.lock().unwrap();
        let movie = movies
            .iter_mut()
            .find(|m| m.id == Some(id) && is_released(m, now))
            .ok_or_else(|| Self::not_found(id))?;
        let set = update.get_document("$set").cloned().unwrap_or_default();
        let mut stored = bson::to_document(&*movie)?;
        for (key, value) in set {
            stored.insert(key, value);
        }
        *movie = bson::from_document(stored)?;
        Ok(movie.clone())
    }

    async fn delete(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<()> {
        let mut movies = self.movies.lock().unwrap();
        let before = movies.len();
        movies.retain(|m| m.id != Some(id) || !is_released(m, now));
        if movies.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn stats_by_year(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<YearStats>> {
        let movies = self.movies.lock().unwrap();
        let mut groups: BTreeMap<i32, Vec<&Movie>> = BTreeMap::new();
        for movie in movies.iter().filter(|m| is_released(m, now)) {
            if movie.ratings.unwrap_or(0.0) >= STATS_MIN_RATING {
                groups.entry(movie.release_year).or_default().push(movie);
            }
        }

        let mut stats: Vec<YearStats> = groups
            .into_iter()
            .map(|(year, group)| {
                let count = group.len() as f64;
                let prices: Vec<f64> = group.iter().map(|m| m.price).collect();
                let rating_total: f64 = group.iter().filter_map(|m| m.ratings).sum();
                let price_total: f64 = prices.iter().sum();
                YearStats {
                    release_year: Some(year),
                    avg_rating: Some(rating_total / count),
                    avg_price: Some(price_total / count),
                    min_price: prices.iter().copied().reduce(f64::min),
                    max_price: prices.iter().copied().reduce(f64::max),
                    price_total,
                    movie_count: group.len() as i64,
                }
            })
            .collect();
        stats.sort_by(|a, b| {
            a.min_price
                .partial_cmp(&b.min_price)
                .unwrap_or(Ordering::Equal)
                .then(a.release_year.cmp(&b.release_year))
        });
        Ok(stats)
    }

    async fn by_genre(&self, genre: &str, now: DateTime<Utc>) -> RepositoryResult<Vec<GenreCount>> {
        let movies = self.movies.lock().unwrap();
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for movie in movies.iter().filter(|m| is_released(m, now)) {
            for g in &movie.genres {
                groups.entry(g.clone()).or_default().push(movie.name.clone());
            }
        }

        let mut rows: Vec<GenreCount> = groups
            .into_iter()
            .map(|(genre, movies)| GenreCount {
                genre,
                movie_count: movies.len() as i64,
                movies,
            })
            .collect();
        rows.sort_by(|a, b| b.movie_count.cmp(&a.movie_count).then_with(|| a.genre.cmp(&b.genre)));
        rows.truncate(TOP_GENRES as usize);
        rows.retain(|row| row.genre == genre);
        Ok(rows)
    }

    async fn ensure_indexes(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<EmailMessage>>>,
}

#[async_trait]
impl EmailService for RecordingMailer {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl EmailService for FailingMailer {
    async fn send_email(&self, _message: EmailMessage) -> Result<(), EmailError> {
        Err(EmailError::SmtpError("connection refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: InMemoryUserRepository,
    pub movies: InMemoryMovieRepository,
    pub jwt: Arc<JwtTokenUtilsImpl>,
}

pub fn test_app_with_mailer(mailer: Arc<dyn EmailService>) -> TestApp {
    let users = InMemoryUserRepository::default();
    let movies = InMemoryMovieRepository::default();
    let jwt = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
    let state = AppState::new(
        Arc::new(users.clone()),
        Arc::new(movies.clone()),
        jwt.clone(),
        mailer,
        PasswordResetConfig::from_test_env(),
    );
    TestApp {
        router: build_router(state),
        users,
        movies,
        jwt,
    }
}

pub fn test_app() -> TestApp {
    test_app_with_mailer(Arc::new(RecordingMailer::default()))
}

impl TestApp {
    /// Inserts a user directly (with a throwaway hash) and returns a valid token for it.
    pub fn seed_user(&self, email: &str, role: Role) -> (User, String) {
        let mut user = User::new("Seeded User", email, "not-a-real-hash".to_string());
        user.role = role;
        user.id = Some(ObjectId::new());
        self.users.users.lock().unwrap().push(user.clone());
        let token = self.jwt.issue_token(&user.id_hex()).unwrap();
        (user, token)
    }

    /// Inserts a movie released a month ago.
    pub fn seed_movie(&self, name: &str) -> Movie {
        self.seed_movie_with(name, &["Drama"], 10.0, Utc::now() - Duration::days(30))
    }

    pub fn seed_upcoming_movie(&self, name: &str) -> Movie {
        self.seed_movie_with(name, &["Drama"], 10.0, Utc::now() + Duration::days(30))
    }

    pub fn seed_movie_with(&self, name: &str, genres: &[&str], price: f64, release: DateTime<Utc>) -> Movie {
        let movie: Movie = bson::from_document(doc! {
            "_id": ObjectId::new(),
            "name": name,
            "description": "A seeded movie",
            "duration": 120.0,
            "ratings": 4.8,
            "releaseYear": 2020,
            "releaseDate": bson::DateTime::from_chrono(release),
            "genres": genres.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            "directors": ["Someone"],
            "coverImage": "cover.jpg",
            "actors": ["Actor"],
            "price": price,
        })
        .unwrap();
        self.movies.movies.lock().unwrap().push(movie.clone());
        movie
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}
