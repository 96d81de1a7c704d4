use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tracing::{info, instrument};

use crate::dto::movie_dto::{CreateMovieRequest, MovieResponse, UpdateMovieRequest};
use crate::model::movie::{GenreCount, YearStats};
use crate::model::user::User;
use crate::repository::movie_repo::MovieRepository;
use crate::repository::query_builder::{QueryBuilder, MOVIE_FIELDS};
use crate::util::error::ServiceError;

#[async_trait]
pub trait MovieService: Send + Sync {
    /// `params` are the raw query-string pairs of the request.
    async fn list_movies(&self, params: Vec<(String, String)>) -> Result<Vec<MovieResponse>, ServiceError>;
    async fn get_movie(&self, id: &str) -> Result<MovieResponse, ServiceError>;
    async fn create_movie(&self, request: CreateMovieRequest, author: &User) -> Result<MovieResponse, ServiceError>;
    async fn update_movie(&self, id: &str, request: UpdateMovieRequest) -> Result<MovieResponse, ServiceError>;
    async fn delete_movie(&self, id: &str) -> Result<(), ServiceError>;
    async fn movie_stats(&self) -> Result<Vec<YearStats>, ServiceError>;
    async fn movies_by_genre(&self, genre: &str) -> Result<Vec<GenreCount>, ServiceError>;
}

pub struct MovieServiceImpl {
    pub movie_repo: Arc<dyn MovieRepository>,
}

impl MovieServiceImpl {
    pub fn new(movie_repo: Arc<dyn MovieRepository>) -> Self {
        Self { movie_repo }
    }
}

fn parse_movie_id(id: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(id).map_err(|_| ServiceError::Validation(format!("Invalid movie id: {}", id)))
}

#[async_trait]
impl MovieService for MovieServiceImpl {
    #[instrument(skip(self, params))]
    async fn list_movies(&self, params: Vec<(String, String)>) -> Result<Vec<MovieResponse>, ServiceError> {
        let query = QueryBuilder::new(MOVIE_FIELDS, params)
            .filter()?
            .sort()?
            .select_fields()?
            .paginate()
            .build();

        let movies = self.movie_repo.find(&query, Utc::now()).await?;
        Ok(movies.into_iter().map(MovieResponse::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_movie(&self, id: &str) -> Result<MovieResponse, ServiceError> {
        let id = parse_movie_id(id)?;
        let movie = self.movie_repo.get_by_id(id, Utc::now()).await?;
        Ok(movie.into())
    }

    #[instrument(skip(self, request, author), fields(name = %request.name, author = %author.name))]
    async fn create_movie(&self, request: CreateMovieRequest, author: &User) -> Result<MovieResponse, ServiceError> {
        let movie = request.into_movie(author.name.clone(), Utc::now());
        let created = self.movie_repo.create(movie).await?;
        info!(created_by = %author.name, "Movie added to catalog");
        Ok(created.into())
    }

    #[instrument(skip(self, request))]
    async fn update_movie(&self, id: &str, request: UpdateMovieRequest) -> Result<MovieResponse, ServiceError> {
        let id = parse_movie_id(id)?;
        let update = request
            .to_update_document()
            .ok_or_else(|| ServiceError::Validation("Please provide at least one field to update.".to_string()))?;
        let movie = self.movie_repo.update(id, update, Utc::now()).await?;
        Ok(movie.into())
    }

    #[instrument(skip(self))]
    async fn delete_movie(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_movie_id(id)?;
        self.movie_repo.delete(id, Utc::now()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn movie_stats(&self) -> Result<Vec<YearStats>, ServiceError> {
        Ok(self.movie_repo.stats_by_year(Utc::now()).await?)
    }

    #[instrument(skip(self))]
    async fn movies_by_genre(&self, genre: &str) -> Result<Vec<GenreCount>, ServiceError> {
        Ok(self.movie_repo.by_genre(genre, Utc::now()).await?)
    }
}
