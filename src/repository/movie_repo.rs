use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    options::{FindOneAndUpdateOptions, FindOneOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument};

use crate::model::movie::{GenreCount, Movie, MovieProjection, YearStats};
use crate::repository::query_builder::{default_projection, BuiltQuery};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Genres kept by the per-genre report before the requested genre is matched.
pub const TOP_GENRES: i64 = 6;
/// Minimum rating for a movie to count in the per-year report.
pub const STATS_MIN_RATING: f64 = 4.5;

/// Movies released at or before `now`. Documents without a release date never match.
pub fn released_filter(now: DateTime<Utc>) -> Document {
    doc! { "releaseDate": { "$lte": bson::DateTime::from_chrono(now) } }
}

/// AND the release cutoff into a caller filter.
pub fn with_released(filter: Document, now: DateTime<Utc>) -> Document {
    if filter.is_empty() {
        released_filter(now)
    } else {
        doc! { "$and": [filter, released_filter(now)] }
    }
}

pub fn stats_by_year_pipeline(now: DateTime<Utc>) -> Vec<Document> {
    vec![
        doc! { "$match": released_filter(now) },
        doc! { "$match": { "ratings": { "$gte": STATS_MIN_RATING } } },
        doc! {
            "$group": {
                "_id": "$releaseYear",
                "avgRating": { "$avg": "$ratings" },
                "avgPrice": { "$avg": "$price" },
                "minPrice": { "$min": "$price" },
                "maxPrice": { "$max": "$price" },
                "priceTotal": { "$sum": "$price" },
                "movieCount": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "minPrice": 1, "_id": 1 } },
    ]
}

/// Counts per genre, truncated to the top genres, then filtered to `genre`.
/// A genre outside the top entries yields no rows.
pub fn by_genre_pipeline(genre: &str, now: DateTime<Utc>) -> Vec<Document> {
    vec![
        doc! { "$match": released_filter(now) },
        doc! { "$unwind": "$genres" },
        doc! {
            "$group": {
                "_id": "$genres",
                "movieCount": { "$sum": 1 },
                "movies": { "$push": "$name" },
            }
        },
        doc! { "$addFields": { "genre": "$_id" } },
        doc! { "$project": { "_id": 0 } },
        doc! { "$sort": { "movieCount": -1, "genre": 1 } },
        doc! { "$limit": TOP_GENRES },
        doc! { "$match": { "genre": genre } },
    ]
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn create(&self, movie: Movie) -> RepositoryResult<Movie>;
    async fn find(&self, query: &BuiltQuery, now: DateTime<Utc>) -> RepositoryResult<Vec<MovieProjection>>;
    async fn get_by_id(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<Movie>;
    /// `update` is a full update document (`{"$set": {...}}`).
    async fn update(&self, id: ObjectId, update: Document, now: DateTime<Utc>) -> RepositoryResult<Movie>;
    async fn delete(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<()>;
    async fn stats_by_year(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<YearStats>>;
    async fn by_genre(&self, genre: &str, now: DateTime<Utc>) -> RepositoryResult<Vec<GenreCount>>;
    async fn ensure_indexes(&self) -> RepositoryResult<()>;
}

pub struct MongoMovieRepository {
    collection: Collection<Movie>,
}

impl MongoMovieRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        MongoMovieRepository {
            collection: db.collection::<Movie>(collection_name),
        }
    }

    fn by_id(id: ObjectId, now: DateTime<Utc>) -> Document {
        with_released(doc! { "_id": id }, now)
    }

    fn not_found(id: ObjectId) -> RepositoryError {
        RepositoryError::not_found(format!("Movie with id {} not found.", id))
    }

    fn duplicate_name(name: &str) -> String {
        format!("A movie named '{}' already exists.", name)
    }

    async fn aggregate_into<T: DeserializeOwned>(&self, pipeline: Vec<Document>) -> RepositoryResult<Vec<T>> {
        let cursor = self.collection.aggregate(pipeline, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|document| bson::from_document::<T>(document).map_err(RepositoryError::from))
            .collect()
    }
}

#[async_trait]
impl MovieRepository for MongoMovieRepository {
    #[instrument(skip(self, movie), fields(name = %movie.name))]
    async fn create(&self, mut movie: Movie) -> RepositoryResult<Movie> {
        info!("Creating new movie");
        movie.id = Some(ObjectId::new());

        match self.collection.insert_one(&movie, None).await {
            Ok(_) => {
                info!(created_by = ?movie.created_by, "Movie created successfully");
                Ok(movie)
            }
            Err(e) => {
                let err = RepositoryError::from(e).on_duplicate(Self::duplicate_name(&movie.name));
                error!("Failed to create movie: {}", err);
                Err(err)
            }
        }
    }

    #[instrument(skip(self, query), fields(page = query.page, limit = query.limit))]
    async fn find(&self, query: &BuiltQuery, now: DateTime<Utc>) -> RepositoryResult<Vec<MovieProjection>> {
        let filter = with_released(query.filter.clone(), now);
        let started = std::time::Instant::now();

        let cursor = self
            .collection
            .clone_with_type::<MovieProjection>()
            .find(filter, query.find_options())
            .await
            .map_err(|e| {
                error!("Failed to list movies: {}", e);
                RepositoryError::from(e)
            })?;
        let movies: Vec<MovieProjection> = cursor.try_collect().await.map_err(|e| {
            error!("Failed to read movie cursor: {}", e);
            RepositoryError::from(e)
        })?;

        info!(count = movies.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Fetched movies");
        Ok(movies)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<Movie> {
        let options = FindOneOptions::builder().projection(default_projection()).build();
        match self.collection.find_one(Self::by_id(id, now), options).await {
            Ok(Some(movie)) => Ok(movie),
            Ok(None) => {
                info!("Movie not found");
                Err(Self::not_found(id))
            }
            Err(e) => {
                error!("Failed to fetch movie by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[instrument(skip(self, update), fields(id = %id))]
    async fn update(&self, id: ObjectId, update: Document, now: DateTime<Utc>) -> RepositoryResult<Movie> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .projection(default_projection())
            .build();

        match self.collection.find_one_and_update(Self::by_id(id, now), update, options).await {
            Ok(Some(movie)) => {
                info!("Movie updated successfully");
                Ok(movie)
            }
            Ok(None) => {
                info!("No movie found to update");
                Err(Self::not_found(id))
            }
            Err(e) => {
                let err = RepositoryError::from(e).on_duplicate("A movie with this name already exists.");
                error!("Failed to update movie: {}", err);
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId, now: DateTime<Utc>) -> RepositoryResult<()> {
        match self.collection.find_one_and_delete(Self::by_id(id, now), None).await {
            Ok(Some(_)) => {
                info!("Movie deleted successfully");
                Ok(())
            }
            Ok(None) => {
                info!("No movie found to delete");
                Err(Self::not_found(id))
            }
            Err(e) => {
                error!("Failed to delete movie: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[instrument(skip(self))]
    async fn stats_by_year(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<YearStats>> {
        let stats = self.aggregate_into::<YearStats>(stats_by_year_pipeline(now)).await.map_err(|e| {
            error!("Failed to aggregate movie stats: {}", e);
            e
        })?;
        info!(count = stats.len(), "Aggregated movie stats");
        Ok(stats)
    }

    #[instrument(skip(self))]
    async fn by_genre(&self, genre: &str, now: DateTime<Utc>) -> RepositoryResult<Vec<GenreCount>> {
        let rows = self.aggregate_into::<GenreCount>(by_genre_pipeline(genre, now)).await.map_err(|e| {
            error!("Failed to aggregate movies by genre: {}", e);
            e
        })?;
        info!(count = rows.len(), "Aggregated movies by genre");
        Ok(rows)
    }

    async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index, None).await?;
        info!("Movie indexes ensured");
        Ok(())
    }
}
