pub mod movie_router;
pub mod user_router;
