use std::sync::Arc;

use axum::{
    handler::Handler,
    middleware,
    routing::get,
    Router,
};

use crate::handler::movie_handler::{
    create_movie_handler, delete_movie_handler, get_movie_handler, highest_rated_handler,
    list_movies_handler, movie_stats_handler, movies_by_genre_handler, update_movie_handler,
};
use crate::middlewares::auth_middleware::{require_login, restrict_to, AuthState, RoleGuard};
use crate::model::user::Role;
use crate::service::movie_service::MovieService;

pub fn movie_router(service: Arc<dyn MovieService>, auth_state: AuthState) -> Router {
    // Public reports
    let public = Router::new()
        .route("/api/v1/movies/highest-rated", get(highest_rated_handler))
        .route("/api/v1/movies/movie-stats", get(movie_stats_handler))
        .route("/api/v1/movies/movies-by-genre/{genre}", get(movies_by_genre_handler));

    // Deleting is admin only; the guard runs after require_login
    let admin_only = middleware::from_fn_with_state(RoleGuard::allow(&[Role::Admin]), restrict_to);

    let protected = Router::new()
        .route("/api/v1/movies", get(list_movies_handler).post(create_movie_handler))
        .route(
            "/api/v1/movies/{id}",
            get(get_movie_handler)
                .patch(update_movie_handler)
                .delete(delete_movie_handler.layer(admin_only)),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_login));

    public.merge(protected).with_state(service)
}
