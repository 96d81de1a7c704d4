use std::sync::Arc;

use axum::{
    routing::{patch, post},
    Router,
};

use crate::handler::user_handler::{
    forgot_password_handler, login_handler, reset_password_handler, signup_handler,
};
use crate::service::user_service::UserService;

pub fn user_router(service: Arc<dyn UserService>) -> Router {
    Router::new()
        .route("/api/v1/users/signup", post(signup_handler))
        .route("/api/v1/users/login", post(login_handler))
        .route("/api/v1/users/forgotPassword", post(forgot_password_handler))
        .route("/api/v1/users/resetPassword/{token}", patch(reset_password_handler))
        .with_state(service)
}
