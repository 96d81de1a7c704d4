use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::dto::user_dto::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest};
use crate::service::user_service::{UserService, RESET_LINK_SENT};
use crate::util::error::HandlerError;
use crate::util::validated_json::ValidatedJson;

pub const MISSING_CREDENTIALS: &str = "Please provide an email and password.";

pub async fn signup_handler(
    State(service): State<Arc<dyn UserService>>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = service.signup(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "token": session.token,
            "data": { "user": session.user },
        })),
    ))
}

pub async fn login_handler(
    State(service): State<Arc<dyn UserService>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let (email, password) = payload
        .credentials()
        .ok_or_else(|| HandlerError::bad_request(MISSING_CREDENTIALS))?;
    let token = service.login(email, password).await?;
    Ok(Json(json!({ "status": "success", "token": token })))
}

pub async fn forgot_password_handler(
    State(service): State<Arc<dyn UserService>>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    info!(host = %host, "Password reset requested");
    service.forgot_password(&payload.email, host).await?;
    Ok(Json(json!({ "status": "success", "message": RESET_LINK_SENT })))
}

pub async fn reset_password_handler(
    State(service): State<Arc<dyn UserService>>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let token = service.reset_password(&token, payload.password).await?;
    Ok(Json(json!({ "status": "success", "token": token })))
}
