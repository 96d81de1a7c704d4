use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use bson::oid::ObjectId;
use tracing::{debug, warn};

use crate::model::user::{Role, User};
use crate::repository::user_repo::UserRepository;
use crate::util::error::{HandlerError, ServiceError};
use crate::util::jwt::JwtTokenUtils;

pub const NOT_LOGGED_IN: &str = "You are not logged in.";
pub const USER_GONE: &str = "The user with this token does not exist.";
pub const PASSWORD_CHANGED: &str = "The password has changed since last login. Please login again.";
pub const NO_PERMISSION: &str = "You do not have permission to perform this action";

/// The authenticated user, available to handlers behind `require_login`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[derive(Clone)]
pub struct AuthState {
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub user_repo: Arc<dyn UserRepository>,
}

/// Bearer token → verified claims → live user → password freshness. Any failure is a 401.
pub async fn require_login(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HandlerError::unauthorized(NOT_LOGGED_IN))?;
    let token = auth
        .jwt_utils
        .extract_token_from_header(header)
        .map_err(|_| HandlerError::unauthorized(NOT_LOGGED_IN))?;

    let verified = auth
        .jwt_utils
        .verify_token(&token)
        .map_err(|e| HandlerError::from(ServiceError::from(e)))?;

    let user_id = ObjectId::parse_str(&verified.user_id).map_err(|_| {
        warn!("Token subject is not an ObjectId");
        HandlerError::unauthorized(USER_GONE)
    })?;
    let user = auth
        .user_repo
        .find_by_id(&user_id)
        .await
        .map_err(|e| HandlerError::from(ServiceError::from(e)))?
        .ok_or_else(|| HandlerError::unauthorized(USER_GONE))?;

    if user.has_password_changed_after(verified.issued_at) {
        warn!(user_id = %user_id, "Rejected token issued before password change");
        return Err(HandlerError::unauthorized(PASSWORD_CHANGED));
    }

    debug!(user_id = %user_id, "Request authenticated");
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Roles allowed through `restrict_to`.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Arc<[Role]>,
}

impl RoleGuard {
    pub fn allow(roles: &[Role]) -> Self {
        RoleGuard { allowed: roles.into() }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Must run after `require_login`; a missing user is treated as not logged in.
pub async fn restrict_to(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let role = req
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.role)
        .ok_or_else(|| HandlerError::unauthorized(NOT_LOGGED_IN))?;

    if !guard.permits(role) {
        warn!(role = %role, "Role not permitted");
        return Err(HandlerError::forbidden(NO_PERMISSION));
    }
    Ok(next.run(req).await)
}
