//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use common::AppError;
use domain::{UserRole, BEARER_TOKEN_PREFIX};

use crate::state::AppState;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    /// Internal user id
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// JWT authentication middleware.
///
/// Validates the bearer token and injects the CurrentUser into the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.tokens.verify_token(token)?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: UserRole::from(claims.role),
    });

    Ok(next.run(request).await)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
