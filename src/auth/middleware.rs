//! Bearer-token guard for the `/api` routes.
//!
//! Handlers never look at tokens. They take `Extension<AuthUser>` and pass
//! `AuthUser::id` into every store call, which is what keeps one user's
//! records, stats and assessments invisible to another.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::{verify_token, Claims, TokenType};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// The signed-in user for one request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the request's user. Refresh tokens are not accepted here.
pub fn authenticate(headers: &HeaderMap, config: &Config) -> AppResult<AuthUser> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(token, config)?.claims;
    match claims.token_type {
        TokenType::Access => Ok(claims.into()),
        TokenType::Refresh => Err(AppError::Unauthorized),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(req.headers(), &state.config)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
