use axum::{extract::State, http::StatusCode, Extension};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::config::Config;
use crate::db::MoodStore;
use crate::dto::{normalize_email, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::models::user::{NewRefreshToken, NewUser, UserProfile};
use crate::AppState;

/// Sign a token pair and persist the refresh token hash, linked to the token it replaces.
async fn issue_token_pair(
    store: &dyn MoodStore,
    config: &Config,
    user_id: Uuid,
    email: &str,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user_id, email, config)?;
    store
        .store_refresh_token(NewRefreshToken {
            user_id,
            token_hash: hash_token(&tokens.refresh_token),
            expires_at: Utc::now() + Duration::seconds(config.jwt_refresh_ttl_secs),
            parent_token_id,
        })
        .await?;
    Ok(tokens)
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    body.validate()?;

    let email = normalize_email(&body.email);
    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash: hash_password(&body.password)?,
            name: body.name.trim().to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let tokens = issue_token_pair(state.store.as_ref(), &state.config, user.id, &user.email, None).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    body.validate()?;

    let user = state
        .store
        .find_user_by_email(&normalize_email(&body.email))
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized);
    }

    let tokens = issue_token_pair(state.store.as_ref(), &state.config, user.id, &user.email, None).await?;
    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let token_data = verify_token(&body.refresh_token, &state.config)?;
    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let stored = state
        .store
        .find_refresh_token(&hash_token(&body.refresh_token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    // A rotated token coming back means it leaked: end every session of the user.
    if stored.revoked {
        tracing::warn!(
            user_id = %stored.user_id,
            token_id = %stored.id,
            "Revoked refresh token presented, revoking all sessions"
        );
        state.store.revoke_user_refresh_tokens(stored.user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored.user_id != token_data.claims.sub || stored.expires_at <= Utc::now() {
        return Err(AppError::Unauthorized);
    }

    state.store.revoke_refresh_token(stored.id).await?;

    let tokens = issue_token_pair(
        state.store.as_ref(),
        &state.config,
        stored.user_id,
        &token_data.claims.email,
        Some(stored.id),
    )
    .await?;
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    state.store.revoke_user_refresh_tokens(auth_user.id).await?;
    tracing::info!(user_id = %auth_user.id, "User logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = state
        .store
        .find_user(auth_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}
