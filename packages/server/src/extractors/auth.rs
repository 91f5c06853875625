use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization` header.
///
/// Both `Bearer <token>` and `Token <token>` are accepted. The token must
/// verify against the configured secret, name a user that still exists and
/// carry that user's current token version.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub token_version: i32,
}

fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = token_from_header(auth_header).ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        // Tokens outlive deleted accounts and logouts otherwise.
        let user = user::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .filter(|u| u.token_version == claims.ver)
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            token_version: user.token_version,
        })
    }
}
