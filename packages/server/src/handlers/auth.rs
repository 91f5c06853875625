use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::sea_query::{Expr, ExprTrait, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{achievement_cat, cat, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    DeleteAccountRequest, LoginRequest, RegisterRequest, TokenResponse, UserResponse,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

fn issue_token(
    state: &AppState,
    user_id: i32,
    username: &str,
    token_version: i32,
) -> Result<TokenResponse, AppError> {
    let auth_token = jwt::sign(
        user_id,
        username,
        token_version,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;
    Ok(TokenResponse { auth_token })
}

#[utoipa::path(
    post,
    path = "/users/",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new user",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();
    let email = payload
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password: Set(hash),
        token_version: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/token/login/",
    tag = "Auth",
    operation_id = "login",
    summary = "Obtain an auth token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong username or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    issue_token(&state, user.id, &user.username, user.token_version).map(Json)
}

#[utoipa::path(
    post,
    path = "/token/logout/",
    tag = "Auth",
    operation_id = "logout",
    summary = "Revoke the caller's tokens",
    description = "Every token issued to the caller before this call stops working.",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    user::Entity::update_many()
        .col_expr(
            user::Column::TokenVersion,
            Expr::col(user::Column::TokenVersion).add(1),
        )
        .filter(user::Column::Id.eq(auth_user.user_id))
        .exec(&state.db)
        .await?;

    tracing::info!("Tokens revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/token/refresh/",
    tag = "Auth",
    operation_id = "refreshToken",
    summary = "Exchange a valid token for a fresh one",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn refresh(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, AppError> {
    issue_token(
        &state,
        auth_user.user_id,
        &auth_user.username,
        auth_user.token_version,
    )
    .map(Json)
}

#[utoipa::path(
    get,
    path = "/users/me/",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/users/me/",
    tag = "Auth",
    operation_id = "deleteMe",
    summary = "Delete the current account",
    description = "Requires the current password. Deletes the user's cats along with the account.",
    request_body = DeleteAccountRequest,
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Wrong password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn delete_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let user = find_user(&txn, auth_user.user_id).await?;

    let is_valid = hash::verify_password(&payload.current_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::field("current_password", "Invalid password."));
    }

    achievement_cat::Entity::delete_many()
        .filter(
            achievement_cat::Column::CatId.in_subquery(
                SeaQuery::select()
                    .column(cat::Column::Id)
                    .from(cat::Entity)
                    .and_where(cat::Column::OwnerId.eq(user.id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    let cats = cat::Entity::delete_many()
        .filter(cat::Column::OwnerId.eq(user.id))
        .exec(&txn)
        .await?
        .rows_affected;
    user::Entity::delete_by_id(user.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(cats, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::TokenInvalid)
}
