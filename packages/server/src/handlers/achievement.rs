use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{achievement, achievement_cat};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::achievement::*;
use crate::state::AppState;

fn duplicate_name(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("An achievement with this name already exists".into())
        }
        _ => AppError::from(e),
    }
}

#[utoipa::path(
    get,
    path = "/achievements/",
    tag = "Achievements",
    operation_id = "listAchievements",
    summary = "List achievements",
    description = "Returns every achievement ordered by id. Not paginated.",
    responses(
        (status = 200, description = "All achievements", body = Vec<AchievementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_achievements(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AchievementResponse>>, AppError> {
    let items = achievement::Entity::find()
        .order_by_asc(achievement::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AchievementResponse::from)
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/achievements/",
    tag = "Achievements",
    operation_id = "createAchievement",
    summary = "Create an achievement",
    request_body = AchievementRequest,
    responses(
        (status = 201, description = "Achievement created", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AchievementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = validate_achievement_name(&payload.achievement_name)?;

    let model = achievement::ActiveModel {
        name: Set(name),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(duplicate_name)?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/achievements/{id}/",
    tag = "Achievements",
    operation_id = "getAchievement",
    summary = "Get an achievement",
    params(("id" = i32, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Achievement", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_achievement(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AchievementResponse>, AppError> {
    let model = find_achievement(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/achievements/{id}/",
    tag = "Achievements",
    operation_id = "updateAchievement",
    summary = "Rename an achievement",
    params(("id" = i32, Path, description = "Achievement ID")),
    request_body = AchievementRequest,
    responses(
        (status = 200, description = "Achievement updated", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AchievementRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    rename(&state.db, id, Some(payload.achievement_name)).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/achievements/{id}/",
    tag = "Achievements",
    operation_id = "partialUpdateAchievement",
    summary = "Partially update an achievement",
    params(("id" = i32, Path, description = "Achievement ID")),
    request_body = UpdateAchievementRequest,
    responses(
        (status = 200, description = "Achievement updated", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn partial_update_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAchievementRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    rename(&state.db, id, payload.achievement_name).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/achievements/{id}/",
    tag = "Achievements",
    operation_id = "deleteAchievement",
    summary = "Delete an achievement",
    description = "Deletes the achievement and removes it from every cat that held it.",
    params(("id" = i32, Path, description = "Achievement ID")),
    responses(
        (status = 204, description = "Achievement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Achievement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    find_achievement(&txn, id).await?;

    let unlinked = achievement_cat::Entity::delete_many()
        .filter(achievement_cat::Column::AchievementId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    achievement::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(unlinked, "Achievement deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn rename(
    db: &DatabaseConnection,
    id: i32,
    name: Option<String>,
) -> Result<AchievementResponse, AppError> {
    let existing = find_achievement(db, id).await?;

    let Some(name) = name else {
        return Ok(existing.into());
    };
    let name = validate_achievement_name(&name)?;
    if name == existing.name {
        return Ok(existing.into());
    }

    let mut active = existing.into_active_model();
    active.name = Set(name);
    let model = active.update(db).await.map_err(duplicate_name)?;
    Ok(model.into())
}

async fn find_achievement<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<achievement::Model, AppError> {
    achievement::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Achievement not found".into()))
}
