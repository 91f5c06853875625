use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Datelike, Utc};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{achievement_cat, cat};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::cat_payload::CatPayload;
use crate::models::achievement::AchievementResponse;
use crate::models::cat::*;
use crate::models::shared::PageWindow;
use crate::state::AppState;
use crate::utils::achievement::{
    achievements_by_cat, achievements_of_cat, get_or_create_achievements, link_achievements,
    replace_links,
};
use crate::utils::image::ImageFile;

const CATS_BASE_PATH: &str = "/api/cats/";

/// Body limit for cat writes. Inline images grow by a third when base64
/// encoded; the rest of the body is small.
pub fn cat_body_limit(max_image_size: u64) -> DefaultBodyLimit {
    let limit = max_image_size.saturating_mul(4) / 3 + 64 * 1024;
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/cats/",
    tag = "Cats",
    operation_id = "listCats",
    summary = "List cats",
    description = "Returns one page of cats ordered by id. `page` is 1-based; `page=last` jumps to the final page. \
        A page outside the range is 404 `Invalid page.`.",
    params(CatListQuery),
    responses(
        (status = 200, description = "Page of cats", body = CatListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Invalid page (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query), fields(page = ?query.page))]
pub async fn list_cats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<CatListQuery>,
) -> Result<Json<CatListResponse>, AppError> {
    let count = cat::Entity::find().count(&state.db).await?;
    let window = PageWindow::resolve(query.page.as_deref(), state.config.api.page_size, count)?;

    let cats = cat::Entity::find()
        .order_by_asc(cat::Column::Id)
        .offset(window.offset())
        .limit(window.page_size)
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = cats.iter().map(|c| c.id).collect();
    let mut achievements = achievements_by_cat(&state.db, &ids).await?;
    let year = Utc::now().year();

    let results = cats
        .into_iter()
        .map(|model| {
            let held = achievements.remove(&model.id).unwrap_or_default();
            CatResponse::new(model, held, &state.config.media.url_prefix, year)
        })
        .collect();

    Ok(Json(CatListResponse {
        count,
        next: window.next_link(CATS_BASE_PATH),
        previous: window.previous_link(CATS_BASE_PATH),
        results,
    }))
}

#[utoipa::path(
    post,
    path = "/cats/",
    tag = "Cats",
    operation_id = "createCat",
    summary = "Create a cat",
    description = "Creates a cat owned by the caller; any `owner` in the body is ignored. `name`, `color` and `birth_year` are required. \
        Nested achievements are resolved by name and created when missing; repeated names produce repeated links. \
        The body may also be sent as `multipart/form-data` with `achievements` as a JSON string and `image` as a file part.",
    request_body = CatRequest,
    responses(
        (status = 201, description = "Cat created", body = CatResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, cat_id))]
pub async fn create_cat(
    auth_user: AuthUser,
    State(state): State<AppState>,
    CatPayload(payload): CatPayload,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.ok_or_else(|| AppError::required("name"))?;
    let color = payload.color.ok_or_else(|| AppError::required("color"))?;
    let birth_year = payload
        .birth_year
        .ok_or_else(|| AppError::required("birth_year"))?;

    let image = match payload.image {
        Some(Some(file)) => Some(store_image(&state, &file).await?),
        _ => None,
    };

    let txn = state.db.begin().await?;

    let new_cat = cat::ActiveModel {
        name: Set(name),
        color: Set(color),
        birth_year: Set(birth_year),
        owner_id: Set(auth_user.user_id),
        image: Set(image),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let model = new_cat.insert(&txn).await?;
    tracing::Span::current().record("cat_id", model.id);

    if let Some(names) = payload.achievements.as_deref() {
        let ids: Vec<i32> = get_or_create_achievements(&txn, names)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        link_achievements(&txn, model.id, &ids).await?;
    }

    let achievements = achievements_of_cat(&txn, model.id).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(cat_response(&state, model, achievements)),
    ))
}

#[utoipa::path(
    get,
    path = "/cats/{id}/",
    tag = "Cats",
    operation_id = "getCat",
    summary = "Get a cat",
    params(("id" = i32, Path, description = "Cat ID")),
    responses(
        (status = 200, description = "Cat", body = CatResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cat not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_cat(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CatResponse>, AppError> {
    let model = find_cat(&state.db, id).await?;
    let achievements = achievements_of_cat(&state.db, id).await?;
    Ok(Json(cat_response(&state, model, achievements)))
}

#[utoipa::path(
    put,
    path = "/cats/{id}/",
    tag = "Cats",
    operation_id = "updateCat",
    summary = "Replace a cat",
    description = "Full update: `name`, `color` and `birth_year` are required. When `achievements` is present the cat's \
        achievements become exactly that set of names; when absent they are left untouched.",
    params(("id" = i32, Path, description = "Cat ID")),
    request_body = CatRequest,
    responses(
        (status = 200, description = "Cat updated", body = CatResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cat not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_cat(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    CatPayload(payload): CatPayload,
) -> Result<Json<CatResponse>, AppError> {
    payload.require_complete()?;
    apply_update(&state, id, payload).await.map(Json)
}

#[utoipa::path(
    patch,
    path = "/cats/{id}/",
    tag = "Cats",
    operation_id = "partialUpdateCat",
    summary = "Partially update a cat",
    description = "Only the supplied fields change. `image: null` removes the image; \
        `achievements: []` clears the cat's achievements.",
    params(("id" = i32, Path, description = "Cat ID")),
    request_body = CatRequest,
    responses(
        (status = 200, description = "Cat updated", body = CatResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cat not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn partial_update_cat(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    CatPayload(payload): CatPayload,
) -> Result<Json<CatResponse>, AppError> {
    apply_update(&state, id, payload).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/cats/{id}/",
    tag = "Cats",
    operation_id = "deleteCat",
    summary = "Delete a cat",
    description = "Deletes the cat and its achievement links. The achievements themselves are kept.",
    params(("id" = i32, Path, description = "Cat ID")),
    responses(
        (status = 204, description = "Cat deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Cat not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_cat(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    find_cat(&txn, id).await?;

    achievement_cat::Entity::delete_many()
        .filter(achievement_cat::Column::CatId.eq(id))
        .exec(&txn)
        .await?;
    cat::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(state: &AppState, id: i32, payload: CatInput) -> Result<CatResponse, AppError> {
    // Images are content-addressed, so storing before the row exists is safe.
    let image = match payload.image {
        Some(Some(file)) => Some(Some(store_image(state, &file).await?)),
        Some(None) => Some(None),
        None => None,
    };

    let txn = state.db.begin().await?;
    let existing = find_cat(&txn, id).await?;

    let mut active = existing.clone().into_active_model();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(color) = payload.color {
        active.color = Set(color);
    }
    if let Some(birth_year) = payload.birth_year {
        active.birth_year = Set(birth_year);
    }
    if let Some(image) = image {
        active.image = Set(image);
    }

    let model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        existing
    };

    if let Some(names) = payload.achievements.as_deref() {
        let ids: Vec<i32> = get_or_create_achievements(&txn, names)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        replace_links(&txn, id, &ids).await?;
    }

    let achievements = achievements_of_cat(&txn, id).await?;
    txn.commit().await?;

    Ok(cat_response(state, model, achievements))
}

async fn store_image(state: &AppState, file: &ImageFile) -> Result<String, AppError> {
    let key = state.images.put(&file.data, &file.extension).await?;
    tracing::debug!(
        upload = %file.name,
        image = %key.path(),
        size = file.data.len(),
        "Stored cat image"
    );
    Ok(key.path())
}

fn cat_response(
    state: &AppState,
    model: cat::Model,
    achievements: Vec<AchievementResponse>,
) -> CatResponse {
    CatResponse::new(
        model,
        achievements,
        &state.config.media.url_prefix,
        Utc::now().year(),
    )
}

async fn find_cat<C: ConnectionTrait>(db: &C, id: i32) -> Result<cat::Model, AppError> {
    cat::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cat not found".into()))
}
