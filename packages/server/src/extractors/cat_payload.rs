use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, multipart::Field},
    http::header::CONTENT_TYPE,
};

use crate::error::AppError;
use crate::models::achievement::AchievementRequest;
use crate::models::cat::{CatInput, CatRequest};
use crate::models::shared::parse_int;
use crate::utils::image::{ImageFile, NOT_A_FILE_MESSAGE};

use super::json::rejection_message;

/// Cat write body, accepted as JSON or as `multipart/form-data`.
///
/// In a form, `achievements` is a JSON array string and `image` is either a
/// file part or a text part holding a data URI; an empty text `image`
/// removes the image.
pub struct CatPayload(pub CatInput);

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"))
}

async fn field_text(field: Field<'_>, name: &'static str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::field(name, format!("Failed to read field: {e}")))
}

async fn read_form(mut multipart: Multipart) -> Result<CatInput, AppError> {
    let mut input = CatInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("name") => {
                let text = field_text(field, "name").await?;
                input = input.with_name(&text)?;
            }
            Some("color") => {
                let text = field_text(field, "color").await?;
                input = input.with_color(&text)?;
            }
            Some("birth_year") => {
                let text = field_text(field, "birth_year").await?;
                input.birth_year = Some(parse_int("birth_year", &text)?);
            }
            Some("achievements") => {
                let text = field_text(field, "achievements").await?;
                let entries: Vec<AchievementRequest> = serde_json::from_str(&text)
                    .map_err(|e| AppError::field("achievements", e.to_string()))?;
                input = input.with_achievements(&entries)?;
            }
            Some("image") => {
                input.image = Some(read_image(field).await?);
            }
            _ => {} // Ignore unknown fields, `owner` included.
        }
    }

    Ok(input)
}

async fn read_image(field: Field<'_>) -> Result<Option<ImageFile>, AppError> {
    match field.file_name().map(str::to_string) {
        Some(file_name) => {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::field("image", format!("Failed to read file: {e}")))?;
            ImageFile::from_upload(Some(&file_name), data.to_vec()).map(Some)
        }
        None => {
            let text = field_text(field, "image").await?;
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else if text.starts_with("data:") {
                ImageFile::from_data_uri(text).map(Some)
            } else {
                Err(AppError::field("image", NOT_A_FILE_MESSAGE))
            }
        }
    }
}

impl<S> FromRequest<S> for CatPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return read_form(multipart).await.map(CatPayload);
        }

        let Json(body) = Json::<CatRequest>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(rejection_message(&e)))?;
        CatInput::try_from(body).map(CatPayload)
    }
}
