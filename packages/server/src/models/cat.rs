use serde::{Deserialize, Serialize};

use crate::entity::cat;
use crate::error::AppError;
use crate::utils::color::color_from_hex;
use crate::utils::image::ImageFile;

use super::achievement::{AchievementRequest, AchievementResponse, validate_achievement_name};
use super::shared::{LenientInt, double_option, validate_name};

const NOT_NULL_MESSAGE: &str = "This field may not be null.";

/// Cat as written by clients in a JSON body.
///
/// Every field is optional on the wire; which ones are required depends on
/// the operation (see [`CatInput::require_complete`]). Unknown fields,
/// including `owner`, are ignored.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CatRequest {
    #[schema(example = "Barsik")]
    pub name: Option<String>,
    /// Hex color; stored as its CSS3 name.
    #[schema(example = "#FFFFFF")]
    pub color: Option<String>,
    /// Number or numeric string.
    #[schema(value_type = Option<i32>, example = 2020)]
    pub birth_year: Option<LenientInt>,
    /// Omit to leave achievements alone; an empty list clears them on update.
    /// Null is rejected.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Vec<AchievementRequest>>)]
    pub achievements: Option<Option<Vec<AchievementRequest>>>,
    /// `data:image/<ext>;base64,<payload>`, or null to remove the image.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "data:image/png;base64,iVBORw0KGgo=")]
    pub image: Option<Option<String>>,
}

/// Validated and converted cat fields, ready to be persisted.
#[derive(Debug, Default)]
pub struct CatInput {
    pub name: Option<String>,
    /// Color name, already converted from hex.
    pub color: Option<String>,
    pub birth_year: Option<i32>,
    /// Achievement names, in request order, duplicates kept.
    pub achievements: Option<Vec<String>>,
    pub image: Option<Option<ImageFile>>,
}

impl CatInput {
    pub fn with_name(mut self, raw: &str) -> Result<Self, AppError> {
        self.name = Some(validate_name("name", raw, cat::NAME_MAX_LEN)?);
        Ok(self)
    }

    pub fn with_color(mut self, hex: &str) -> Result<Self, AppError> {
        self.color = Some(color_from_hex(hex)?);
        Ok(self)
    }

    pub fn with_achievements(mut self, entries: &[AchievementRequest]) -> Result<Self, AppError> {
        let names = entries
            .iter()
            .map(|a| validate_achievement_name(&a.achievement_name))
            .collect::<Result<Vec<_>, _>>()?;
        self.achievements = Some(names);
        Ok(self)
    }

    /// Create and full update need every required field.
    pub fn require_complete(&self) -> Result<(), AppError> {
        if self.name.is_none() {
            return Err(AppError::required("name"));
        }
        if self.color.is_none() {
            return Err(AppError::required("color"));
        }
        if self.birth_year.is_none() {
            return Err(AppError::required("birth_year"));
        }
        Ok(())
    }
}

impl TryFrom<CatRequest> for CatInput {
    type Error = AppError;

    fn try_from(req: CatRequest) -> Result<Self, AppError> {
        let mut input = CatInput {
            birth_year: req
                .birth_year
                .as_ref()
                .map(|year| year.to_i32("birth_year"))
                .transpose()?,
            ..Default::default()
        };
        if let Some(name) = &req.name {
            input = input.with_name(name)?;
        }
        if let Some(color) = &req.color {
            input = input.with_color(color)?;
        }
        match &req.achievements {
            None => {}
            Some(None) => return Err(AppError::field("achievements", NOT_NULL_MESSAGE)),
            Some(Some(achievements)) => input = input.with_achievements(achievements)?,
        }
        input.image = match req.image {
            None => None,
            Some(None) => Some(None),
            Some(Some(uri)) => Some(Some(ImageFile::from_data_uri(&uri)?)),
        };
        Ok(input)
    }
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct CatResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Barsik")]
    pub name: String,
    #[schema(example = "white")]
    pub color: String,
    #[schema(example = 2020)]
    pub birth_year: i32,
    pub achievements: Vec<AchievementResponse>,
    /// ID of the owning user.
    #[schema(example = 42)]
    pub owner: i32,
    /// Current year minus birth year; may be negative.
    #[schema(example = 6)]
    pub age: i32,
    #[schema(example = "/media/cats/images/3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b.png")]
    pub image_url: Option<String>,
}

impl CatResponse {
    pub fn new(
        model: cat::Model,
        achievements: Vec<AchievementResponse>,
        media_prefix: &str,
        current_year: i32,
    ) -> Self {
        Self {
            id: model.id,
            age: age_in(model.birth_year, current_year),
            image_url: image_url(media_prefix, model.image.as_deref()),
            name: model.name,
            color: model.color,
            birth_year: model.birth_year,
            achievements,
            owner: model.owner_id,
        }
    }
}

/// Public URL of a stored image path.
pub fn image_url(media_prefix: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{media_prefix}{p}"))
}

/// Age in whole years; not clamped.
pub fn age_in(birth_year: i32, current_year: i32) -> i32 {
    current_year.saturating_sub(birth_year)
}

/// Page of cats.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CatListResponse {
    /// Total number of cats across all pages.
    #[schema(example = 47)]
    pub count: u64,
    #[schema(example = "/api/cats/?page=3")]
    pub next: Option<String>,
    #[schema(example = "/api/cats/")]
    pub previous: Option<String>,
    pub results: Vec<CatResponse>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatListQuery {
    /// 1-based page number, or `last`.
    #[param(example = "2")]
    pub page: Option<String>,
}
