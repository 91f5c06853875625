use serde::{Deserialize, Serialize};

use crate::entity::achievement;
use crate::error::AppError;

use super::shared::validate_name;

/// Achievement as written by clients, both standalone and nested in a cat.
#[derive(Deserialize, Clone, utoipa::ToSchema)]
pub struct AchievementRequest {
    #[schema(example = "Caught a mouse")]
    pub achievement_name: String,
}

/// Partial achievement update.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAchievementRequest {
    #[schema(example = "Caught two mice")]
    pub achievement_name: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct AchievementResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Caught a mouse")]
    pub achievement_name: String,
}

impl From<achievement::Model> for AchievementResponse {
    fn from(model: achievement::Model) -> Self {
        Self {
            id: model.id,
            achievement_name: model.name,
        }
    }
}

pub fn validate_achievement_name(name: &str) -> Result<String, AppError> {
    validate_name("achievement_name", name, achievement::NAME_MAX_LEN)
}
