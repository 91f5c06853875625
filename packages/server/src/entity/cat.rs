use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum length of a cat's name, in characters.
pub const NAME_MAX_LEN: usize = 16;
/// Maximum length of a stored color name, in characters.
pub const COLOR_MAX_LEN: usize = 16;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cat")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    /// Human-readable color name, e.g. "white".
    #[sea_orm(column_type = "String(StringLen::N(16))")]
    pub color: String,
    pub birth_year: i32,

    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Relative image path (`cats/images/<sha256>.<ext>`), NULL when no image.
    pub image: Option<String>,

    #[sea_orm(has_many)]
    pub achievement_links: HasMany<super::achievement_cat::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
