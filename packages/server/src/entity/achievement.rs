use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum length of an achievement name, in characters.
pub const NAME_MAX_LEN: usize = 64;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Natural key; cat writes resolve achievements by exact name.
    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(has_many)]
    pub cat_links: HasMany<super::achievement_cat::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
