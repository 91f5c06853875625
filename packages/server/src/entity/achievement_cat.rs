use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One cat-achievement link. The pair is not unique: a cat may hold the
/// same achievement more than once.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement_cat")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub achievement_id: i32,
    #[sea_orm(belongs_to, from = "achievement_id", to = "id")]
    pub achievement: HasOne<super::achievement::Entity>,

    pub cat_id: i32,
    #[sea_orm(belongs_to, from = "cat_id", to = "id")]
    pub cat: HasOne<super::cat::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
