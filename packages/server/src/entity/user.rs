use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub email: Option<String>,
    /// Argon2 PHC string.
    pub password: String,
    /// Bumped on logout; tokens carrying an older value are rejected.
    #[sea_orm(default_value = 0)]
    pub token_version: i32,

    #[sea_orm(has_many)]
    pub cats: HasMany<super::cat::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
