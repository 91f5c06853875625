use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{achievement_cat, cat};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("kittygram::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure lookup indexes exist on foreign-key columns.
///
/// Schema sync creates primary keys and unique constraints only, so the
/// indexes backing link and owner lookups are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        (
            "idx_achievement_cat_cat",
            Index::create()
                .if_not_exists()
                .name("idx_achievement_cat_cat")
                .table(achievement_cat::Entity)
                .col(achievement_cat::Column::CatId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_achievement_cat_achievement",
            Index::create()
                .if_not_exists()
                .name("idx_achievement_cat_achievement")
                .table(achievement_cat::Entity)
                .col(achievement_cat::Column::AchievementId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_cat_owner",
            Index::create()
                .if_not_exists()
                .name("idx_cat_owner")
                .table(cat::Entity)
                .col(cat::Column::OwnerId)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
