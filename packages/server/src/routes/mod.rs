use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::state::AppState;

/// Everything served under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(cat_routes(config))
        .merge(achievement_routes())
        .merge(auth_routes())
}

fn cat_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    use crate::handlers::cat::*;

    OpenApiRouter::new()
        .routes(routes!(list_cats, create_cat))
        .routes(routes!(
            get_cat,
            update_cat,
            partial_update_cat,
            delete_cat
        ))
        .layer(cat_body_limit(config.storage.max_image_size))
}

fn achievement_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::achievement::*;

    OpenApiRouter::new()
        .routes(routes!(list_achievements, create_achievement))
        .routes(routes!(
            get_achievement,
            update_achievement,
            partial_update_achievement,
            delete_achievement
        ))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::auth::*;

    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(me, delete_me))
        .routes(routes!(login))
        .routes(routes!(refresh))
        .routes(routes!(logout))
}
