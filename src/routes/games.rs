use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::games::{GameDetail, GameListItem},
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Read-only catalog routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/{slug}", get(get_game))
}

/// List every game as `{slug, title}`, newest first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses(
        (status = 200, description = "Known games", body = [GameListItem]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    Ok(Json(catalog_service::list_games(&state).await?))
}

/// Fetch a game and all of its chapters.
#[utoipa::path(
    get,
    path = "/games/{slug}",
    tag = "games",
    params(("slug" = String, Path, description = "Slug of the game")),
    responses(
        (status = 200, description = "Game record", body = GameDetail),
        (status = 404, description = "No game with this slug")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(catalog_service::get_game(&state, slug).await?))
}
