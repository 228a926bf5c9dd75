use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dao::models::Actor,
    dto::{
        admin::AdminCreateGameRequest,
        games::{AppendChapterRequest, ChapterAppendedResponse, GameSummary},
    },
    error::AppError,
    services::{admin_service, catalog_service},
    state::SharedState,
};

/// Write endpoints for signed-in users.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/games", post(create_game))
        .route("/admin/games/{slug}/chapters", post(append_chapter))
}

/// Create a game, hosting its thumbnail first.
#[utoipa::path(
    post,
    path = "/admin/games",
    tag = "admin",
    params(
        ("X-User-Id" = String, Header, description = "Signed-in user id"),
        ("X-User-Email" = String, Header, description = "Signed-in user email")
    ),
    request_body = AdminCreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameSummary),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "Slug already taken"),
        (status = 422, description = "Body is not a game form"),
        (status = 503, description = "Storage unavailable"),
        (status = 502, description = "Image host refused the thumbnail")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    actor: Actor,
    Valid(Json(payload)): Valid<Json<AdminCreateGameRequest>>,
) -> Result<(StatusCode, Json<GameSummary>), AppError> {
    let summary = admin_service::create_game_with_thumbnail(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Append a chapter to one section of a game.
#[utoipa::path(
    post,
    path = "/admin/games/{slug}/chapters",
    tag = "admin",
    params(
        ("slug" = String, Path, description = "Slug of the game"),
        ("X-User-Id" = String, Header, description = "Signed-in user id"),
        ("X-User-Email" = String, Header, description = "Signed-in user email")
    ),
    request_body = AppendChapterRequest,
    responses(
        (status = 201, description = "Chapter appended", body = ChapterAppendedResponse),
        (status = 400, description = "Invalid chapter"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No game with this slug"),
        (status = 422, description = "Body is not a chapter (unknown section)"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn append_chapter(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    actor: Actor,
    Valid(Json(payload)): Valid<Json<AppendChapterRequest>>,
) -> Result<(StatusCode, Json<ChapterAppendedResponse>), AppError> {
    let appended = catalog_service::append_chapter(&state, &actor, slug, payload).await?;
    Ok((StatusCode::CREATED, Json(appended)))
}
