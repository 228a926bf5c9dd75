use tracing::{debug, info};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{Actor, ChapterEntity, NewGame},
    dto::{
        games::{
            AppendChapterRequest, ChapterAppendedResponse, CreateGameRequest, GameDetail,
            GameListItem, GameSummary,
        },
        validation::validate_slug,
    },
    error::ServiceError,
    state::SharedState,
};

/// Persist a new game with all four sections empty.
pub async fn create_game(
    state: &SharedState,
    actor: &Actor,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate().map_err(invalid_input)?;
    let store = state.require_game_store().await?;

    let CreateGameRequest {
        title,
        slug,
        description,
        includes,
        thumbnail_url,
    } = request;

    let game = store
        .insert_game(NewGame {
            slug,
            title,
            description,
            includes,
            thumbnail_url,
            popularity: state.config().default_popularity,
            actor: actor.clone(),
        })
        .await?;

    info!(game_id = %game.id, slug = %game.slug, created_by = %actor.id, "game created");
    Ok(game.into())
}

/// Append a chapter at the end of one section of the game named by `slug`.
pub async fn append_chapter(
    state: &SharedState,
    actor: &Actor,
    slug: String,
    request: AppendChapterRequest,
) -> Result<ChapterAppendedResponse, ServiceError> {
    request.validate().map_err(invalid_input)?;
    ensure_addressable(&slug)?;
    let store = state.require_game_store().await?;

    let AppendChapterRequest {
        section,
        title,
        content,
    } = request;
    let chapter = ChapterEntity::new(title, content, actor);

    let Some(appended) = store.append_chapter(slug.clone(), section, chapter).await? else {
        debug!(%slug, %section, "chapter append for unknown game");
        return Err(ServiceError::NotFound(format!("game `{slug}` not found")));
    };

    info!(
        %slug,
        %section,
        position = appended.position,
        created_by = %actor.id,
        "chapter appended"
    );
    Ok(ChapterAppendedResponse::new(slug, appended))
}

/// Every game as `{slug, title}`, newest first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// One game with all of its sections.
pub async fn get_game(state: &SharedState, slug: String) -> Result<GameDetail, ServiceError> {
    ensure_addressable(&slug)?;
    let store = state.require_game_store().await?;
    match store.find_game_by_slug(slug.clone()).await? {
        Some(game) => Ok(game.into()),
        None => Err(ServiceError::NotFound(format!("game `{slug}` not found"))),
    }
}

/// No stored game can carry a malformed slug.
fn ensure_addressable(slug: &str) -> Result<(), ServiceError> {
    validate_slug(slug)
        .map_err(|_| ServiceError::NotFound(format!("game `{slug}` not found")))
}

pub(crate) fn invalid_input(errors: ValidationErrors) -> ServiceError {
    ServiceError::InvalidInput(errors.to_string())
}
