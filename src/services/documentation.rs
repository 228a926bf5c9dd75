use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the game chapters backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::admin::create_game,
        crate::routes::admin::append_chapter,
        crate::routes::relay::upload_image,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::games::GameListItem,
            crate::dto::games::GameDetail,
            crate::dto::games::ChapterDto,
            crate::dto::games::GameSummary,
            crate::dto::games::AppendChapterRequest,
            crate::dto::games::ChapterAppendedResponse,
            crate::dto::admin::AdminCreateGameRequest,
            crate::dto::admin::ThumbnailInput,
            crate::dto::relay::RelayRequest,
            crate::dto::relay::RelayResponse,
            crate::dto::relay::MethodNotAllowed,
            crate::dao::models::Section,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Read access to the game catalog"),
        (name = "admin", description = "Game and chapter creation for signed-in users"),
        (name = "images", description = "Image relay to the image host"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
