use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the connect-five server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::join_game,
        crate::routes::game::join_or_create,
        crate::routes::game::get_game,
        crate::routes::game::update_game,
        crate::routes::game::get_board,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::UpdateGameRequest,
            crate::dto::game::GameIdResponse,
            crate::dto::game::JoinOrCreateResponse,
            crate::dto::game::MessageResponse,
            crate::dto::game::GameView,
            crate::dto::game::MoveResponse,
            crate::state::game::GameStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Create, join and play games"),
    )
)]
pub struct ApiDoc;
