use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{
        CreateGameRequest, GameIdResponse, GameUpdate, GameView, JoinGameRequest,
        JoinOrCreateResponse, MESSAGE_OK, MessageResponse, MoveResponse, UpdateGameRequest,
    },
    error::AppError,
    services::game_service,
    state::{SharedState, game::MoveOutcome},
};

/// Routes driving the game lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", post(create_game).patch(join_game))
        .route("/game/join", post(join_or_create))
        .route("/game/{id}", get(get_game).patch(update_game))
        .route("/game/{id}/board", get(get_board))
}

/// Start a game with the caller in the first seat.
#[utoipa::path(
    post,
    path = "/game",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameIdResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameIdResponse>), AppError> {
    payload.validate()?;
    let max_players = payload
        .max_players
        .unwrap_or_else(|| state.config().default_max_players());
    let game_id = game_service::start_new_game(&state, &payload.name, max_players).await?;
    Ok((
        StatusCode::CREATED,
        Json(GameIdResponse {
            game_id: Some(game_id),
        }),
    ))
}

/// Seat the caller in any open game.
#[utoipa::path(
    patch,
    path = "/game",
    tag = "game",
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined an open game", body = GameIdResponse),
        (status = 404, description = "No open game has room", body = GameIdResponse)
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<(StatusCode, Json<GameIdResponse>), AppError> {
    payload.validate()?;
    let game_id = game_service::join_existing_game(&state, &payload.name).await?;
    let status = match game_id {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    };
    Ok((status, Json(GameIdResponse { game_id })))
}

/// Join an open game, or start one when none has room.
#[utoipa::path(
    post,
    path = "/game/join",
    tag = "game",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Joined an open game", body = JoinOrCreateResponse),
        (
            status = 201,
            description = "No open game had room; a new one was created",
            body = JoinOrCreateResponse
        )
    )
)]
pub async fn join_or_create(
    State(state): State<SharedState>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<JoinOrCreateResponse>), AppError> {
    payload.validate()?;
    let max_players = payload
        .max_players
        .unwrap_or_else(|| state.config().default_max_players());
    let (game_id, created) =
        game_service::join_or_create(&state, &payload.name, max_players).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(JoinOrCreateResponse { game_id, created })))
}

/// Fetch the full game record.
#[utoipa::path(
    get,
    path = "/game/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game record", body = GameView),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, AppError> {
    let game = game_service::get_game(&state, id).await?;
    Ok(Json(game.into()))
}

/// Play a move, or leave the game with `{"game_status": "disconnected"}`.
#[utoipa::path(
    patch,
    path = "/game/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    request_body = UpdateGameRequest,
    responses(
        (
            status = 200,
            description = "Move accepted (`OK` or `won`) merged with the record",
            body = MoveResponse
        ),
        (status = 400, description = "Column full, record unchanged", body = MoveResponse),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game over, not the caller's turn, or concurrent update")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Response, AppError> {
    match payload.into_update()? {
        GameUpdate::Leave => {
            game_service::game_over(&state, id, false).await?;
            Ok(Json(MessageResponse {
                message: MESSAGE_OK.to_owned(),
            })
            .into_response())
        }
        GameUpdate::Move { name, column } => {
            let (outcome, game) = game_service::make_move(&state, id, &name, column).await?;
            let status = match outcome {
                MoveOutcome::Invalid => StatusCode::BAD_REQUEST,
                MoveOutcome::Win | MoveOutcome::Continue => StatusCode::OK,
            };
            Ok((status, Json(MoveResponse::new(outcome, game))).into_response())
        }
    }
}

/// Text dump of the board, top row first.
#[utoipa::path(
    get,
    path = "/game/{id}/board",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Board rendering", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_board(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<String, AppError> {
    let game = game_service::get_game(&state, id).await?;
    Ok(game.board.to_string())
}
