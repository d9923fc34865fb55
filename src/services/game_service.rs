use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::PLAYER_RANGE,
    dao::game_store::{GameStore, GameTransaction},
    error::ServiceError,
    services::game_finder,
    state::{
        SharedState,
        game::{GameRecord, MoveOutcome},
    },
};

/// Create an open game seating `name` and persist it.
pub async fn start_new_game(
    state: &SharedState,
    name: &str,
    max_players: usize,
) -> Result<Uuid, ServiceError> {
    let name = ensure_name(name)?;
    ensure_seats(max_players)?;
    let store = state.require_game_store().await?;

    let game = GameRecord::new(name, max_players);
    let game_id = game.game_id;
    store.save_game(game).await?;

    info!(%game_id, player = name, max_players, "started new game");
    Ok(game_id)
}

/// Seat `name` in any open game; `None` when no game had room.
pub async fn join_existing_game(
    state: &SharedState,
    name: &str,
) -> Result<Option<Uuid>, ServiceError> {
    let name = ensure_name(name)?;
    let store = state.require_game_store().await?;
    let limit = state.config().max_join_attempts();
    Ok(game_finder::join_game(store.as_ref(), name, limit).await?)
}

/// Join an open game, or start one when none has room.
///
/// The flag is `true` when a new game was created.
pub async fn join_or_create(
    state: &SharedState,
    name: &str,
    max_players: usize,
) -> Result<(Uuid, bool), ServiceError> {
    ensure_seats(max_players)?;
    match join_existing_game(state, name).await? {
        Some(game_id) => Ok((game_id, false)),
        None => start_new_game(state, name, max_players)
            .await
            .map(|game_id| (game_id, true)),
    }
}

/// Load a game record.
pub async fn get_game(state: &SharedState, id: Uuid) -> Result<GameRecord, ServiceError> {
    let store = state.require_game_store().await?;
    store.get_game(id).await?.ok_or_else(|| not_found(id))
}

/// Drop `name`'s disc into the 1-based `column` of game `id`.
///
/// `name` is trimmed the same way it was when the player took a seat.
/// A full column yields [`MoveOutcome::Invalid`] and nothing is written.
/// The returned record is the one committed (or the unchanged one).
pub async fn make_move(
    state: &SharedState,
    id: Uuid,
    name: &str,
    column: usize,
) -> Result<(MoveOutcome, GameRecord), ServiceError> {
    let name = ensure_name(name)?;
    let store = state.require_game_store().await?;
    let transaction = store.begin_transaction(id).await?;
    let mut game = store
        .read_in_transaction(&transaction)
        .await?
        .ok_or_else(|| not_found(id))?;

    let outcome = game.apply_move(name, column)?;
    if outcome == MoveOutcome::Invalid {
        return Ok((outcome, game));
    }

    commit(store.as_ref(), transaction, game.clone()).await?;
    if outcome == MoveOutcome::Win {
        info!(game_id = %id, player = name, "game won");
    }
    Ok((outcome, game))
}

/// Close game `id`: won when `won`, disconnected otherwise.
pub async fn game_over(
    state: &SharedState,
    id: Uuid,
    won: bool,
) -> Result<GameRecord, ServiceError> {
    let store = state.require_game_store().await?;
    let transaction = store.begin_transaction(id).await?;
    let mut game = store
        .read_in_transaction(&transaction)
        .await?
        .ok_or_else(|| not_found(id))?;

    game.finish(won)?;
    commit(store.as_ref(), transaction, game.clone()).await?;

    info!(game_id = %id, status = ?game.game_status, "game over");
    Ok(game)
}

async fn commit(
    store: &dyn GameStore,
    transaction: GameTransaction,
    game: GameRecord,
) -> Result<(), ServiceError> {
    let id = transaction.game_id();
    if store.commit_transaction(transaction, game).await? {
        Ok(())
    } else {
        warn!(game_id = %id, "concurrent update detected; write discarded");
        Err(ServiceError::InvalidState(format!(
            "game `{id}` changed concurrently; retry"
        )))
    }
}

fn ensure_name(name: &str) -> Result<&str, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(
            "player name must not be empty".into(),
        ));
    }
    Ok(trimmed)
}

fn ensure_seats(max_players: usize) -> Result<(), ServiceError> {
    let (min, max) = PLAYER_RANGE;
    if !(min..=max).contains(&max_players) {
        return Err(ServiceError::InvalidInput(format!(
            "max_players must be between {min} and {max}"
        )));
    }
    Ok(())
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("game `{id}` not found"))
}
