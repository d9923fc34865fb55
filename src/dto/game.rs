use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        validation::{validate_column, validate_max_players, validate_player_name},
    },
    state::{
        board::Board,
        game::{GameRecord, GameStatus, MoveOutcome},
    },
};

/// Reply to a successful move.
pub const MESSAGE_OK: &str = "OK";
/// Reply to the move that won the game.
pub const MESSAGE_WON: &str = "won";
/// Reply to a move into a full column.
pub const MESSAGE_COLUMN_FULL: &str = "Bad request, column full.";

/// Payload creating a game, also used by join-or-create.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// Player taking the first seat; surrounding whitespace is dropped.
    pub name: String,
    /// Seats in the game (2 or 3). Defaults to the configured value.
    #[serde(default)]
    pub max_players: Option<usize>,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }
        if let Some(max_players) = self.max_players {
            if let Err(e) = validate_max_players(max_players) {
                errors.add("max_players", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload asking to be seated in any open game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinGameRequest {
    /// Player asking for a seat.
    pub name: String,
}

impl Validate for JoinGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Either a move (`name` + `column`) or leaving the game
/// (`game_status: "disconnected"`).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateGameRequest {
    /// Player making the move.
    #[serde(default)]
    pub name: Option<String>,
    /// 1-based column.
    #[serde(default)]
    pub column: Option<usize>,
    /// Only `disconnected` is accepted; it ends the game.
    #[serde(default)]
    pub game_status: Option<GameStatus>,
}

/// What an [`UpdateGameRequest`] asks for once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameUpdate {
    /// Drop a disc.
    Move {
        /// Player on turn.
        name: String,
        /// 1-based column.
        column: usize,
    },
    /// A player left; the game becomes disconnected.
    Leave,
}

impl Validate for UpdateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.game_status {
            Some(GameStatus::Disconnected) => {}
            Some(_) => {
                let mut err = ValidationError::new("game_status");
                err.message = Some("Only `disconnected` can be requested".into());
                errors.add("game_status", err);
            }
            None => {
                match self.name.as_deref() {
                    Some(name) => {
                        if let Err(e) = validate_player_name(name) {
                            errors.add("name", e);
                        }
                    }
                    None => errors.add("name", ValidationError::new("required")),
                }
                match self.column {
                    Some(column) => {
                        if let Err(e) = validate_column(column) {
                            errors.add("column", e);
                        }
                    }
                    None => errors.add("column", ValidationError::new("required")),
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl UpdateGameRequest {
    /// Validate and resolve the requested update.
    pub fn into_update(self) -> Result<GameUpdate, ValidationErrors> {
        self.validate()?;
        match (self.game_status, self.name, self.column) {
            (Some(_), _, _) => Ok(GameUpdate::Leave),
            (None, Some(name), Some(column)) => Ok(GameUpdate::Move { name, column }),
            // validate() rejects every other combination
            _ => Err(ValidationErrors::new()),
        }
    }
}

/// Identifier of a game, `null` when no open game was found.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GameIdResponse {
    /// Game the caller sits in.
    pub game_id: Option<Uuid>,
}

/// Result of join-or-create.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinOrCreateResponse {
    /// Game the caller sits in.
    pub game_id: Uuid,
    /// True when no open game had room and a new one was started.
    pub created: bool,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Always `OK`.
    pub message: String,
}

/// Public projection of a game record.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    /// Game identifier.
    pub game_id: Uuid,
    /// Column-major grid; row 0 is the top. Cells are `-`, `x`, `o` or `z`.
    #[schema(value_type = Vec<Vec<String>>)]
    pub board: Board,
    /// True once every cell holds a disc and no further move is possible.
    pub board_full: bool,
    /// Lifecycle stage.
    pub game_status: GameStatus,
    /// Seated players in turn order.
    pub players: Vec<String>,
    /// Player expected to move, `null` while waiting for seats or once over.
    pub turn: Option<String>,
    /// Seats in the game.
    pub max_players: usize,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last write.
    pub updated_at: String,
}

impl From<GameRecord> for GameView {
    fn from(value: GameRecord) -> Self {
        Self {
            game_id: value.game_id,
            board_full: value.board.is_full(),
            board: value.board,
            game_status: value.game_status,
            players: value.players,
            turn: value.turn,
            max_players: value.max_players,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Move result merged with the resulting record.
#[derive(Debug, Serialize, ToSchema)]
pub struct MoveResponse {
    /// `OK`, `won` or `Bad request, column full.`
    pub message: String,
    /// Record after the move, or unchanged for a full column.
    #[serde(flatten)]
    pub game: GameView,
}

impl MoveResponse {
    /// Build the reply for `outcome` on `game`.
    pub fn new(outcome: MoveOutcome, game: GameRecord) -> Self {
        let message = match outcome {
            MoveOutcome::Win => MESSAGE_WON,
            MoveOutcome::Continue => MESSAGE_OK,
            MoveOutcome::Invalid => MESSAGE_COLUMN_FULL,
        };
        Self {
            message: message.to_owned(),
            game: game.into(),
        }
    }
}
