use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::board::{Board, Disc, has_won};

/// Lifecycle of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Waiting for players; discoverable by the finder.
    Open,
    /// Every seat is taken.
    Playing,
    /// A player completed a line. Terminal.
    Won,
    /// A player left. Terminal.
    Disconnected,
}

impl GameStatus {
    /// Won and disconnected games accept no further mutation.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Disconnected)
    }
}

/// Result of a move that was accepted by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The disc completed a line; the game is now won.
    Win,
    /// The disc landed and the turn moved on.
    Continue,
    /// The target column is full. The record is unchanged.
    Invalid,
}

/// Why a player could not take a seat in a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRejection {
    /// The game is full or already over.
    #[error("game is {0:?}, not open")]
    NotOpen(GameStatus),
    /// Another seat already uses this name.
    #[error("player `{0}` is already seated")]
    NameTaken(String),
}

/// Move attempts refused before reaching the board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The game reached a terminal status.
    #[error("game is over ({0:?})")]
    GameOver(GameStatus),
    /// The name does not belong to any seat.
    #[error("player `{0}` is not part of this game")]
    UnknownPlayer(String),
    /// Someone else is expected to move, or the game is waiting for a player.
    #[error("it is not `{0}`'s turn")]
    NotYourTurn(String),
}

/// Persisted state of a single connect-five game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Primary key, generated at creation.
    pub game_id: Uuid,
    /// Column-major grid.
    pub board: Board,
    /// Status of the game (open, playing, won, disconnected).
    pub game_status: GameStatus,
    /// Player names in join order; the index decides the disc.
    pub players: Vec<String>,
    /// Player expected to move next, `None` while waiting for a seat to fill.
    pub turn: Option<String>,
    /// Seats available, fixed at creation.
    pub max_players: usize,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the record was mutated.
    pub updated_at: SystemTime,
}

impl GameRecord {
    /// Fresh open game with `name` in the first seat and on turn.
    pub fn new(name: impl Into<String>, max_players: usize) -> Self {
        let name = name.into();
        let now = SystemTime::now();
        Self {
            game_id: Uuid::new_v4(),
            board: Board::new(),
            game_status: GameStatus::Open,
            players: vec![name.clone()],
            turn: Some(name),
            max_players,
            created_at: now,
            updated_at: now,
        }
    }

    /// True once every seat has a player.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Disc assigned to `name` by join order.
    pub fn disc_for(&self, name: &str) -> Option<Disc> {
        let seat = self.players.iter().position(|player| player == name)?;
        Disc::for_seat(seat)
    }

    /// Seat `name` in this game.
    ///
    /// Takes the turn when nobody holds it and flips the game to playing when
    /// the last seat fills.
    pub fn join(&mut self, name: &str) -> Result<(), JoinRejection> {
        if self.game_status != GameStatus::Open || self.is_full() {
            return Err(JoinRejection::NotOpen(self.game_status));
        }
        if self.players.iter().any(|player| player == name) {
            return Err(JoinRejection::NameTaken(name.to_owned()));
        }

        self.players.push(name.to_owned());
        if self.turn.is_none() {
            self.turn = Some(name.to_owned());
        }
        if self.is_full() {
            self.game_status = GameStatus::Playing;
        }
        self.touch();
        Ok(())
    }

    /// Drop `name`'s disc into the 1-based `column` and resolve the outcome.
    pub fn apply_move(&mut self, name: &str, column: usize) -> Result<MoveOutcome, RuleViolation> {
        if self.game_status.is_terminal() {
            return Err(RuleViolation::GameOver(self.game_status));
        }
        let disc = self
            .disc_for(name)
            .ok_or_else(|| RuleViolation::UnknownPlayer(name.to_owned()))?;
        if self.turn.as_deref() != Some(name) {
            return Err(RuleViolation::NotYourTurn(name.to_owned()));
        }

        let Some(landed) = self.board.make_move(column, disc) else {
            return Ok(MoveOutcome::Invalid);
        };

        if has_won(&self.board, disc, landed) {
            self.game_status = GameStatus::Won;
        } else {
            self.advance_turn(name);
        }
        self.touch();

        Ok(match self.game_status {
            GameStatus::Won => MoveOutcome::Win,
            _ => MoveOutcome::Continue,
        })
    }

    /// Hand the turn to the seat after `just_moved`.
    ///
    /// Wraps to the first seat only once every seat is taken; when the next
    /// seat is still empty the turn is cleared until someone joins.
    pub fn advance_turn(&mut self, just_moved: &str) {
        let Some(seat) = self.players.iter().position(|player| player == just_moved) else {
            return;
        };
        let next = seat + 1;
        self.turn = match self.players.get(next) {
            Some(player) => Some(player.clone()),
            None if next >= self.max_players => self.players.first().cloned(),
            None => None,
        };
    }

    /// Move to a terminal status: won when `won`, disconnected otherwise.
    pub fn finish(&mut self, won: bool) -> Result<(), RuleViolation> {
        if self.game_status.is_terminal() {
            return Err(RuleViolation::GameOver(self.game_status));
        }
        self.game_status = if won {
            GameStatus::Won
        } else {
            GameStatus::Disconnected
        };
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}
