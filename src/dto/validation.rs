//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::{config::PLAYER_RANGE, state::board::BOARD_COLUMNS};

/// Player names must contain something other than whitespace.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Columns are 1-based and must exist on the board.
pub fn validate_column(column: usize) -> Result<(), ValidationError> {
    if !(1..=BOARD_COLUMNS).contains(&column) {
        let mut err = ValidationError::new("column_range");
        err.message =
            Some(format!("Column must be between 1 and {BOARD_COLUMNS} (got {column})").into());
        return Err(err);
    }
    Ok(())
}

/// A game seats two or three players.
pub fn validate_max_players(max_players: usize) -> Result<(), ValidationError> {
    let (min, max) = PLAYER_RANGE;
    if !(min..=max).contains(&max_players) {
        let mut err = ValidationError::new("max_players_range");
        err.message =
            Some(format!("max_players must be between {min} and {max} (got {max_players})").into());
        return Err(err);
    }
    Ok(())
}
