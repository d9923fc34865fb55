use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::state::{
    board::Board,
    game::{GameRecord, GameStatus},
};

/// Game record as stored in MongoDB.
///
/// `revision` is regenerated on every write; transactional commits filter on
/// the revision they watched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub revision: String,
    board: Board,
    game_status: GameStatus,
    players: Vec<String>,
    turn: Option<String>,
    max_players: i64,
    created_at: DateTime,
    updated_at: DateTime,
}

impl MongoGameDocument {
    /// Wrap `game` under a fresh revision tag.
    pub fn new(game: GameRecord) -> Self {
        Self {
            id: game.game_id.to_string(),
            revision: fresh_revision(),
            board: game.board,
            game_status: game.game_status,
            players: game.players,
            turn: game.turn,
            max_players: i64::try_from(game.max_players).unwrap_or(i64::MAX),
            created_at: DateTime::from_system_time(game.created_at),
            updated_at: DateTime::from_system_time(game.updated_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameRecord {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        let game_id = Uuid::parse_str(&value.id).map_err(|_| MongoDaoError::InvalidDocId {
            doc_id: value.id.clone(),
            kind: "invalid UUID",
        })?;
        let max_players =
            usize::try_from(value.max_players).map_err(|_| MongoDaoError::InvalidDocId {
                doc_id: value.id.clone(),
                kind: "negative max_players",
            })?;

        Ok(Self {
            game_id,
            board: value.board,
            game_status: value.game_status,
            players: value.players,
            turn: value.turn,
            max_players,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

fn fresh_revision() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

/// Filter matching `id` only while it still carries `revision`.
pub fn watched_doc(id: Uuid, revision: &str) -> Document {
    doc! {"_id": id.to_string(), "revision": revision}
}
