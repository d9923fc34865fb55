/// CouchDB backend keyed by `game:<uuid>` documents.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend with one document per game.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::fmt;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::storage::StorageResult;
use crate::state::game::GameRecord;

/// Opaque version token of a stored record.
///
/// Every write produces a new revision; a transaction commits only if the
/// revision it watched is still current.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Raw token as understood by the backend that issued it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Revision {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Watch on a single game key, opened by [`GameStore::begin_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTransaction {
    game_id: Uuid,
    watched: Option<Revision>,
}

impl GameTransaction {
    /// Watch `game_id` at `watched`; `None` means the key did not exist.
    pub fn new(game_id: Uuid, watched: Option<Revision>) -> Self {
        Self { game_id, watched }
    }

    /// Key under watch.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Revision observed when the watch began.
    pub fn watched(&self) -> Option<&Revision> {
        self.watched.as_ref()
    }
}

/// Abstraction over the key-value backend holding game records.
///
/// `save_game` overwrites unconditionally. The transaction trio implements
/// optimistic concurrency: `commit_transaction` writes only when the record
/// has not changed since `begin_transaction`, and reports `false` otherwise.
pub trait GameStore: Send + Sync {
    /// Load the record stored under `id`, `None` when the key is absent.
    fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>>;

    /// Write `game` under its id, replacing any previous record.
    ///
    /// Bumps the revision, so open watches on the key will fail to commit.
    fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>>;

    /// Ids of every stored game, in backend order.
    fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>>;

    /// Start watching `id` at its current revision.
    fn begin_transaction(&self, id: Uuid) -> BoxFuture<'static, StorageResult<GameTransaction>>;

    /// Read the watched record, `None` when it vanished.
    fn read_in_transaction(
        &self,
        transaction: &GameTransaction,
    ) -> BoxFuture<'static, StorageResult<Option<GameRecord>>>;

    /// Write `game` if the watched revision is still current.
    ///
    /// `Ok(false)` means another writer got there first and nothing was written.
    /// A watch on a missing key never commits.
    fn commit_transaction(
        &self,
        transaction: GameTransaction,
        game: GameRecord,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap round trip proving the backend still answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
