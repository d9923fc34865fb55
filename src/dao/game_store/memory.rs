//! In-process game store. Default backend and the one used by tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStore, GameTransaction, Revision},
        storage::StorageResult,
    },
    state::game::GameRecord,
};

struct StoredGame {
    record: GameRecord,
    revision: u64,
}

/// [`GameStore`] backed by a concurrent map.
///
/// Each record carries a revision counter bumped on every write. Commits
/// compare and swap while holding the entry's shard lock.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<Uuid, StoredGame>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no game has been stored.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    fn revision_of(&self, id: Uuid) -> Option<Revision> {
        self.games.get(&id).map(|stored| stored.revision.into())
    }

    fn put(&self, game: GameRecord) {
        match self.games.entry(game.game_id) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                stored.record = game;
                stored.revision += 1;
            }
            Entry::Vacant(entry) => {
                entry.insert(StoredGame {
                    record: game,
                    revision: 1,
                });
            }
        }
    }

    fn compare_and_swap(&self, transaction: &GameTransaction, game: GameRecord) -> bool {
        let Some(watched) = transaction.watched() else {
            return false;
        };
        let Some(mut stored) = self.games.get_mut(&transaction.game_id()) else {
            return false;
        };
        if Revision::from(stored.revision) != *watched {
            return false;
        }
        stored.record = game;
        stored.revision += 1;
        true
    }
}

impl GameStore for MemoryGameStore {
    fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
        let game = self.games.get(&id).map(|stored| stored.record.clone());
        Box::pin(async move { Ok(game) })
    }

    fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
        self.put(game);
        Box::pin(async { Ok(()) })
    }

    fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let ids = self.games.iter().map(|entry| *entry.key()).collect();
        Box::pin(async move { Ok(ids) })
    }

    fn begin_transaction(&self, id: Uuid) -> BoxFuture<'static, StorageResult<GameTransaction>> {
        let transaction = GameTransaction::new(id, self.revision_of(id));
        Box::pin(async move { Ok(transaction) })
    }

    fn read_in_transaction(
        &self,
        transaction: &GameTransaction,
    ) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
        self.get_game(transaction.game_id())
    }

    fn commit_transaction(
        &self,
        transaction: GameTransaction,
        game: GameRecord,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let committed = self.compare_and_swap(&transaction, game);
        Box::pin(async move { Ok(committed) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
