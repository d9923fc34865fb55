use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, storage::StorageResult},
    state::game::JoinRejection,
};

/// Result of one atomic join attempt against a single game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinAttempt {
    /// The player now holds a seat.
    Joined,
    /// The game cannot take this player; nothing was written.
    Rejected(JoinRejection),
    /// Someone else wrote the game between read and commit.
    Conflict,
    /// The key disappeared before it could be read.
    Missing,
}

/// Seat `name` in the first open game that accepts them.
///
/// Every scanned game is read, but at most `max_attempts` commits are tried.
/// Full, finished or vanished games cost a read only, so an open game stays
/// reachable however many closed ones precede it. Lost commits are not
/// retried; the search just moves on.
pub async fn join_game(
    store: &dyn GameStore,
    name: &str,
    max_attempts: usize,
) -> StorageResult<Option<Uuid>> {
    let candidates = store.scan_games().await?;
    let mut attempts = 0;

    for game_id in candidates {
        if attempts >= max_attempts {
            debug!(player = name, attempts, "join attempt budget spent");
            break;
        }
        match try_join(store, name, game_id).await? {
            JoinAttempt::Joined => {
                info!(%game_id, player = name, "player joined open game");
                return Ok(Some(game_id));
            }
            JoinAttempt::Rejected(reason) => {
                debug!(%game_id, player = name, %reason, "candidate rejected player");
            }
            JoinAttempt::Conflict => {
                attempts += 1;
                debug!(%game_id, player = name, "lost join race; trying next candidate");
            }
            JoinAttempt::Missing => {}
        }
    }

    debug!(player = name, "no open game found");
    Ok(None)
}

/// Watch `game_id`, re-read it, seat `name` and commit if nobody wrote in between.
pub async fn try_join(
    store: &dyn GameStore,
    name: &str,
    game_id: Uuid,
) -> StorageResult<JoinAttempt> {
    let transaction = store.begin_transaction(game_id).await?;
    let Some(mut game) = store.read_in_transaction(&transaction).await? else {
        return Ok(JoinAttempt::Missing);
    };

    if let Err(rejection) = game.join(name) {
        return Ok(JoinAttempt::Rejected(rejection));
    }

    if store.commit_transaction(transaction, game).await? {
        Ok(JoinAttempt::Joined)
    } else {
        Ok(JoinAttempt::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::game_store::{GameTransaction, memory::MemoryGameStore},
        state::game::{GameRecord, GameStatus},
    };

    /// Lets `rival` take a seat right after the first transactional read.
    struct RacingStore {
        inner: MemoryGameStore,
        rival: String,
        raced: AtomicBool,
    }

    impl GameStore for RacingStore {
        fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
            self.inner.get_game(id)
        }

        fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_game(game)
        }

        fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
            self.inner.scan_games()
        }

        fn begin_transaction(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<GameTransaction>> {
            self.inner.begin_transaction(id)
        }

        fn read_in_transaction(
            &self,
            transaction: &GameTransaction,
        ) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
            let read = self.inner.read_in_transaction(transaction);
            if self.raced.swap(true, Ordering::SeqCst) {
                return read;
            }
            let inner = self.inner.clone();
            let rival = self.rival.clone();
            let id = transaction.game_id();
            Box::pin(async move {
                let seen = read.await?;
                if let Some(mut game) = inner.get_game(id).await? {
                    game.join(&rival).expect("rival seat");
                    inner.save_game(game).await?;
                }
                Ok(seen)
            })
        }

        fn commit_transaction(
            &self,
            transaction: GameTransaction,
            game: GameRecord,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.commit_transaction(transaction, game)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    /// Parks every transactional read behind a scheduler yield so that
    /// concurrent joiners interleave between read and commit.
    struct YieldingStore {
        inner: MemoryGameStore,
    }

    impl GameStore for YieldingStore {
        fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
            self.inner.get_game(id)
        }

        fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_game(game)
        }

        fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
            self.inner.scan_games()
        }

        fn begin_transaction(
            &self,
            id: Uuid,
        ) -> BoxFuture<'static, StorageResult<GameTransaction>> {
            self.inner.begin_transaction(id)
        }

        fn read_in_transaction(
            &self,
            transaction: &GameTransaction,
        ) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
            let read = self.inner.read_in_transaction(transaction);
            Box::pin(async move {
                let seen = read.await?;
                tokio::task::yield_now().await;
                Ok(seen)
            })
        }

        fn commit_transaction(
            &self,
            transaction: GameTransaction,
            game: GameRecord,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.commit_transaction(transaction, game)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    async fn seeded(games: Vec<GameRecord>) -> MemoryGameStore {
        let store = MemoryGameStore::new();
        for game in games {
            store.save_game(game).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn joins_the_only_open_game() {
        let game = GameRecord::new("ann", 2);
        let store = seeded(vec![game.clone()]).await;

        let joined = join_game(&store, "bob", 64).await.unwrap();
        assert_eq!(joined, Some(game.game_id));

        let stored = store.get_game(game.game_id).await.unwrap().unwrap();
        assert_eq!(stored.players, vec!["ann", "bob"]);
        assert_eq!(stored.game_status, GameStatus::Playing);
        assert_eq!(stored.turn.as_deref(), Some("ann"));
    }

    #[tokio::test]
    async fn empty_store_finds_nothing() {
        let store = MemoryGameStore::new();
        assert_eq!(join_game(&store, "bob", 64).await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_attempt_budget_joins_nothing() {
        let game = GameRecord::new("ann", 2);
        let store = seeded(vec![game.clone()]).await;
        assert_eq!(join_game(&store, "bob", 0).await.unwrap(), None);
        assert_eq!(store.get_game(game.game_id).await.unwrap(), Some(game));
    }

    #[tokio::test]
    async fn seated_player_is_sent_to_another_game() {
        let own = GameRecord::new("ann", 3);
        let other = GameRecord::new("dan", 2);
        let store = seeded(vec![own.clone(), other.clone()]).await;

        assert_eq!(
            try_join(&store, "ann", own.game_id).await.unwrap(),
            JoinAttempt::Rejected(JoinRejection::NameTaken("ann".into()))
        );
        assert_eq!(join_game(&store, "ann", 64).await.unwrap(), Some(other.game_id));
        assert_eq!(store.get_game(own.game_id).await.unwrap(), Some(own));
    }

    #[tokio::test]
    async fn full_and_finished_games_are_skipped() {
        let mut full = GameRecord::new("ann", 2);
        full.join("bob").unwrap();
        let mut left = GameRecord::new("cat", 2);
        left.finish(false).unwrap();
        let store = seeded(vec![full.clone(), left.clone()]).await;

        assert_eq!(join_game(&store, "dan", 64).await.unwrap(), None);
        assert_eq!(
            try_join(&store, "dan", left.game_id).await.unwrap(),
            JoinAttempt::Rejected(JoinRejection::NotOpen(GameStatus::Disconnected))
        );
    }

    #[tokio::test]
    async fn open_game_behind_many_finished_ones_is_found() {
        let mut games = Vec::new();
        for index in 0..200 {
            let mut left = GameRecord::new(&format!("gone-{index}"), 2);
            left.finish(false).unwrap();
            games.push(left);
        }
        let open = GameRecord::new("ann", 2);
        games.push(open.clone());
        let store = seeded(games).await;

        assert_eq!(join_game(&store, "bob", 4).await.unwrap(), Some(open.game_id));
    }

    #[tokio::test]
    async fn losing_the_race_for_the_last_seat_joins_nothing() {
        let game = GameRecord::new("ann", 2);
        let store = RacingStore {
            inner: seeded(vec![game.clone()]).await,
            rival: "cat".into(),
            raced: AtomicBool::new(false),
        };

        assert_eq!(join_game(&store, "bob", 64).await.unwrap(), None);

        let stored = store.get_game(game.game_id).await.unwrap().unwrap();
        assert_eq!(stored.players, vec!["ann", "cat"]);
        assert_eq!(stored.game_status, GameStatus::Playing);
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let store = MemoryGameStore::new();
        assert_eq!(
            try_join(&store, "bob", Uuid::new_v4()).await.unwrap(),
            JoinAttempt::Missing
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_joiners_share_one_seat() {
        let game = GameRecord::new("ann", 2);
        let store: Arc<dyn GameStore> = Arc::new(YieldingStore {
            inner: seeded(vec![game.clone()]).await,
        });
        let start = Arc::new(tokio::sync::Barrier::new(3));

        let handles = ["bob", "cat", "dan"].map(|name| {
            let store = store.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                join_game(store.as_ref(), name, 64).await
            })
        });

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let stored = store.get_game(game.game_id).await.unwrap().unwrap();
        assert_eq!(stored.players.len(), 2);
        assert_eq!(stored.game_status, GameStatus::Playing);
    }
}
