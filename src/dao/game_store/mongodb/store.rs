use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::{establish_connection, ping},
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, doc_id, watched_doc},
};
use crate::{
    dao::{
        game_store::{GameStore, GameTransaction, Revision},
        storage::StorageResult,
    },
    state::game::GameRecord,
};

const GAME_COLLECTION_NAME: &str = "games";

/// [`GameStore`](crate::dao::game_store::GameStore) over a MongoDB collection.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Held so the connection pool lives as long as the database handle.
    _client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();
        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard._client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState {
                _client: client,
                database,
            }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn find_document(&self, id: Uuid) -> MongoResult<Option<MongoGameDocument>> {
        self.collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameRecord>> {
        self.find_document(id)
            .await?
            .map(GameRecord::try_from)
            .transpose()
    }

    async fn save_game(&self, game: GameRecord) -> MongoResult<()> {
        let id = game.game_id;
        let document = MongoGameDocument::new(game);
        self.collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn list_game_ids(&self) -> MongoResult<Vec<Uuid>> {
        let values = self
            .collection()
            .await
            .distinct("_id", mongodb::bson::doc! {})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        values
            .iter()
            .map(|value| {
                let raw = value.as_str().ok_or_else(|| MongoDaoError::InvalidDocId {
                    doc_id: value.to_string(),
                    kind: "non-string _id",
                })?;
                Uuid::parse_str(raw).map_err(|_| MongoDaoError::InvalidDocId {
                    doc_id: raw.to_owned(),
                    kind: "invalid UUID",
                })
            })
            .collect()
    }

    async fn begin(&self, id: Uuid) -> MongoResult<GameTransaction> {
        let revision = self
            .find_document(id)
            .await?
            .map(|document| Revision::from(document.revision));
        Ok(GameTransaction::new(id, revision))
    }

    async fn commit(&self, transaction: GameTransaction, game: GameRecord) -> MongoResult<bool> {
        let Some(watched) = transaction.watched() else {
            return Ok(false);
        };
        let id = transaction.game_id();
        let document = MongoGameDocument::new(game);
        let result = self
            .collection()
            .await
            .replace_one(watched_doc(id, watched.as_str()), &document)
            .await
            .map_err(|source| MongoDaoError::CommitGame { id, source })?;
        Ok(result.matched_count == 1)
    }
}

impl GameStore for MongoGameStore {
    fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.list_game_ids().await.map_err(Into::into) })
    }

    fn begin_transaction(&self, id: Uuid) -> BoxFuture<'static, StorageResult<GameTransaction>> {
        let store = self.clone();
        Box::pin(async move { store.begin(id).await.map_err(Into::into) })
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
        let store = self.clone();
        Box::pin(async move { store.commit(transaction, game).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
