use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStore, GameTransaction, Revision},
        storage::StorageResult,
    },
    state::game::GameRecord,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchGameDocument, END_SUFFIX, GAME_PREFIX, extract_uuid, game_doc_id,
    },
};

/// Attempts made by an unconditional save before reporting contention.
const SAVE_ATTEMPTS: u32 = 3;

/// Outcome of a PUT guarded by a document revision.
enum PutOutcome {
    Stored,
    Conflict,
}

/// [`GameStore`](crate::dao::game_store::GameStore) speaking the CouchDB HTTP API.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: another instance created it first.
                let status = create.status();
                if status.is_success() || status == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus { database, status })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document. CouchDB answers 409 when `_rev` is not the current one.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Stored),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn current_revision(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<CouchGameDocument>(doc_id)
            .await?
            .and_then(|doc| doc.rev))
    }

    async fn overwrite(&self, game: GameRecord) -> CouchResult<()> {
        let doc_id = game_doc_id(game.game_id);
        for attempt in 1..=SAVE_ATTEMPTS {
            let rev = self.current_revision(&doc_id).await?;
            let doc = CouchGameDocument::from((game.clone(), rev));
            match self.put_document(&doc_id, &doc).await? {
                PutOutcome::Stored => return Ok(()),
                PutOutcome::Conflict => {
                    debug!(%doc_id, attempt, "revision moved during save; retrying");
                }
            }
        }
        Err(CouchDaoError::SaveContention {
            doc_id,
            attempts: SAVE_ATTEMPTS,
        })
    }

    async fn commit(&self, transaction: GameTransaction, game: GameRecord) -> CouchResult<bool> {
        let Some(watched) = transaction.watched() else {
            return Ok(false);
        };
        let doc_id = game_doc_id(transaction.game_id());
        let doc = CouchGameDocument::from((game, Some(watched.as_str().to_owned())));
        match self.put_document(&doc_id, &doc).await? {
            PutOutcome::Stored => Ok(true),
            PutOutcome::Conflict => Ok(false),
        }
    }

    async fn list_game_ids(&self) -> CouchResult<Vec<Uuid>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("startkey", format!("\"{}\"", GAME_PREFIX)),
            ("endkey", format!("\"{}{}\"", GAME_PREFIX, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .iter()
            .map(|row| extract_uuid(&row.id))
            .collect()
    }

    async fn ping(&self) -> CouchResult<()> {
        let url = self.database_url();
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: url,
                status: response.status(),
            })
        }
    }
}

impl GameStore for CouchGameStore {
    fn get_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = game_doc_id(id);
            let maybe_doc = store.get_document::<CouchGameDocument>(&doc_id).await?;
            Ok(maybe_doc.map(|doc| doc.game))
        })
    }

    fn save_game(&self, game: GameRecord) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.overwrite(game).await.map_err(Into::into) })
    }

    fn scan_games(&self) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.list_game_ids().await.map_err(Into::into) })
    }

    fn begin_transaction(&self, id: Uuid) -> BoxFuture<'static, StorageResult<GameTransaction>> {
        let store = self.clone();
        Box::pin(async move {
            let rev = store.current_revision(&game_doc_id(id)).await?;
            Ok(GameTransaction::new(id, rev.map(Revision::from)))
        })
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
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
