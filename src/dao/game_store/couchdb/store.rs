use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::{debug, warn};

use crate::dao::{
    game_store::GameStore,
    models::{
        ChapterAppended, ChapterEntity, GameEntity, GameListItemEntity, NewGame, Section,
        sort_newest_first,
    },
    storage::StorageResult,
};

use super::{
    config::{CouchConfig, CouchCredentials},
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchGameDocument, CouchSlugDocument, END_SUFFIX, GAME_PREFIX,
        WriteResponse, extract_uuid, game_doc_id, slug_doc_id,
    },
};

/// Upper bound on read-merge-write rounds for one chapter append.
const MAX_APPEND_ATTEMPTS: u32 = 8;

/// CouchDB-backed [`GameStore`]: one `game::<uuid>` document per game plus
/// one `slug::<slug>` claim document reserving its slug.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<CouchCredentials>>,
}

impl CouchGameStore {
    /// Build the HTTP client and create the database when it is missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: Arc::from(format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.database
            )),
            credentials: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.as_deref() {
            Some(credentials) => {
                builder.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => builder,
        }
    }

    /// Send a request to `path` under the database, mapping transport failures.
    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> CouchResult<Response> {
        let url = if path.is_empty() {
            self.database_url.to_string()
        } else {
            format!("{}/{}", self.database_url, path)
        };
        let request = self.authorize(self.client.request(method.clone(), url));

        build(request)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                method,
                path: path.to_owned(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let probe = self.send(Method::GET, "", |req| req).await?;
        match probe.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(database = %self.database_url, "creating CouchDB database");
                let created = self.send(Method::PUT, "", |req| req).await?;
                match created.status() {
                    // 412: another instance created it first.
                    status if status.is_success() => Ok(()),
                    StatusCode::PRECONDITION_FAILED => Ok(()),
                    other => Err(unexpected(Method::PUT, "", other)),
                }
            }
            other => Err(unexpected(Method::GET, "", other)),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, doc_id, |req| req).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => decode::<T>(response, doc_id).await.map(Some),
            other => Err(unexpected(Method::GET, doc_id, other)),
        }
    }

    /// Write a document and return its new revision.
    ///
    /// A body without `_rev` only succeeds when the document does not exist yet;
    /// a body with a stale `_rev` is refused. Both surface as
    /// [`CouchDaoError::RevisionConflict`].
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .send(Method::PUT, doc_id, |req| req.json(document))
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                path: doc_id.to_owned(),
            }),
            status if status.is_success() => decode::<WriteResponse>(response, doc_id)
                .await
                .map(|written| written.rev),
            other => Err(unexpected(Method::PUT, doc_id, other)),
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .send(Method::DELETE, doc_id, |req| req.query(&[("rev", rev)]))
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected(Method::DELETE, doc_id, response.status()))
        }
    }

    /// Every document whose id starts with `prefix`, in id order.
    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let response = self
            .send(Method::GET, ALL_DOCS, |req| req.query(&query))
            .await?;
        if !response.status().is_success() {
            return Err(unexpected(Method::GET, ALL_DOCS, response.status()));
        }

        decode::<AllDocsResponse>(response, ALL_DOCS)
            .await?
            .rows
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| (row.id, doc)))
            .map(|(id, doc)| {
                from_value(doc)
                    .map_err(|source| CouchDaoError::MalformedDocument { path: id, source })
            })
            .collect()
    }

    /// Claim the slug first, then write the game; roll the claim back when the
    /// game write fails.
    async fn insert_game(&self, game: NewGame) -> CouchResult<GameEntity> {
        let entity = game.into_entity();
        let claim = CouchSlugDocument::claim(&entity.slug, entity.id);

        let claim_rev = match self.put_document(&claim.id, &claim).await {
            Ok(rev) => rev,
            Err(CouchDaoError::RevisionConflict { .. }) => {
                return Err(CouchDaoError::SlugTaken {
                    slug: entity.slug,
                });
            }
            Err(err) => return Err(err),
        };

        let document = CouchGameDocument::from(entity.clone());
        if let Err(err) = self.put_document(&document.id, &document).await {
            if let Err(rollback) = self.delete_document(&claim.id, &claim_rev).await {
                warn!(
                    slug = %entity.slug,
                    error = %rollback,
                    "failed to release slug claim after game write failure"
                );
            }
            return Err(err);
        }

        Ok(entity)
    }

    async fn find_document_by_slug(&self, slug: &str) -> CouchResult<Option<CouchGameDocument>> {
        let Some(claim) = self
            .get_document::<CouchSlugDocument>(&slug_doc_id(slug))
            .await?
        else {
            return Ok(None);
        };

        let doc_id = game_doc_id(claim.game_id);
        let document = self.get_document::<CouchGameDocument>(&doc_id).await?;
        if document.is_none() {
            // Claim written, game document not (yet) there.
            debug!(%slug, %doc_id, "slug claim without game document");
        }
        Ok(document)
    }

    async fn find_game_by_slug(&self, slug: &str) -> CouchResult<Option<GameEntity>> {
        self.find_document_by_slug(slug)
            .await?
            .map(GameEntity::try_from)
            .transpose()
    }

    async fn list_games(&self) -> CouchResult<Vec<GameListItemEntity>> {
        let documents = self
            .list_documents::<CouchGameDocument>(GAME_PREFIX)
            .await?;
        let mut items = documents
            .into_iter()
            .map(GameListItemEntity::try_from)
            .collect::<CouchResult<Vec<_>>>()?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Read-merge-write guarded by the document revision; a lost race re-reads
    /// and merges again instead of overwriting the other writer's chapter.
    async fn append_chapter(
        &self,
        slug: &str,
        section: Section,
        chapter: ChapterEntity,
    ) -> CouchResult<Option<ChapterAppended>> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let Some(mut document) = self.find_document_by_slug(slug).await? else {
                return Ok(None);
            };

            let position = document.game.sections.append(section, chapter.clone());
            match self.put_document(&document.id, &document).await {
                Ok(_) => {
                    let game_id = extract_uuid(&document.id)?;
                    return Ok(Some(ChapterAppended {
                        game_id,
                        section,
                        position,
                    }));
                }
                Err(CouchDaoError::RevisionConflict { .. }) => {
                    debug!(%slug, %section, attempt, "concurrent update detected; retrying append");
                }
                Err(err) => return Err(err),
            }
        }

        Err(CouchDaoError::AppendContention {
            slug: slug.to_owned(),
            attempts: MAX_APPEND_ATTEMPTS,
        })
    }
}

fn unexpected(method: Method, path: &str, status: StatusCode) -> CouchDaoError {
    CouchDaoError::UnexpectedStatus {
        method,
        path: path.to_owned(),
        status,
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> CouchResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|source| CouchDaoError::Decode {
            path: path.to_owned(),
            source,
        })
}

impl GameStore for CouchGameStore {
    fn insert_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game_by_slug(&slug).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn append_chapter(
        &self,
        slug: String,
        section: Section,
        chapter: ChapterEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ChapterAppended>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .append_chapter(&slug, section, chapter)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store.send(Method::GET, "", |req| req).await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(unexpected(Method::GET, "", response.status()).into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
