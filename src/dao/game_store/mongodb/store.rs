use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGameDocument, MongoGameListDocument, doc_slug, newest_first, oldest_first,
        push_chapter,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{
        ChapterAppended, ChapterEntity, GameEntity, GameListItemEntity, NewGame, Section,
    },
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed [`GameStore`] implementation.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept alive alongside the database handle it produced.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;

        let slug_index = IndexModel::builder()
            .keys(doc! {"slug": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_slug_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        match collection.create_index(slug_index).await {
            Ok(_) => {}
            // Legacy data already holds a duplicated slug; lookups fall back to
            // the oldest record and new duplicates are not blocked.
            Err(source) if is_duplicate_key(&source) => {
                warn!(error = %source, "duplicate slugs present; unique slug index not created");
            }
            Err(source) => {
                return Err(MongoDaoError::EnsureIndex {
                    collection: GAME_COLLECTION_NAME,
                    index: "slug",
                    source,
                });
            }
        }

        let created_index = IndexModel::builder()
            .keys(newest_first())
            .options(
                IndexOptions::builder()
                    .name(Some("game_created_at_idx".to_owned()))
                    .build(),
            )
            .build();
        collection
            .create_index(created_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "createdAt",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: NewGame) -> MongoResult<GameEntity> {
        let entity = game.into_entity();
        let id = entity.id;
        let slug = entity.slug.clone();
        let document: MongoGameDocument = entity.clone().into();

        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateSlug { slug, source }
                } else {
                    MongoDaoError::InsertGame { id, source }
                }
            })?;

        Ok(entity)
    }

    async fn find_game_by_slug(&self, slug: String) -> MongoResult<Option<GameEntity>> {
        let document = self
            .collection()
            .await
            .find_one(doc_slug(&slug))
            .sort(oldest_first())
            .await
            .map_err(|source| MongoDaoError::LoadGame { slug, source })?;

        document.map(GameEntity::try_from).transpose()
    }

    async fn list_games(&self) -> MongoResult<Vec<GameListItemEntity>> {
        let collection = self
            .collection()
            .await
            .clone_with_type::<MongoGameListDocument>();

        let documents: Vec<MongoGameListDocument> = collection
            .find(doc! {})
            .projection(doc! {"slug": 1, "title": 1, "createdAt": 1})
            .sort(newest_first())
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        documents
            .into_iter()
            .map(GameListItemEntity::try_from)
            .collect()
    }

    /// Push the chapter server-side so concurrent appends cannot overwrite each other.
    async fn append_chapter(
        &self,
        slug: String,
        section: Section,
        chapter: ChapterEntity,
    ) -> MongoResult<Option<ChapterAppended>> {
        let updated = self
            .collection()
            .await
            .find_one_and_update(doc_slug(&slug), push_chapter(section, chapter))
            .sort(oldest_first())
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::AppendChapter {
                slug: slug.clone(),
                section: section.as_str(),
                source,
            })?;

        let Some(document) = updated else {
            return Ok(None);
        };

        let game = GameEntity::try_from(document)?;
        let position = game.sections.chapters(section).len().saturating_sub(1);
        debug!(%slug, %section, position, "chapter pushed");

        Ok(Some(ChapterAppended {
            game_id: game.id,
            section,
            position,
        }))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl GameStore for MongoGameStore {
    fn insert_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game_by_slug(slug).await.map_err(Into::into) })
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
                .append_chapter(slug, section, chapter)
                .await
                .map_err(Into::into)
        })
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
