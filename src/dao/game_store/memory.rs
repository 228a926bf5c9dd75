//! In-process [`GameStore`] used for local development and tests.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{
        ChapterAppended, ChapterEntity, GameEntity, GameListItemEntity, NewGame, Section,
        sort_newest_first,
    },
    storage::{StorageError, StorageResult},
};

/// Games kept in memory; nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, GameEntity>,
    slugs: DashMap<String, Uuid>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, game: NewGame) -> StorageResult<GameEntity> {
        let entity = game.into_entity();
        match self.inner.slugs.entry(entity.slug.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateSlug(entity.slug)),
            Entry::Vacant(slot) => {
                // Insert the record while the slug shard is still locked so a
                // lookup never sees the claim without its game.
                self.inner.games.insert(entity.id, entity.clone());
                slot.insert(entity.id);
                Ok(entity)
            }
        }
    }

    fn find(&self, slug: &str) -> Option<GameEntity> {
        let id = *self.inner.slugs.get(slug)?;
        self.inner.games.get(&id).map(|game| game.value().clone())
    }

    fn list(&self) -> Vec<GameListItemEntity> {
        let mut items = self
            .inner
            .games
            .iter()
            .map(|game| game.value().clone().into())
            .collect::<Vec<GameListItemEntity>>();
        sort_newest_first(&mut items);
        items
    }

    fn append(
        &self,
        slug: &str,
        section: Section,
        chapter: ChapterEntity,
    ) -> Option<ChapterAppended> {
        let id = *self.inner.slugs.get(slug)?;
        // The shard write lock makes read, merge and write-back one step.
        let mut game = self.inner.games.get_mut(&id)?;
        let position = game.sections.append(section, chapter);
        Some(ChapterAppended {
            game_id: id,
            section,
            position,
        })
    }
}

impl GameStore for MemoryGameStore {
    fn insert_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let result = self.insert(game);
        Box::pin(async move { result })
    }

    fn find_game_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let found = self.find(&slug);
        Box::pin(async move { Ok(found) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let items = self.list();
        Box::pin(async move { Ok(items) })
    }

    fn append_chapter(
        &self,
        slug: String,
        section: Section,
        chapter: ChapterEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ChapterAppended>>> {
        let appended = self.append(&slug, section, chapter);
        Box::pin(async move { Ok(appended) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{Actor, DEFAULT_POPULARITY};

    fn actor() -> Actor {
        Actor {
            id: "uid-7".into(),
            email: "admin@example.com".into(),
        }
    }

    fn new_game(slug: &str) -> NewGame {
        NewGame {
            slug: slug.into(),
            title: format!("{slug} title"),
            description: "desc".into(),
            includes: vec![Section::MainStory],
            thumbnail_url: "https://i.ibb.co/x/thumb.png".into(),
            popularity: DEFAULT_POPULARITY,
            actor: actor(),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let store = MemoryGameStore::new();
        store.insert_game(new_game("dup")).await.unwrap();

        let err = store.insert_game(new_game("dup")).await.unwrap_err();

        assert!(matches!(err, StorageError::DuplicateSlug(slug) if slug == "dup"));
        assert_eq!(store.list_games().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_to_unknown_slug_changes_nothing() {
        let store = MemoryGameStore::new();
        let created = store.insert_game(new_game("known")).await.unwrap();

        let outcome = store
            .append_chapter(
                "missing".into(),
                Section::MainStory,
                ChapterEntity::new("t".into(), "c".into(), &actor()),
            )
            .await
            .unwrap();

        assert!(outcome.is_none());
        let stored = store.find_game_by_slug("known".into()).await.unwrap();
        assert_eq!(stored, Some(created));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_kept() {
        let store = MemoryGameStore::new();
        store.insert_game(new_game("busy")).await.unwrap();

        let tasks = (0..32)
            .map(|n| {
                let store = store.clone();
                let section = Section::ALL[n % 2];
                tokio::spawn(async move {
                    store
                        .append_chapter(
                            "busy".into(),
                            section,
                            ChapterEntity::new(format!("chapter {n}"), "c".into(), &actor()),
                        )
                        .await
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        let game = store.find_game_by_slug("busy".into()).await.unwrap().unwrap();
        assert_eq!(game.sections.chapters(Section::MainStory).len(), 16);
        assert_eq!(game.sections.chapters(Section::CharacterStory).len(), 16);
    }
}
