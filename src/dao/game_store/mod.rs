/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    ChapterAppended, ChapterEntity, GameEntity, GameListItemEntity, NewGame, Section,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for games and their chapters.
///
/// `append_chapter` must be atomic with respect to other appends on the same
/// record: two concurrent calls both end up stored.
pub trait GameStore: Send + Sync {
    /// Store a new game; fails with `DuplicateSlug` when the slug is taken.
    fn insert_game(&self, game: NewGame) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// The game named by `slug`, if any.
    fn find_game_by_slug(&self, slug: String)
    -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Games ordered by creation time, newest first.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>>;
    /// Append `chapter` to `section` of the game named by `slug`; `None` when no such game.
    fn append_chapter(
        &self,
        slug: String,
        section: Section,
        chapter: ChapterEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ChapterAppended>>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
