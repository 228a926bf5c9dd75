use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias of the MongoDB backend.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failure of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// `MONGO_URI` could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// The server never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// A health check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// Writing a new game failed.
    #[error("failed to insert game `{id}`")]
    InsertGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// The unique slug index refused the insert.
    #[error("game slug `{slug}` already exists")]
    DuplicateSlug {
        slug: String,
        #[source]
        source: MongoError,
    },
    /// Reading a game failed.
    #[error("failed to load game with slug `{slug}`")]
    LoadGame {
        slug: String,
        #[source]
        source: MongoError,
    },
    /// Listing games failed.
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    /// The `$push` update failed.
    #[error("failed to append chapter to `{section}` of game `{slug}`")]
    AppendChapter {
        slug: String,
        section: &'static str,
        #[source]
        source: MongoError,
    },
    /// A stored `_id` is not a UUID.
    #[error("stored game `{id}` has a malformed record id")]
    InvalidRecordId {
        id: String,
        #[source]
        source: uuid::Error,
    },
}
