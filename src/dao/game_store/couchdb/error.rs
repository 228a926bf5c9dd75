//! Failures of the CouchDB backend.

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Result alias of the CouchDB backend.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failure talking to CouchDB or interpreting its answers.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required setting is absent.
    #[error("environment variable `{var}` is required for the CouchDB backend")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be created.
    #[error("could not build the CouchDB HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an answer.
    #[error("CouchDB {method} `{path}` failed")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A status the operation does not handle.
    #[error("CouchDB {method} `{path}` answered {status}")]
    UnexpectedStatus {
        method: Method,
        path: String,
        status: StatusCode,
    },
    /// `409`: stale `_rev`, or the document already exists.
    #[error("CouchDB revision conflict on `{path}`")]
    RevisionConflict { path: String },
    /// The response body could not be read as the expected JSON.
    #[error("CouchDB answer for `{path}` is not valid JSON")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A stored document has an unexpected shape.
    #[error("CouchDB document `{path}` does not match the game schema")]
    MalformedDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The slug claim document already exists.
    #[error("game slug `{slug}` already exists")]
    SlugTaken { slug: String },
    /// Every append round lost its revision race.
    #[error("gave up appending to game `{slug}` after {attempts} conflicting attempt(s)")]
    AppendContention { slug: String, attempts: u32 },
    /// A document id without the `<prefix>::<uuid>` shape.
    #[error("document id `{doc_id}` is not a game id: {kind}")]
    InvalidDocId { doc_id: String, kind: &'static str },
}
