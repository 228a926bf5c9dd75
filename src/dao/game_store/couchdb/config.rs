use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DB: &str = "game_chapters";
const BASE_URL_ENV: &str = "COUCH_BASE_URL";

/// Basic-auth pair sent with every CouchDB request.
#[derive(Debug, Clone)]
pub struct CouchCredentials {
    /// `COUCH_USERNAME`.
    pub username: String,
    /// `COUCH_PASSWORD`.
    pub password: String,
}

/// Where the CouchDB backend lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the game and slug documents.
    pub database: String,
    /// Basic-auth pair; `None` for an open server.
    pub credentials: Option<CouchCredentials>,
}

impl CouchConfig {
    /// `COUCH_BASE_URL` is required; `COUCH_DB` falls back to `game_chapters`;
    /// credentials are used only when both `COUCH_USERNAME` and
    /// `COUCH_PASSWORD` are set.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var(BASE_URL_ENV)
            .map_err(|_| CouchDaoError::MissingEnvVar { var: BASE_URL_ENV })?;
        let database = env::var("COUCH_DB")
            .ok()
            .filter(|db| !db.is_empty())
            .unwrap_or_else(|| DEFAULT_DB.to_owned());
        let credentials = env::var("COUCH_USERNAME")
            .ok()
            .zip(env::var("COUCH_PASSWORD").ok())
            .map(|(username, password)| CouchCredentials { username, password });

        Ok(Self {
            base_url,
            database,
            credentials,
        })
    }
}
