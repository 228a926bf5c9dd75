use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    game_store::couchdb::error::CouchDaoError,
    models::{GameEntity, GameListItemEntity, Section, Sections},
};

pub const GAME_PREFIX: &str = "game::";
pub const SLUG_PREFIX: &str = "slug::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Body CouchDB returns after a successful write.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameBody {
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub includes: Vec<Section>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    pub popularity: i64,
    #[serde(default)]
    pub sections: Sections,
    pub created_at: SystemTime,
    pub created_by: String,
    pub created_by_email: String,
}

impl From<GameEntity> for CouchGameDocument {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game_doc_id(game.id),
            rev: None,
            game: GameBody {
                slug: game.slug,
                title: game.title,
                description: game.description,
                includes: game.includes,
                thumbnail_url: game.thumbnail_url,
                popularity: game.popularity,
                sections: game.sections,
                created_at: game.created_at,
                created_by: game.created_by,
                created_by_email: game.created_by_email,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        let mut sections = doc.game.sections;
        sections.ensure_known();

        Ok(Self {
            id: extract_uuid(&doc.id)?,
            slug: doc.game.slug,
            title: doc.game.title,
            description: doc.game.description,
            includes: doc.game.includes,
            thumbnail_url: doc.game.thumbnail_url,
            popularity: doc.game.popularity,
            sections,
            created_at: doc.game.created_at,
            created_by: doc.game.created_by,
            created_by_email: doc.game.created_by_email,
        })
    }
}

impl TryFrom<CouchGameDocument> for GameListItemEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            slug: doc.game.slug,
            title: doc.game.title,
            created_at: doc.game.created_at,
        })
    }
}

/// Claim document reserving a slug for exactly one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSlugDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub game_id: Uuid,
}

impl CouchSlugDocument {
    pub fn claim(slug: &str, game_id: Uuid) -> Self {
        Self {
            id: slug_doc_id(slug),
            rev: None,
            game_id,
        }
    }
}

pub fn game_doc_id(id: Uuid) -> String {
    format!("{}{}", GAME_PREFIX, id)
}

pub fn slug_doc_id(slug: &str) -> String {
    format!("{}{}", SLUG_PREFIX, slug)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}
