use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{ChapterEntity, GameEntity, GameListItemEntity, Section, Sections};

use super::error::MongoDaoError;

/// Game document as stored in the `games` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub includes: Vec<Section>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    pub popularity: i64,
    #[serde(default)]
    pub sections: IndexMap<String, Vec<MongoChapterDocument>>,
    pub created_at: DateTime,
    pub created_by: String,
    pub created_by_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoChapterDocument {
    pub title: String,
    pub content: String,
    pub created_at: DateTime,
    pub created_by: String,
    pub created_by_email: String,
}

/// Only the fields needed to populate a game picker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoGameListDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    pub created_at: DateTime,
}

impl From<ChapterEntity> for MongoChapterDocument {
    fn from(value: ChapterEntity) -> Self {
        Self {
            title: value.title,
            content: value.content,
            created_at: DateTime::from_system_time(value.created_at),
            created_by: value.created_by,
            created_by_email: value.created_by_email,
        }
    }
}

impl From<MongoChapterDocument> for ChapterEntity {
    fn from(value: MongoChapterDocument) -> Self {
        Self {
            title: value.title,
            content: value.content,
            created_at: value.created_at.to_system_time(),
            created_by: value.created_by,
            created_by_email: value.created_by_email,
        }
    }
}

impl MongoChapterDocument {
    fn to_document(&self) -> Document {
        doc! {
            "title": &self.title,
            "content": &self.content,
            "createdAt": self.created_at,
            "createdBy": &self.created_by,
            "createdByEmail": &self.created_by_email,
        }
    }
}

/// `$push` update appending `chapter` to `sections.<section>`; the server
/// creates the array when the key is missing.
pub fn push_chapter(section: Section, chapter: ChapterEntity) -> Document {
    let mut push = Document::new();
    push.insert(
        format!("sections.{}", section.as_str()),
        MongoChapterDocument::from(chapter).to_document(),
    );
    doc! {"$push": push}
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        let sections = value
            .sections
            .into_iter()
            .map(|(key, chapters)| (key, chapters.into_iter().map(Into::into).collect()))
            .collect();

        Self {
            id: value.id.to_string(),
            slug: value.slug,
            title: value.title,
            description: value.description,
            includes: value.includes,
            thumbnail_url: value.thumbnail_url,
            popularity: value.popularity,
            sections,
            created_at: DateTime::from_system_time(value.created_at),
            created_by: value.created_by,
            created_by_email: value.created_by_email,
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        let id = parse_record_id(&value.id)?;
        let mut sections = Sections::from_raw(
            value
                .sections
                .into_iter()
                .map(|(key, chapters)| (key, chapters.into_iter().map(Into::into).collect())),
        );
        sections.ensure_known();

        Ok(Self {
            id,
            slug: value.slug,
            title: value.title,
            description: value.description,
            includes: value.includes,
            thumbnail_url: value.thumbnail_url,
            popularity: value.popularity,
            sections,
            created_at: value.created_at.to_system_time(),
            created_by: value.created_by,
            created_by_email: value.created_by_email,
        })
    }
}

impl TryFrom<MongoGameListDocument> for GameListItemEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameListDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_record_id(&value.id)?,
            slug: value.slug,
            title: value.title,
            created_at: value.created_at.to_system_time(),
        })
    }
}

fn parse_record_id(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|source| MongoDaoError::InvalidRecordId {
        id: raw.to_owned(),
        source,
    })
}

pub fn doc_slug(slug: &str) -> Document {
    doc! {"slug": slug}
}

/// Earliest record wins when legacy data holds the same slug twice.
pub fn oldest_first() -> Document {
    doc! {"createdAt": 1, "_id": 1}
}

pub fn newest_first() -> Document {
    doc! {"createdAt": -1, "_id": 1}
}
