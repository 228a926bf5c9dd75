//! DTOs of the public catalog routes and the chapter/game write payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ChapterAppended, ChapterEntity, GameEntity, GameListItemEntity, Section},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_slug},
    },
};

/// Payload used to persist a game whose thumbnail is already hosted.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,
    /// Sections offered for this game; defaults to none.
    #[serde(default)]
    pub includes: Vec<Section>,
    #[serde(rename = "thumbnailURL")]
    #[validate(url)]
    pub thumbnail_url: String,
}

/// Summary returned once a game has been created.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    pub created_at: String,
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            slug: game.slug,
            title: game.title,
            thumbnail_url: game.thumbnail_url,
            created_at: format_system_time(game.created_at),
        }
    }
}

/// Entry of the game picker.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    pub slug: String,
    pub title: String,
}

impl From<GameListItemEntity> for GameListItem {
    fn from(item: GameListItemEntity) -> Self {
        Self {
            slug: item.slug,
            title: item.title,
        }
    }
}

/// A chapter as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDto {
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub created_by: String,
    pub created_by_email: String,
}

impl From<ChapterEntity> for ChapterDto {
    fn from(chapter: ChapterEntity) -> Self {
        Self {
            title: chapter.title,
            content: chapter.content,
            created_at: format_system_time(chapter.created_at),
            created_by: chapter.created_by,
            created_by_email: chapter.created_by_email,
        }
    }
}

/// Full game record, sections included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub includes: Vec<Section>,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: String,
    pub popularity: i64,
    /// Section name to chapters, in stored order.
    #[schema(value_type = Object)]
    pub sections: indexmap::IndexMap<String, Vec<ChapterDto>>,
    pub created_at: String,
    pub created_by: String,
    pub created_by_email: String,
}

impl From<GameEntity> for GameDetail {
    fn from(game: GameEntity) -> Self {
        let mut sections = game.sections;
        sections.ensure_known();
        Self {
            id: game.id,
            slug: game.slug,
            title: game.title,
            description: game.description,
            includes: game.includes,
            thumbnail_url: game.thumbnail_url,
            popularity: game.popularity,
            sections: sections
                .into_iter()
                .map(|(key, chapters)| (key, chapters.into_iter().map(Into::into).collect()))
                .collect(),
            created_at: format_system_time(game.created_at),
            created_by: game.created_by,
            created_by_email: game.created_by_email,
        }
    }
}

/// Chapter submitted by the admin page.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AppendChapterRequest {
    /// Section receiving the chapter.
    pub section: Section,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub content: String,
}

/// Where the appended chapter landed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterAppendedResponse {
    pub game_id: Uuid,
    pub slug: String,
    pub section: Section,
    /// Zero-based index within the section.
    pub position: usize,
}

impl ChapterAppendedResponse {
    pub fn new(slug: String, appended: ChapterAppended) -> Self {
        Self {
            game_id: appended.game_id,
            slug,
            section: appended.section,
            position: appended.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{Actor, NewGame};
    use validator::Validate;

    #[test]
    fn create_request_uses_camel_case_names() {
        let request: CreateGameRequest = serde_json::from_str(
            r#"{
                "title": "Genshin Impact",
                "slug": "genshin",
                "description": "Teyvat",
                "includes": ["main_story", "event_story"],
                "thumbnailURL": "https://i.example/g.png"
            }"#,
        )
        .unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.includes, [Section::MainStory, Section::EventStory]);
    }

    #[test]
    fn blank_title_and_bad_slug_fail_validation() {
        let request = CreateGameRequest {
            title: "  ".into(),
            slug: "Not A Slug".into(),
            description: "d".into(),
            includes: Vec::new(),
            thumbnail_url: "https://i.example/g.png".into(),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("slug"));
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn detail_exposes_every_section_key() {
        let game = NewGame {
            slug: "hsr".into(),
            title: "Star Rail".into(),
            description: "Trains".into(),
            includes: Vec::new(),
            thumbnail_url: "https://i.example/h.png".into(),
            popularity: 100,
            actor: Actor {
                id: "uid".into(),
                email: "a@example.com".into(),
            },
        }
        .into_entity();

        let json = serde_json::to_value(GameDetail::from(game)).unwrap();

        assert_eq!(json["thumbnailURL"], "https://i.example/h.png");
        for key in ["main_story", "character_story", "side_story", "event_story"] {
            assert_eq!(json["sections"][key], serde_json::json!([]));
        }
    }
}
