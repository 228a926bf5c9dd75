use std::{fmt, str::FromStr, time::SystemTime};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Popularity seed assigned to freshly created games.
pub const DEFAULT_POPULARITY: i64 = 100;

/// One of the four story categories a chapter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Main story quests.
    MainStory,
    /// Character stories.
    CharacterStory,
    /// Side stories.
    SideStory,
    /// Limited-time event stories.
    EventStory,
}

impl Section {
    /// Every well-known section, in canonical order.
    pub const ALL: [Section; 4] = [
        Section::MainStory,
        Section::CharacterStory,
        Section::SideStory,
        Section::EventStory,
    ];

    /// Key used for this section inside the `sections` mapping.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::MainStory => "main_story",
            Section::CharacterStory => "character_story",
            Section::SideStory => "side_story",
            Section::EventStory => "event_story",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name one of the four sections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section `{0}`")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == value)
            .ok_or_else(|| UnknownSection(value.to_owned()))
    }
}

/// Identity of the signed-in user performing a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Identity provider uid.
    pub id: String,
    /// Email reported by the identity provider.
    pub email: String,
}

/// A chapter appended to one section of one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChapterEntity {
    /// Chapter heading.
    pub title: String,
    /// Chapter body text.
    pub content: String,
    /// Server time of the append.
    pub created_at: SystemTime,
    /// Uid of the author.
    pub created_by: String,
    /// Email of the author.
    pub created_by_email: String,
}

impl ChapterEntity {
    /// Stamp a new chapter with the acting user and the current server time.
    pub fn new(title: String, content: String, actor: &Actor) -> Self {
        Self {
            title,
            content,
            created_at: SystemTime::now(),
            created_by: actor.id.clone(),
            created_by_email: actor.email.clone(),
        }
    }
}

/// Ordered mapping from section name to the chapters appended to it.
///
/// Keys are kept as plain strings so that records carrying sections outside
/// the well-known set round-trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Sections(IndexMap<String, Vec<ChapterEntity>>);

impl Sections {
    /// All four well-known sections, each empty.
    pub fn new() -> Self {
        Self(
            Section::ALL
                .into_iter()
                .map(|section| (section.as_str().to_owned(), Vec::new()))
                .collect(),
        )
    }

    /// Re-add any well-known key missing from a legacy record.
    pub fn ensure_known(&mut self) {
        for section in Section::ALL {
            self.0.entry(section.as_str().to_owned()).or_default();
        }
    }

    /// Chapters stored under `section`, empty when the key is absent.
    pub fn chapters(&self, section: Section) -> &[ChapterEntity] {
        self.0
            .get(section.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append `chapter` at the end of `section` and return its index.
    ///
    /// A missing key is initialised to an empty sequence first. Every other
    /// key is left as is.
    pub fn append(&mut self, section: Section, chapter: ChapterEntity) -> usize {
        let chapters = self.0.entry(section.as_str().to_owned()).or_default();
        chapters.push(chapter);
        chapters.len() - 1
    }

    /// Rebuild a mapping from stored entries, keeping their order.
    pub fn from_raw(entries: impl IntoIterator<Item = (String, Vec<ChapterEntity>)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Iterate over every stored key, well-known or not.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ChapterEntity])> {
        self.0
            .iter()
            .map(|(key, chapters)| (key.as_str(), chapters.as_slice()))
    }
}

impl IntoIterator for Sections {
    type Item = (String, Vec<ChapterEntity>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<ChapterEntity>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields supplied when inserting a game; the store assigns nothing else.
#[derive(Debug, Clone)]
pub struct NewGame {
    /// Unique lookup key.
    pub slug: String,
    /// Display name.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Sections offered for the game; deduplicated on insert.
    pub includes: Vec<Section>,
    /// Hosted thumbnail location.
    pub thumbnail_url: String,
    /// Initial popularity.
    pub popularity: i64,
    /// User creating the game.
    pub actor: Actor,
}

impl NewGame {
    /// Materialise the record with a fresh id, empty sections and the current time.
    pub fn into_entity(self) -> GameEntity {
        let mut includes = self.includes;
        includes.sort();
        includes.dedup();

        GameEntity {
            id: Uuid::new_v4(),
            slug: self.slug,
            title: self.title,
            description: self.description,
            includes,
            thumbnail_url: self.thumbnail_url,
            popularity: self.popularity,
            sections: Sections::new(),
            created_at: SystemTime::now(),
            created_by: self.actor.id,
            created_by_email: self.actor.email,
        }
    }
}

/// Representation of a game stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Store-generated record id.
    pub id: Uuid,
    /// Human-chosen lookup key.
    pub slug: String,
    /// Display name.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Sections selected when the game was created.
    pub includes: Vec<Section>,
    /// Hosted thumbnail location.
    pub thumbnail_url: String,
    /// Ranking hint; seeded on creation.
    pub popularity: i64,
    /// Chapters per section.
    pub sections: Sections,
    /// Server time of creation.
    pub created_at: SystemTime,
    /// Uid of the creator.
    pub created_by: String,
    /// Email of the creator.
    pub created_by_email: String,
}

/// Lightweight projection used to populate game pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListItemEntity {
    /// Record id, used to break ordering ties.
    pub id: Uuid,
    /// Lookup key.
    pub slug: String,
    /// Display name.
    pub title: String,
    /// Creation time, the ordering key.
    pub created_at: SystemTime,
}

impl From<GameEntity> for GameListItemEntity {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            slug: value.slug,
            title: value.title,
            created_at: value.created_at,
        }
    }
}

/// Where a freshly appended chapter landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterAppended {
    /// Record id of the game.
    pub game_id: Uuid,
    /// Section that received the chapter.
    pub section: Section,
    /// Zero-based index of the chapter inside its section.
    pub position: usize,
}

/// Order list items newest first, breaking ties on the record id.
pub fn sort_newest_first(items: &mut [GameListItemEntity]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn actor() -> Actor {
        Actor {
            id: "uid-1".into(),
            email: "writer@example.com".into(),
        }
    }

    fn chapter(title: &str) -> ChapterEntity {
        ChapterEntity::new(title.into(), "text".into(), &actor())
    }

    #[test]
    fn new_sections_hold_all_four_keys_empty() {
        let sections = Sections::new();
        let keys: Vec<_> = sections.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            ["main_story", "character_story", "side_story", "event_story"]
        );
        assert!(sections.iter().all(|(_, chapters)| chapters.is_empty()));
    }

    #[test]
    fn append_only_touches_target_section() {
        let mut sections = Sections::new();
        sections.append(Section::SideStory, chapter("side 1"));
        let before = sections.clone();

        let index = sections.append(Section::MainStory, chapter("main 1"));

        assert_eq!(index, 0);
        assert_eq!(sections.chapters(Section::MainStory).len(), 1);
        for section in [Section::CharacterStory, Section::SideStory, Section::EventStory] {
            assert_eq!(sections.chapters(section), before.chapters(section));
        }
    }

    #[test]
    fn append_preserves_submission_order() {
        let mut sections = Sections::new();
        sections.append(Section::EventStory, chapter("first"));
        let index = sections.append(Section::EventStory, chapter("second"));

        assert_eq!(index, 1);
        let titles: Vec<_> = sections
            .chapters(Section::EventStory)
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, ["first", "second"]);
    }

    #[test]
    fn append_initialises_missing_key_and_keeps_unknown_ones() {
        let mut sections: Sections =
            serde_json::from_str(r#"{"main_story": [], "bonus_story": []}"#).unwrap();

        sections.append(Section::SideStory, chapter("side"));
        sections.ensure_known();

        assert_eq!(sections.chapters(Section::SideStory).len(), 1);
        assert!(sections.iter().any(|(key, _)| key == "bonus_story"));
        assert_eq!(sections.iter().count(), 5);
    }

    #[test]
    fn section_round_trips_through_its_key() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>(), Ok(section));
        }
        assert!("prologue".parse::<Section>().is_err());
    }

    #[test]
    fn new_game_dedups_includes_in_canonical_order() {
        let game = NewGame {
            slug: "slug".into(),
            title: "Title".into(),
            description: "Desc".into(),
            includes: vec![Section::EventStory, Section::MainStory, Section::EventStory],
            thumbnail_url: "https://img.example/x.png".into(),
            popularity: DEFAULT_POPULARITY,
            actor: actor(),
        }
        .into_entity();

        assert_eq!(game.includes, [Section::MainStory, Section::EventStory]);
        assert_eq!(game.sections, Sections::new());
        assert_eq!(game.created_by, "uid-1");
    }

    #[test]
    fn list_items_sort_newest_first() {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let item = |secs: u64, slug: &str| GameListItemEntity {
            id: Uuid::new_v4(),
            slug: slug.into(),
            title: slug.into(),
            created_at: base + Duration::from_secs(secs),
        };
        let mut items = vec![item(1, "old"), item(3, "new"), item(2, "mid")];

        sort_newest_first(&mut items);

        let slugs: Vec<_> = items.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "mid", "old"]);
    }
}
