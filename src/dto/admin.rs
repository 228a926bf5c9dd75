//! DTO definitions used by the admin REST API and documentation layer.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::Section,
    dto::validation::{validate_not_blank, validate_slug},
};

/// Game creation form: metadata plus the thumbnail file to host.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AdminCreateGameRequest {
    /// Display name of the game.
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub title: String,
    /// Lowercase letters, digits, `-` and `_`.
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,
    /// Sections offered for this game.
    #[serde(default)]
    pub includes: Vec<Section>,
    /// Absent when no file was selected.
    #[serde(default)]
    pub thumbnail: Option<ThumbnailInput>,
}

/// Thumbnail file read by the browser.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailInput {
    /// `data:image/<type>;base64,...` URL, or bare base64 with `contentType` set.
    pub data: String,
    /// Defaults to `game-thumbnail.jpg`.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Media type of the selected file; used when `data` carries no prefix.
    #[serde(default)]
    pub content_type: Option<String>,
}
