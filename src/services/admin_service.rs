//! Admin game creation: validate the form, host the thumbnail, persist the game.

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::models::Actor,
    dto::{
        admin::{AdminCreateGameRequest, ThumbnailInput},
        games::{CreateGameRequest, GameSummary},
    },
    error::ServiceError,
    services::{
        catalog_service::{self, invalid_input},
        image_relay::{ImageUpload, decode_image, parse_data_url},
    },
    state::SharedState,
};

/// File name given to thumbnails uploaded without one.
pub const DEFAULT_THUMBNAIL_FILE_NAME: &str = "game-thumbnail.jpg";

/// Validate the whole form, upload the thumbnail, then store the game.
///
/// Nothing is uploaded or written unless every check passes, storage is
/// reachable and the slug is still free.
pub async fn create_game_with_thumbnail(
    state: &SharedState,
    actor: &Actor,
    request: AdminCreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate().map_err(invalid_input)?;

    let AdminCreateGameRequest {
        title,
        slug,
        description,
        includes,
        thumbnail,
    } = request;

    let thumbnail = thumbnail
        .filter(|thumbnail| !thumbnail.data.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("a thumbnail image is required".into()))?;
    let (bytes, mime_type) = check_thumbnail(&thumbnail, state.config().thumbnail_max_bytes)?;

    // The insert still enforces uniqueness; this only avoids hosting an
    // image for a game that cannot be stored.
    let store = state.require_game_store().await?;
    if store.find_game_by_slug(slug.clone()).await?.is_some() {
        debug!(%slug, "slug taken; thumbnail not uploaded");
        return Err(ServiceError::Conflict(format!(
            "game slug `{slug}` already exists"
        )));
    }

    let file_name = thumbnail
        .file_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_THUMBNAIL_FILE_NAME.to_owned());

    let hosted = state
        .image_relay()
        .upload_decoded(ImageUpload {
            bytes,
            file_name,
            mime_type,
        })
        .await
        .inspect_err(|err| warn!(%slug, error = %err, "thumbnail upload failed"))?;
    info!(%slug, url = %hosted.url, "thumbnail hosted");

    catalog_service::create_game(
        state,
        actor,
        CreateGameRequest {
            title,
            slug,
            description,
            includes,
            thumbnail_url: hosted.url,
        },
    )
    .await
}

/// Enforce the `image/` media type, decode the payload the way the relay does
/// and apply the size cap. Returns the bytes and the MIME type to upload.
fn check_thumbnail(
    thumbnail: &ThumbnailInput,
    max_bytes: usize,
) -> Result<(Vec<u8>, String), ServiceError> {
    let media_type = match parse_data_url(&thumbnail.data) {
        Some((media_type, _)) => Some(media_type),
        None => thumbnail.content_type.as_deref(),
    };
    match media_type {
        Some(media_type) if media_type.starts_with("image/") => {}
        Some(media_type) => {
            return Err(ServiceError::InvalidInput(format!(
                "thumbnail must be an image (got `{media_type}`)"
            )));
        }
        None => {
            return Err(ServiceError::InvalidInput(
                "thumbnail must be an image (unknown media type)".into(),
            ));
        }
    }

    let (bytes, mime_type) = decode_image(&thumbnail.data).map_err(|err| {
        ServiceError::InvalidInput(format!("thumbnail is not valid base64 image data: {err}"))
    })?;

    if bytes.len() > max_bytes {
        return Err(ServiceError::InvalidInput(format!(
            "thumbnail is {} bytes; the limit is {max_bytes} bytes",
            bytes.len()
        )));
    }

    Ok((bytes, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumbnail(data: &str, content_type: Option<&str>) -> ThumbnailInput {
        ThumbnailInput {
            data: data.into(),
            file_name: None,
            content_type: content_type.map(Into::into),
        }
    }

    #[test]
    fn media_type_comes_from_prefix_or_field() {
        assert!(check_thumbnail(&thumbnail("data:image/png;base64,AAAA", None), 10).is_ok());
        assert!(check_thumbnail(&thumbnail("AAAA", Some("image/webp")), 10).is_ok());
        let pdf = check_thumbnail(
            &thumbnail("data:application/pdf;base64,AAAA", Some("image/png")),
            10,
        );
        assert!(
            matches!(pdf, Err(ServiceError::InvalidInput(ref m)) if m.contains("application/pdf"))
        );
        assert!(check_thumbnail(&thumbnail("AAAA", Some("text/plain")), 10).is_err());
        assert!(check_thumbnail(&thumbnail("AAAA", None), 10).is_err());
    }

    #[test]
    fn decoded_bytes_and_type_are_returned() {
        let (bytes, mime_type) =
            check_thumbnail(&thumbnail("data:image/png;base64,AAECAwQFBgcICQ==", None), 10)
                .unwrap();
        assert_eq!(bytes, (0u8..10).collect::<Vec<_>>());
        assert_eq!(mime_type, "image/png");
    }

    #[test]
    fn undecodable_payload_is_invalid_input() {
        for data in [
            "data:image/png;base64,!!!not-base64!!!",
            "data:image/svg+xml;base64,PHN2Zz4=",
        ] {
            let err = check_thumbnail(&thumbnail(data, None), 1024).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(ref m) if m.contains("base64")));
        }
    }

    #[test]
    fn oversized_thumbnail_is_rejected() {
        let err = check_thumbnail(&thumbnail("data:image/png;base64,AAAAAAAA", None), 5)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m.contains("limit")));
        assert!(check_thumbnail(&thumbnail("data:image/png;base64,AAAAAAAA", None), 6).is_ok());
    }
}
