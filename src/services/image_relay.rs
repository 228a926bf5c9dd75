//! Image relay: decodes a base64 image payload, forwards it to the image host
//! as multipart form data and maps the host's answer.

use std::sync::Arc;

use axum::http::StatusCode;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::BoxFuture;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// File name used when the caller does not provide one.
pub const DEFAULT_FILE_NAME: &str = "image.jpg";
const DEFAULT_MIME_TYPE: &str = "image/jpeg";
const UPLOAD_FAILED: &str = "Upload failed";

/// Outcome of a relay call that did not produce a hosted image.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The server holds no image host credential.
    #[error("Server configuration error: IMGBB_API_KEY not set")]
    MissingApiKey,
    /// The image host answered but refused the upload.
    #[error("{0}")]
    Rejected(String),
    /// Decoding or forwarding failed before the host could answer.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Status code reported by the relay endpoint for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Rejected(_) => StatusCode::BAD_REQUEST,
            RelayError::MissingApiKey | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Transport-level failures talking to the image host.
#[derive(Debug, Error)]
pub enum ImageHostError {
    /// The upload form could not be built.
    #[error("invalid multipart part: {0}")]
    Form(#[source] reqwest::Error),
    /// The request did not complete.
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    /// The host answered with something other than its JSON envelope.
    #[error("unreadable image host response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Raw image bytes ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Decoded image content.
    pub bytes: Vec<u8>,
    /// File name of the multipart part.
    pub file_name: String,
    /// MIME type of the multipart part.
    pub mime_type: String,
}

/// Location of an image accepted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    /// Public URL of the image.
    pub url: String,
    /// URL that removes the image from the host.
    pub delete_url: String,
}

/// What the image host said about an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostReply {
    /// The image is online.
    Hosted(HostedImage),
    /// Refused, with the host's message.
    Rejected(String),
}

/// Upstream image hosting service.
pub trait ImageHost: Send + Sync {
    /// Send one image; exactly one upstream call per invocation.
    fn upload(
        &self,
        api_key: Arc<str>,
        image: ImageUpload,
    ) -> BoxFuture<'static, Result<HostReply, ImageHostError>>;
}

/// [`ImageHost`] speaking the imgbb upload API.
#[derive(Clone)]
pub struct ImgbbClient {
    client: Client,
    endpoint: Arc<str>,
}

impl ImgbbClient {
    /// Client posting to `endpoint` (see [`crate::config::DEFAULT_IMAGE_HOST_ENDPOINT`]).
    pub fn new(client: Client, endpoint: impl Into<Arc<str>>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn send(&self, api_key: Arc<str>, image: ImageUpload) -> Result<HostReply, ImageHostError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)
            .map_err(ImageHostError::Form)?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(self.endpoint.as_ref())
            .query(&[("key", api_key.as_ref())])
            .multipart(form)
            .send()
            .await
            .map_err(ImageHostError::Transport)?;

        let status = response.status();
        let payload = response
            .json::<ImgbbResponse>()
            .await
            .map_err(ImageHostError::Decode)?;
        debug!(%status, success = payload.success, "image host answered");

        Ok(payload.into_reply())
    }
}

impl ImageHost for ImgbbClient {
    fn upload(
        &self,
        api_key: Arc<str>,
        image: ImageUpload,
    ) -> BoxFuture<'static, Result<HostReply, ImageHostError>> {
        let client = self.clone();
        Box::pin(async move { client.send(api_key, image).await })
    }
}

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbData>,
    error: Option<ImgbbErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ImgbbData {
    url: String,
    #[serde(default)]
    delete_url: String,
}

#[derive(Debug, Deserialize)]
struct ImgbbErrorBody {
    message: Option<String>,
}

impl ImgbbResponse {
    fn into_reply(self) -> HostReply {
        match (self.success, self.data) {
            (true, Some(data)) => HostReply::Hosted(HostedImage {
                url: data.url,
                delete_url: data.delete_url,
            }),
            _ => HostReply::Rejected(
                self.error
                    .and_then(|error| error.message)
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| UPLOAD_FAILED.to_owned()),
            ),
        }
    }
}

/// Forwards images to an [`ImageHost`] with the server-held credential.
#[derive(Clone)]
pub struct ImageRelay {
    host: Arc<dyn ImageHost>,
    api_key: Option<Arc<str>>,
}

impl ImageRelay {
    /// Relay through `host`; without `api_key` every upload is refused.
    pub fn new(host: Arc<dyn ImageHost>, api_key: Option<String>) -> Self {
        Self {
            host,
            api_key: api_key.map(Arc::from),
        }
    }

    /// Decode `image` (data URL or bare base64) and upload it under
    /// `file_name`, defaulting to [`DEFAULT_FILE_NAME`].
    pub async fn upload(
        &self,
        image: &str,
        file_name: Option<String>,
    ) -> Result<HostedImage, RelayError> {
        let api_key = self.api_key()?;

        let (bytes, mime_type) = decode_image(image).map_err(|err| {
            warn!(error = %err, "image payload is not valid base64");
            RelayError::Internal(err.to_string())
        })?;
        let upload = ImageUpload {
            bytes,
            file_name: file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_owned()),
            mime_type,
        };

        self.forward(api_key, upload).await
    }

    /// Upload bytes the caller already decoded and checked.
    pub async fn upload_decoded(&self, upload: ImageUpload) -> Result<HostedImage, RelayError> {
        let api_key = self.api_key()?;
        self.forward(api_key, upload).await
    }

    fn api_key(&self) -> Result<Arc<str>, RelayError> {
        self.api_key.clone().ok_or_else(|| {
            error!("image upload refused: IMGBB_API_KEY not set");
            RelayError::MissingApiKey
        })
    }

    async fn forward(
        &self,
        api_key: Arc<str>,
        upload: ImageUpload,
    ) -> Result<HostedImage, RelayError> {
        debug!(
            file_name = %upload.file_name,
            mime_type = %upload.mime_type,
            size = upload.bytes.len(),
            "relaying image upload"
        );

        match self.host.upload(api_key, upload).await {
            Ok(HostReply::Hosted(hosted)) => Ok(hosted),
            Ok(HostReply::Rejected(message)) => {
                warn!(error = %message, "image host rejected upload");
                Err(RelayError::Rejected(message))
            }
            Err(err) => {
                error!(error = %err, "image upload failed");
                Err(RelayError::Internal(err.to_string()))
            }
        }
    }
}

/// Split a `data:<media type>;base64,<payload>` URL into its media type and
/// payload.
pub fn parse_data_url(input: &str) -> Option<(&str, &str)> {
    input.strip_prefix("data:")?.split_once(";base64,")
}

/// Subtype of an `image/<word>` media type, where a word is ASCII
/// alphanumerics and `_`.
fn image_subtype(media_type: &str) -> Option<&str> {
    let subtype = media_type.strip_prefix("image/")?;
    let is_word = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_word.then_some(subtype)
}

/// Decode an image payload into bytes and its MIME type.
///
/// Only an `data:image/<word>;base64,` prefix is stripped; anything else is
/// decoded as-is and assumed to be JPEG.
pub fn decode_image(input: &str) -> Result<(Vec<u8>, String), base64::DecodeError> {
    let (mime_type, payload) = parse_data_url(input)
        .and_then(|(media_type, payload)| {
            image_subtype(media_type).map(|subtype| (format!("image/{subtype}"), payload))
        })
        .unwrap_or_else(|| (DEFAULT_MIME_TYPE.to_owned(), input));

    let bytes = STANDARD.decode(payload)?;
    Ok((bytes, mime_type))
}
