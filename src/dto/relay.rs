use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of an image relay call.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// Base64 image, optionally as a `data:image/<type>;base64,` URL.
    pub image: String,
    pub file_name: Option<String>,
}

/// Relay answer; `success` tells which of the optional fields are set.
#[derive(Debug, Serialize, ToSchema)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn hosted(url: String, delete_url: String) -> Self {
        Self {
            success: true,
            url: Some(url),
            delete_url: Some(delete_url),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            url: None,
            delete_url: None,
            error: Some(error),
        }
    }
}

/// Body answered to methods other than `POST` and `OPTIONS`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MethodNotAllowed {
    pub error: String,
}
