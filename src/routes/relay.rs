//! Image relay endpoint. It answers with its own cross-origin headers on every
//! response, preflight included.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::warn;

use crate::{
    dto::relay::{MethodNotAllowed, RelayRequest, RelayResponse},
    services::image_relay::RelayError,
    state::SharedState,
};

/// Relay path.
pub const UPLOAD_PATH: &str = "/api/images/upload";
/// Path the admin page used when the relay ran as a Netlify function.
pub const LEGACY_UPLOAD_PATH: &str = "/.netlify/functions/imgbb-upload";

const RELAY_CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
];

/// Relay routes on the current and the legacy path; other methods answer `405`.
pub fn router() -> Router<SharedState> {
    let relay = post(upload_image)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route(UPLOAD_PATH, relay.clone())
        .route(LEGACY_UPLOAD_PATH, relay)
}

/// Upload a base64 image to the image host.
#[utoipa::path(
    post,
    path = "/api/images/upload",
    tag = "images",
    request_body = RelayRequest,
    responses(
        (status = 200, description = "Image hosted", body = RelayResponse),
        (status = 400, description = "Image host refused the upload", body = RelayResponse),
        (status = 405, description = "Wrong method", body = MethodNotAllowed),
        (status = 500, description = "Missing credential or broken payload", body = RelayResponse)
    )
)]
pub async fn upload_image(State(state): State<SharedState>, body: Bytes) -> Response {
    let outcome = match serde_json::from_slice::<RelayRequest>(&body) {
        Ok(request) => {
            state
                .image_relay()
                .upload(&request.image, request.file_name)
                .await
        }
        Err(err) => {
            warn!(error = %err, "unreadable relay request body");
            Err(RelayError::Internal(err.to_string()))
        }
    };

    match outcome {
        Ok(hosted) => (
            StatusCode::OK,
            RELAY_CORS_HEADERS,
            Json(RelayResponse::hosted(hosted.url, hosted.delete_url)),
        )
            .into_response(),
        Err(err) => (
            err.status(),
            RELAY_CORS_HEADERS,
            Json(RelayResponse::failed(err.to_string())),
        )
            .into_response(),
    }
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, RELAY_CORS_HEADERS)
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        RELAY_CORS_HEADERS,
        Json(MethodNotAllowed {
            error: "Method Not Allowed".into(),
        }),
    )
}
