#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response},
};
use futures::future::BoxFuture;
use game_chapters_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes,
    services::image_relay::{
        HostReply, HostedImage, ImageHost, ImageHostError, ImageRelay, ImageUpload,
    },
    state::{AppState, SharedState},
};
use http_body_util::BodyExt;
use serde_json::Value;

pub const HOSTED_URL: &str = "https://i.ibb.co/abc/x.png";
pub const DELETE_URL: &str = "https://ibb.co/abc/delete";

/// Image host double answering every upload with the same reply.
pub struct StubHost {
    reply: HostReply,
    pub uploads: Mutex<Vec<(String, ImageUpload)>>,
}

impl StubHost {
    pub fn hosting() -> Arc<Self> {
        Self::replying(HostReply::Hosted(HostedImage {
            url: HOSTED_URL.into(),
            delete_url: DELETE_URL.into(),
        }))
    }

    pub fn replying(reply: HostReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl ImageHost for StubHost {
    fn upload(
        &self,
        api_key: Arc<str>,
        image: ImageUpload,
    ) -> BoxFuture<'static, Result<HostReply, ImageHostError>> {
        self.uploads
            .lock()
            .unwrap()
            .push((api_key.to_string(), image));
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub host: Arc<StubHost>,
}

/// App backed by the memory store, with `api_key` as the image host credential.
pub async fn app_with(host: Arc<StubHost>, api_key: Option<&str>, config: AppConfig) -> TestApp {
    let relay = ImageRelay::new(host.clone(), api_key.map(str::to_owned));
    let state = AppState::new(config, relay);
    state.set_game_store(Arc::new(MemoryGameStore::new())).await;
    TestApp {
        router: routes::router(state.clone()),
        state,
        host,
    }
}

pub async fn app() -> TestApp {
    app_with(StubHost::hosting(), Some("test-key"), AppConfig::default()).await
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// JSON request carrying the signed-in user headers.
pub fn signed_in(method: Method, uri: &str, body: Value) -> Request<Body> {
    let mut request = json_request(method, uri, body);
    let headers = request.headers_mut();
    headers.insert("x-user-id", "uid-42".parse().unwrap());
    headers.insert("x-user-email", "writer@example.com".parse().unwrap());
    request
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
