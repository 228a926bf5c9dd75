mod common;

use axum::http::{Method, StatusCode};
use futures::future::join_all;
use game_chapters_back::{config::AppConfig, services::image_relay::HostReply};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{HOSTED_URL, StubHost, TestApp, app, app_with, get, json_body, signed_in};

const THUMBNAIL: &str = "data:image/png;base64,AAECAwQFBgcICQ==";
const SECTION_KEYS: [&str; 4] = ["main_story", "character_story", "side_story", "event_story"];

fn game_form(slug: &str) -> Value {
    json!({
        "title": "Honkai: Star Rail",
        "slug": slug,
        "description": "A space fantasy RPG",
        "includes": ["main_story", "side_story"],
        "thumbnail": { "data": THUMBNAIL, "fileName": "hsr.png" }
    })
}

fn chapter(section: &str, title: &str) -> Value {
    json!({ "section": section, "title": title, "content": format!("{title} text") })
}

async fn create(app: &TestApp, slug: &str) {
    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", game_form(slug)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

async fn append(app: &TestApp, slug: &str, body: Value) -> StatusCode {
    app.router
        .clone()
        .oneshot(signed_in(
            Method::POST,
            &format!("/admin/games/{slug}/chapters"),
            body,
        ))
        .await
        .unwrap()
        .status()
}

async fn game(app: &TestApp, slug: &str) -> Value {
    let res = app
        .router
        .clone()
        .oneshot(get(&format!("/games/{slug}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    json_body(res).await
}

#[tokio::test]
async fn created_game_has_four_empty_sections() {
    let app = app().await;
    create(&app, "star-rail").await;

    let body = game(&app, "star-rail").await;
    assert_eq!(body["thumbnailURL"], HOSTED_URL);
    assert_eq!(body["popularity"], 100);
    assert_eq!(body["createdBy"], "uid-42");
    assert_eq!(body["createdByEmail"], "writer@example.com");
    for key in SECTION_KEYS {
        assert_eq!(body["sections"][key], json!([]), "section {key}");
    }

    let uploads = app.host.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1.file_name, "hsr.png");
}

#[tokio::test]
async fn thumbnail_file_name_defaults() {
    let app = app().await;
    let mut form = game_form("genshin");
    form["thumbnail"] = json!({ "data": THUMBNAIL });

    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", form))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(
        app.host.uploads.lock().unwrap()[0].1.file_name,
        "game-thumbnail.jpg"
    );
}

#[tokio::test]
async fn append_adds_exactly_one_chapter_at_the_end() {
    let app = app().await;
    create(&app, "star-rail").await;
    assert_eq!(append(&app, "star-rail", chapter("side_story", "s1")).await, StatusCode::CREATED);
    assert_eq!(append(&app, "star-rail", chapter("main_story", "m1")).await, StatusCode::CREATED);
    let before = game(&app, "star-rail").await;

    assert_eq!(append(&app, "star-rail", chapter("main_story", "m2")).await, StatusCode::CREATED);
    let after = game(&app, "star-rail").await;

    let main_before = before["sections"]["main_story"].as_array().unwrap();
    let main_after = after["sections"]["main_story"].as_array().unwrap();
    assert_eq!(main_after.len(), main_before.len() + 1);
    assert_eq!(&main_after[..main_before.len()], &main_before[..]);
    assert_eq!(main_after[1]["title"], "m2");
    assert_eq!(main_after[1]["createdBy"], "uid-42");
    for key in ["character_story", "side_story", "event_story"] {
        assert_eq!(after["sections"][key], before["sections"][key], "section {key}");
    }
}

#[tokio::test]
async fn sequential_appends_keep_submission_order() {
    let app = app().await;
    create(&app, "star-rail").await;

    append(&app, "star-rail", chapter("event_story", "first")).await;
    append(&app, "star-rail", chapter("event_story", "second")).await;

    let body = game(&app, "star-rail").await;
    let titles: Vec<_> = body["sections"]["event_story"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(titles, ["first", "second"]);
}

#[tokio::test]
async fn append_to_unknown_slug_is_not_found_and_changes_nothing() {
    let app = app().await;
    create(&app, "star-rail").await;
    let before = game(&app, "star-rail").await;

    assert_eq!(append(&app, "missing", chapter("main_story", "m")).await, StatusCode::NOT_FOUND);

    assert_eq!(game(&app, "star-rail").await, before);
    let list = app.router.clone().oneshot(get("/games")).await.unwrap();
    assert_eq!(json_body(list).await.as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_lose_no_chapter() {
    let app = app().await;
    create(&app, "star-rail").await;

    let requests = (0..24).map(|i| {
        let section = if i % 2 == 0 { "main_story" } else { "character_story" };
        let router = app.router.clone();
        tokio::spawn(async move {
            router
                .oneshot(signed_in(
                    Method::POST,
                    "/admin/games/star-rail/chapters",
                    chapter(section, &format!("c{i}")),
                ))
                .await
                .unwrap()
                .status()
        })
    });
    for status in join_all(requests).await {
        assert_eq!(status.unwrap(), StatusCode::CREATED);
    }

    let body = game(&app, "star-rail").await;
    assert_eq!(body["sections"]["main_story"].as_array().unwrap().len(), 12);
    assert_eq!(body["sections"]["character_story"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn writes_require_sign_in() {
    let app = app().await;
    let mut request = signed_in(Method::POST, "/admin/games", game_form("star-rail"));
    request.headers_mut().remove("x-user-id");

    let res = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["message"], "unauthorized: sign-in required");
    assert_eq!(app.host.upload_count(), 0);
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let app = app().await;
    create(&app, "star-rail").await;

    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", game_form("star-rail")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(app.host.upload_count(), 1);
}

#[tokio::test]
async fn undecodable_thumbnail_is_bad_request_without_upload() {
    let app = app().await;

    for data in [
        "data:image/png;base64,!!!not-base64!!!",
        "data:image/svg+xml;base64,PHN2Zz4=",
    ] {
        let mut form = game_form("star-rail");
        form["thumbnail"]["data"] = json!(data);

        let res = app
            .router
            .clone()
            .oneshot(signed_in(Method::POST, "/admin/games", form))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let message = json_body(res).await["message"].as_str().unwrap().to_owned();
        assert!(message.contains("base64"), "{message}");
    }
    assert_eq!(app.host.upload_count(), 0);
}

#[tokio::test]
async fn missing_form_fields_are_bad_requests() {
    let app = app().await;

    let mut no_title = game_form("star-rail");
    no_title.as_object_mut().unwrap().remove("title");
    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", no_title))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    create(&app, "star-rail").await;
    let res = app
        .router
        .clone()
        .oneshot(signed_in(
            Method::POST,
            "/admin/games/star-rail/chapters",
            json!({ "section": "main_story", "title": "Prologue" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.host.upload_count(), 1);
}

#[tokio::test]
async fn invalid_forms_stop_before_upload() {
    let app = app_with(
        StubHost::hosting(),
        Some("test-key"),
        AppConfig {
            thumbnail_max_bytes: 4,
            ..AppConfig::default()
        },
    )
    .await;

    let mut blank_title = game_form("a");
    blank_title["title"] = json!("   ");
    let mut no_thumbnail = game_form("b");
    no_thumbnail.as_object_mut().unwrap().remove("thumbnail");
    let mut not_image = game_form("c");
    not_image["thumbnail"]["data"] = json!("data:application/pdf;base64,AAAA");
    let too_big = game_form("d");

    for form in [blank_title, no_thumbnail, not_image, too_big] {
        let res = app
            .router
            .clone()
            .oneshot(signed_in(Method::POST, "/admin/games", form))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.host.upload_count(), 0);
}

#[tokio::test]
async fn rejected_thumbnail_is_bad_gateway_and_stores_nothing() {
    let app = app_with(
        StubHost::replying(HostReply::Rejected("Invalid API v1 key.".into())),
        Some("test-key"),
        AppConfig::default(),
    )
    .await;

    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", game_form("star-rail")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let list = app.router.clone().oneshot(get("/games")).await.unwrap();
    assert_eq!(json_body(list).await, json!([]));
}

#[tokio::test]
async fn games_are_listed_newest_first() {
    let app = app().await;
    create(&app, "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    create(&app, "second").await;

    let res = app.router.clone().oneshot(get("/games")).await.unwrap();
    let body = json_body(res).await;

    let slugs: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["slug"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(slugs, ["second", "first"]);
    assert_eq!(body[0]["title"], "Honkai: Star Rail");
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() {
    let app = app().await;
    app.state.clear_game_store().await;

    let res = app.router.clone().oneshot(get("/games")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = app.router.clone().oneshot(get("/healthcheck")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["status"], "degraded");
}

#[tokio::test]
async fn degraded_mode_hosts_no_thumbnail() {
    let app = app().await;
    app.state.clear_game_store().await;

    let res = app
        .router
        .clone()
        .oneshot(signed_in(Method::POST, "/admin/games", game_form("star-rail")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.host.upload_count(), 0);
}
