//! HTTP-level tests driving the router against the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use connect_five_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes,
    state::AppState,
};

async fn app() -> Router {
    let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await;
    routes::router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn paired_game(app: &Router) -> String {
    let (status, created) = send(
        app,
        Method::POST,
        "/game",
        Some(json!({"name": "ann", "max_players": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let game_id = created["game_id"].as_str().unwrap().to_owned();

    let (status, joined) = send(app, Method::PATCH, "/game", Some(json!({"name": "bob"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["game_id"], game_id.as_str());

    game_id
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn degraded_server_answers_503() {
    let app = routes::router(AppState::new(AppConfig::default()));
    let (status, body) = send(&app, Method::POST, "/game", Some(json!({"name": "ann"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("degraded"));
}

#[tokio::test]
async fn join_without_open_game_is_404_with_null_id() {
    let app = app().await;
    let (status, body) = send(&app, Method::PATCH, "/game", Some(json!({"name": "bob"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"game_id": null}));
}

#[tokio::test]
async fn created_game_is_readable() {
    let app = app().await;
    let game_id = paired_game(&app).await;

    let (status, game) = send(&app, Method::GET, &format!("/game/{game_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["game_status"], "playing");
    assert_eq!(game["players"], json!(["ann", "bob"]));
    assert_eq!(game["turn"], "ann");
    assert_eq!(game["board"].as_array().unwrap().len(), 9);
    assert_eq!(game["board_full"], false);
}

#[tokio::test]
async fn move_returns_ok_merged_with_record() {
    let app = app().await;
    let game_id = paired_game(&app).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/game/{game_id}"),
        Some(json!({"name": "ann", "column": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
    assert_eq!(body["turn"], "bob");
    assert_eq!(body["board"][2][5], "x");

    let (_, stored) = send(&app, Method::GET, &format!("/game/{game_id}"), None).await;
    assert_eq!(stored["board"], body["board"]);
}

#[tokio::test]
async fn full_column_is_400_with_unchanged_record() {
    let app = app().await;
    let game_id = paired_game(&app).await;
    let uri = format!("/game/{game_id}");

    for name in ["ann", "bob", "ann", "bob", "ann", "bob"] {
        let (status, _) = send(
            &app,
            Method::PATCH,
            &uri,
            Some(json!({"name": name, "column": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"name": "ann", "column": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bad request, column full.");
    assert_eq!(body["turn"], "ann");
}

#[tokio::test]
async fn winning_move_reports_won() {
    let app = app().await;
    let game_id = paired_game(&app).await;
    let uri = format!("/game/{game_id}");

    for column in 1..=4 {
        send(&app, Method::PATCH, &uri, Some(json!({"name": "ann", "column": column}))).await;
        send(&app, Method::PATCH, &uri, Some(json!({"name": "bob", "column": column}))).await;
    }
    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"name": "ann", "column": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "won");
    assert_eq!(body["game_status"], "won");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"name": "bob", "column": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn disconnect_closes_the_game() {
    let app = app().await;
    let game_id = paired_game(&app).await;
    let uri = format!("/game/{game_id}");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({"game_status": "disconnected"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "OK"}));

    let (_, game) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(game["game_status"], "disconnected");
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = app().await;
    let game_id = paired_game(&app).await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/game/{game_id}"),
        Some(json!({"name": "ann", "column": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/game", Some(json!({"name": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/game",
        Some(json!({"name": "ann", "max_players": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_game_is_404() {
    let app = app().await;
    let uri = format!("/game/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn join_or_create_creates_then_joins() {
    let app = app().await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/game/join",
        Some(json!({"name": "ann"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"], true);

    let (status, second) = send(
        &app,
        Method::POST,
        "/game/join",
        Some(json!({"name": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["game_id"], first["game_id"]);
}

#[tokio::test]
async fn board_dump_is_plain_text() {
    let app = app().await;
    let game_id = paired_game(&app).await;
    send(
        &app,
        Method::PATCH,
        &format!("/game/{game_id}"),
        Some(json!({"name": "ann", "column": 1})),
    )
    .await;

    let uri = format!("/game/{game_id}/board");
    let (status, bytes) = send_raw(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[6].starts_with('x'));
}
