#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use moodtracker_api::config::Config;
use moodtracker_api::db::MemoryStore;
use moodtracker_api::{build_router, AppState};

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Full router over a fresh in-memory store. Every app gets its own rate limiter.
pub fn build_test_app() -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Config::for_tests("integration-test-secret"),
    );
    build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

/// Send one request and decode the JSON body (`Value::Null` when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

/// Register a user and return the token pair JSON.
pub async fn register(app: &Router, email: &str) -> Value {
    let (status, tokens) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": TEST_PASSWORD, "name": "Test User" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", tokens);
    tokens
}

/// Register a user and return just the access token.
pub async fn access_token(app: &Router, email: &str) -> String {
    register(app, email).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// A valid create-record body for `date` with the given mood selection.
pub fn record_body(date: &str, moods: &[i16]) -> Value {
    json!({
        "record_date": date,
        "moods": moods,
        "anxiety": 1,
        "tension": 0,
        "anger": -1,
        "interest": 2,
        "activity": 0,
        "thought_speed": 0,
        "thought_content": 0,
        "sleep_hours": 7.5,
        "has_exercise": true,
        "alcohol_units": 0.0,
        "notes": "  walked by the river  "
    })
}
