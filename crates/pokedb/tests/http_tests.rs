use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pokedb::http::{router, AppState};
use pokedb::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let collection = Arc::new(CollectionStore::new(store, "pokemon"));
    router(AppState::new(collection))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_returns_201_with_assigned_id() {
    let app = app();

    let (status, body) = send(&app, post_json("/pokemon", r#"{"name":"charmander"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);

    let record: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(record, json!({ "id": 1, "name": "charmander" }));
}

#[tokio::test]
async fn caller_id_is_ignored_over_http() {
    let app = app();

    let (status, body) = send(&app, post_json("/pokemon", r#"{"id":999,"name":"ditto"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);

    let record: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(record["id"], json!(1));
}

#[tokio::test]
async fn malformed_and_non_object_bodies_return_400() {
    let app = app();

    for body in ["{not json", "null", r#""a string""#, "[1,2,3]"] {
        let (status, bytes) = send(&app, post_json("/pokemon", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        let envelope: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(envelope["error"].is_string(), "body: {body}");
    }

    // Nothing was created along the way
    let (_, bytes) = send(&app, get("/pokemon")).await;
    let records: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(records, json!([]));
}

#[tokio::test]
async fn list_returns_records_in_id_order() {
    let app = app();

    for name in ["one", "two", "three"] {
        let body = json!({ "name": name }).to_string();
        send(&app, post_json("/pokemon", &body)).await;
    }

    let (status, bytes) = send(&app, get("/pokemon")).await;
    assert_eq!(status, StatusCode::OK);
    let records: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn get_by_id_round_trips_and_missing_is_404() {
    let app = app();

    send(&app, post_json("/pokemon", r#"{"name":"squirtle"}"#)).await;

    let (status, bytes) = send(&app, get("/pokemon/1")).await;
    assert_eq!(status, StatusCode::OK);
    let record: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(record["name"], json!("squirtle"));

    let (status, bytes) = send(&app, get("/pokemon/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(envelope["error"].is_string());
}

#[tokio::test]
async fn delete_returns_204_with_empty_body() {
    let app = app();

    send(&app, post_json("/pokemon", r#"{"name":"pidgey"}"#)).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/pokemon/1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    // Idempotent over HTTP as well
    let request = Request::builder()
        .method("DELETE")
        .uri("/pokemon/1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get("/pokemon/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let app = app();

    for uri in ["/unknown", "/pokemon/1/extra", "/"] {
        let (status, bytes) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri: {uri}");
        let envelope: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, json!({ "error": "not found" }));
    }

    // Unhandled methods on known paths answer the same way
    let request = Request::builder()
        .method("PUT")
        .uri("/pokemon")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope, json!({ "error": "not found" }));
}

#[tokio::test]
async fn responses_are_json_with_permissive_cors() {
    let app = app();

    let request = Request::builder()
        .uri("/pokemon")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() {
    let app = app();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/pokemon")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    for method in ["GET", "POST", "DELETE", "OPTIONS"] {
        assert!(allowed.contains(method), "missing {method} in {allowed}");
    }
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_lowercase(),
        "content-type"
    );
}

#[tokio::test]
async fn string_id_segments_are_looked_up_as_strings() {
    let app = app();

    // No record named "pikachu" was ever stored under a string key
    let (status, _) = send(&app, get("/pokemon/pikachu")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
