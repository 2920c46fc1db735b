use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::support::{test_app, test_state, MockStorage};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn share_request(name: &str, brand: &str, model: &str, device_type: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/catalog")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": name,
                "metadata": { "brand": brand, "model": model, "device_type": device_type },
                "content": "Filetype: IR signals file\nVersion: 1\nname: POWER\n"
            })
            .to_string(),
        ))
        .unwrap()
}

async fn seeded_app() -> axum::Router {
    let app = test_app(test_state(Arc::new(MockStorage::new())).await);
    for (name, brand, model, device_type) in [
        ("SONY_RM839.ir", "SONY", "RM839", "TV"),
        ("SAMSUNG_UE55NU7100.ir", "SAMSUNG", "UE55NU7100", "TV"),
        ("LG_AC755.ir", "LG", "AC755", "AC"),
    ] {
        let response = app
            .clone()
            .oneshot(share_request(name, brand, model, device_type))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    app
}

#[tokio::test]
async fn shared_files_are_listed_without_content() {
    let app = seeded_app().await;

    let response = app
        .oneshot(Request::builder().uri("/catalog").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    let items = items.as_array().unwrap().clone();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.get("content").is_none()));
}

#[tokio::test]
async fn prefix_search_returns_a_sorted_range() {
    let app = seeded_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/catalog?field=brand&prefix=S")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    let brands: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["metadata"]["brand"].as_str().unwrap())
        .collect();
    assert_eq!(brands, vec!["SAMSUNG", "SONY"]);

    // An empty prefix matches every entry, ordered by the searched field
    let response = app
        .oneshot(
            Request::builder().uri("/catalog?field=device_type").body(Body::empty()).unwrap(),
        )
        .await
        .unwrap();
    let items = body_json(response).await;
    let types: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["metadata"]["device_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["AC", "TV", "TV"]);
}

#[tokio::test]
async fn offset_pages_through_a_field_range() {
    let app = seeded_app().await;

    // brands sorted: AC755 belongs to LG, so LG, SAMSUNG, SONY
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/catalog?field=brand&limit=1&offset=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    let brands: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["metadata"]["brand"].as_str().unwrap())
        .collect();
    assert_eq!(brands, vec!["SAMSUNG"]);

    // offset past the end yields an empty page, not an error
    let response = app
        .oneshot(
            Request::builder()
                .uri("/catalog?field=brand&offset=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let items = body_json(response).await;
    assert!(items.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_search_fields_are_rejected() {
    let app = seeded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/catalog?field=content&prefix=x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_returns_the_stored_content() {
    let app = test_app(test_state(Arc::new(MockStorage::new())).await);

    let response =
        app.clone().oneshot(share_request("SONY_RM839.ir", "SONY", "RM839", "TV")).await.unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(Request::builder().uri(format!("/catalog/{}", id)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let item = body_json(response).await;
    assert_eq!(item["name"], "SONY_RM839.ir");
    assert!(item["content"].as_str().unwrap().starts_with("Filetype: IR signals file"));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/catalog/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn incomplete_metadata_is_rejected() {
    let app = test_app(test_state(Arc::new(MockStorage::new())).await);

    let response = app
        .oneshot(share_request("SONY_RM839.ir", "", "RM839", "TV"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], "brand");
}
