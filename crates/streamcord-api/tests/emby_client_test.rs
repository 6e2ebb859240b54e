#![allow(clippy::unwrap_used)]
// Integration tests for `EmbyClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use streamcord_api::media::models::ItemCountQuery;
use streamcord_api::{EmbyClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, EmbyClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = EmbyClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Sessions ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sessions_sends_token_header() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let key = SecretString::from("emby-key".to_string());
    let client = EmbyClient::new(base_url, &key, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/Sessions"))
        .and(header("X-Emby-Token", "emby-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "UserName": "alice", "NowPlayingItem": { "Name": "Heat", "Type": "Movie" } },
            { "UserName": "bob" }
        ])))
        .mount(&server)
        .await;

    let sessions = client.list_sessions().await.unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["UserName"], "alice");
}

#[tokio::test]
async fn test_list_sessions_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_sessions().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Libraries ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_media_folders() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Library/MediaFolders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [
                { "Id": "lib1", "Name": "Movies", "CollectionType": "movies" },
                { "Id": "lib2", "Name": "Collections", "CollectionType": "boxsets" },
                { "Id": "lib3", "Name": "Mixed" }
            ],
            "TotalRecordCount": 3
        })))
        .mount(&server)
        .await;

    let folders = client.list_media_folders().await.unwrap();

    assert_eq!(folders.len(), 3);
    assert_eq!(folders[0].collection_type.as_deref(), Some("movies"));
    assert!(folders[2].collection_type.is_none());
}

#[tokio::test]
async fn test_count_items_sends_width_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Items"))
        .and(query_param("ParentId", "lib1"))
        .and(query_param("Recursive", "true"))
        .and(query_param("IncludeItemTypes", "Movie"))
        .and(query_param("MinWidth", "3840"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [],
            "TotalRecordCount": 87
        })))
        .mount(&server)
        .await;

    let query = ItemCountQuery {
        parent_id: "lib1".into(),
        include_item_types: "Movie".into(),
        min_width: Some(3840),
        max_width: None,
    };

    assert_eq!(client.count_items(&query).await.unwrap(), 87);
}

// ── Recently added ──────────────────────────────────────────────────

#[tokio::test]
async fn test_recently_added_uses_latest_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Users/u1/Items/Latest"))
        .and(query_param("Limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "Heat", "Type": "Movie", "DateCreated": "2024-06-15T10:30:00Z" }
        ])))
        .mount(&server)
        .await;

    let items = client.recently_added("u1", 10).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name.as_deref(), Some("Heat"));
}

#[tokio::test]
async fn test_recently_added_falls_back_when_latest_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Users/u1/Items/Latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Users/u1/Items"))
        .and(query_param("SortBy", "DateCreated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [
                { "Name": "Pilot", "Type": "Episode", "SeriesName": "Lost",
                  "ParentIndexNumber": 1, "IndexNumber": 1 }
            ],
            "TotalRecordCount": 1
        })))
        .mount(&server)
        .await;

    let items = client.recently_added("u1", 10).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].series_name.as_deref(), Some("Lost"));
}

// ── Users ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_user_id_prefers_administrator() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/Users/Me"))
        .respond_with(ResponseTemplate::new(400).set_body_string("no user context"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": "viewer", "Policy": { "IsAdministrator": false } },
            { "Id": "admin", "Policy": { "IsAdministrator": true } }
        ])))
        .mount(&server)
        .await;

    assert_eq!(
        client.resolve_user_id().await.unwrap().as_deref(),
        Some("admin")
    );
}
