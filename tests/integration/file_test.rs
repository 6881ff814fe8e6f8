//! Upload, gallery, delete, rename and usage endpoints.

use axum::http::StatusCode;
use serde_json::{Value, json};

use kmem_core::traits::cache::CacheStore;

use crate::helpers::{TestApp, encode_filename, png};

fn thumbnail_count(page: &Value) -> usize {
    page["files"][0]["thumbnails"]
        .as_object()
        .map_or(0, |t| t.len())
}

#[tokio::test]
async fn test_upload_appears_in_gallery_with_thumbnails() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    let response = app.upload("beach.png", png(400, 300, 10), &cookies).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let file = &response.body["data"];
    assert_eq!(file["original_name"], "beach.png");
    assert_eq!(file["mime_type"], "image/png");

    let page = app.wait_for_gallery(&cookies, |p| thumbnail_count(p) == 3).await;
    assert_eq!(page["files"].as_array().unwrap().len(), 1);
    assert_eq!(page["has_next"], false);

    let small = page["files"][0]["thumbnails"]["small"].as_str().unwrap();
    assert!(small.starts_with("/static/alice/thumbnails/small/"));

    let served = app.request("GET", small, None, None).await;
    assert_eq!(served.status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejects_bad_names() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    for name in ["../evil.png", "notes.txt", ".hidden.png"] {
        let response = app.upload(name, png(10, 10, 1), &cookies).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{name}");
    }

    let missing = app
        .request("POST", "/files/upload", None, Some(&cookies))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let not_base64 = app
        .request("POST", "/files/upload?filename=%%%", None, Some(&cookies))
        .await;
    assert_eq!(not_base64.status, StatusCode::BAD_REQUEST);

    let owner_dir = app.dir.path().join("alice");
    let leftovers = std::fs::read_dir(&owner_dir).map_or(0, |d| d.count());
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_duplicate_upload_conflicts_and_leaves_no_bytes() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;
    let bytes = png(50, 50, 7);

    let first = app.upload("a.png", bytes.clone(), &cookies).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.upload("b.png", bytes.clone(), &cookies).await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let originals = std::fs::read_dir(app.dir.path().join("alice"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .count();
    assert_eq!(originals, 1);

    // Hashes are scoped per owner.
    let bob = app.signup("bobby").await;
    let theirs = app.upload("a.png", bytes, &bob).await;
    assert_eq!(theirs.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_delete_then_reupload_restores() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;
    let bytes = png(60, 40, 3);

    let created = app.upload("cat.png", bytes.clone(), &cookies).await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    let deleted = app
        .request("DELETE", &format!("/files/{id}"), None, Some(&cookies))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let page = app.request("GET", "/files", None, Some(&cookies)).await;
    assert_eq!(page.body["data"]["files"], json!([]));

    let again = app
        .request("DELETE", &format!("/files/{id}"), None, Some(&cookies))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let restored = app.upload("cat-again.png", bytes, &cookies).await;
    assert_eq!(restored.status, StatusCode::CREATED);
    assert_eq!(restored.body["data"]["id"], id);
    assert_eq!(restored.body["data"]["original_name"], "cat.png");

    let page = app.request("GET", "/files", None, Some(&cookies)).await;
    assert_eq!(page.body["data"]["files"][0]["id"], id);
}

#[tokio::test]
async fn test_owners_cannot_touch_each_other() {
    let app = TestApp::new().await;
    let alice = app.signup("alice").await;
    let bob = app.signup("bobby").await;

    let created = app.upload("mine.png", png(20, 20, 9), &alice).await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    let delete = app
        .request("DELETE", &format!("/files/{id}"), None, Some(&bob))
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let rename = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "new_name": "stolen.png" })),
            Some(&bob),
        )
        .await;
    assert_eq!(rename.status, StatusCode::NOT_FOUND);

    let bobs = app.request("GET", "/files", None, Some(&bob)).await;
    assert_eq!(bobs.body["data"]["files"], json!([]));
}

#[tokio::test]
async fn test_rename() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;
    let created = app.upload("old.png", png(20, 20, 4), &cookies).await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    // Populate the cache first so the rename must invalidate it.
    app.request("GET", "/files", None, Some(&cookies)).await;

    let renamed = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "new_name": "new.png" })),
            Some(&cookies),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);

    let page = app.request("GET", "/files", None, Some(&cookies)).await;
    assert_eq!(page.body["data"]["files"][0]["original_name"], "new.png");

    let invalid = app
        .request(
            "PUT",
            &format!("/files/{id}"),
            Some(json!({ "new_name": "a/b.png" })),
            Some(&cookies),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gallery_pagination_and_filters() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    for (i, name) in ["sunset.png", "sunrise.png", "forest.png"].iter().enumerate() {
        let response = app.upload(name, png(10, 10, i as u8 * 40), &cookies).await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let first = app
        .request("GET", "/files?limit=2&sort=name", None, Some(&cookies))
        .await;
    let data = &first.body["data"];
    assert_eq!(data["files"].as_array().unwrap().len(), 2);
    assert_eq!(data["files"][0]["original_name"], "forest.png");
    assert_eq!(data["has_next"], true);
    assert_eq!(data["next_page"], 1);

    let second = app
        .request("GET", "/files?limit=2&page=1&sort=name", None, Some(&cookies))
        .await;
    assert_eq!(second.body["data"]["files"].as_array().unwrap().len(), 1);
    assert_eq!(second.body["data"]["has_next"], false);

    let search = app
        .request("GET", "/files?search=SUN", None, Some(&cookies))
        .await;
    assert_eq!(search.body["data"]["files"].as_array().unwrap().len(), 2);

    let short = app
        .request("GET", "/files?search=su", None, Some(&cookies))
        .await;
    assert_eq!(short.body["data"]["files"].as_array().unwrap().len(), 3);

    let videos = app
        .request("GET", "/files?type=video", None, Some(&cookies))
        .await;
    assert_eq!(videos.body["data"]["files"], json!([]));

    let bad = app
        .request("GET", "/files?sort=size", None, Some(&cookies))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let lenient = app
        .request("GET", "/files?limit=many&page=next", None, Some(&cookies))
        .await;
    assert_eq!(lenient.status, StatusCode::OK);
    assert_eq!(lenient.body["data"]["files"].as_array().unwrap().len(), 3);
    assert_eq!(lenient.body["data"]["next_page"], 1);
}

#[tokio::test]
async fn test_usage_stats_are_cached_and_invalidated() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    let empty = app.request("GET", "/stats/usage", None, Some(&cookies)).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body["data"]["count"], 0);
    assert_eq!(empty.body["data"]["readable_size"], "0 B");
    assert!(app.cache.get("alice:stats:usage").is_some());

    let bytes = png(30, 30, 5);
    let size = bytes.len();
    app.upload("one.png", bytes, &cookies).await;
    assert!(app.cache.get("alice:stats:usage").is_none());

    let after = app.request("GET", "/stats/usage", None, Some(&cookies)).await;
    assert_eq!(after.body["data"]["username"], "alice");
    assert_eq!(after.body["data"]["count"], 1);
    assert_eq!(after.body["data"]["size"], size);
}

#[tokio::test]
async fn test_filename_encoding_round_trip() {
    let app = TestApp::new().await;
    let cookies = app.signup("alice").await;

    let encoded = encode_filename("holiday photo.png");
    let uri = format!("/files/upload?filename={encoded}");
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(axum::http::header::COOKIE, &cookies)
        .body(axum::body::Body::from(png(8, 8, 2)))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["original_name"], "holiday photo.png");
}
