//! Integration tests for the ReelGuide backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::preferences::PreferencesStore;
use crate::triggers::TriggerRunner;
use crate::{create_router, AppState};

const ADMIN_KEY: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    /// Sends the admin key on every request.
    admin: Client,
    /// Sends nothing.
    anonymous: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let preferences_path = temp_dir.path().join("preferences.json");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let triggers = TriggerRunner::spawn(repo.clone(), 2);
        let preferences = Arc::new(PreferencesStore::load(&preferences_path).await);

        // Create config
        let config = Config {
            admin_psk: Some(ADMIN_KEY.to_string()),
            db_path,
            preferences_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            trigger_max_instances: 2,
        };

        let state = AppState {
            repo,
            triggers,
            preferences,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-api-key", ADMIN_KEY.parse().unwrap());

        TestFixture {
            admin: Client::builder().default_headers(headers).build().unwrap(),
            anonymous: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request as a signed-in visitor.
    fn as_user(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-user-email", "ana@example.com")
            .header("x-user-name", "Ana")
    }

    async fn create_video(&self, body: Value) -> Value {
        let resp = self
            .admin
            .post(self.url("/api/videos"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn list_titles(&self, client: &Client, query: &str) -> Vec<String> {
        let resp = client
            .get(self.url(&format!("/api/videos{}", query)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["title"].as_str().unwrap().to_string())
            .collect()
    }

    async fn submit_feedback(&self, title: &str, comment: &str) -> Value {
        let resp = self
            .as_user(self.anonymous.post(self.url("/api/feedbacks")))
            .json(&json!({ "videoTitle": title, "comment": comment }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn inbox(&self, archived: bool) -> Value {
        let resp = self
            .admin
            .get(self.url(&format!("/api/feedbacks?archived={}", archived)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }
}

fn video(title: &str, main_tag: &str, rating: i32) -> Value {
    json!({
        "youtubeUrl": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "title": title,
        "mainTag": main_tag,
        "subTags": [],
        "rating": rating
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anonymous
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_endpoints_require_key() {
    let fixture = TestFixture::new().await;

    // Anonymous
    let resp = fixture
        .anonymous
        .post(fixture.url("/api/videos"))
        .json(&video("Beach day", "Tourist", 5))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Signed-in visitor is still not an admin
    let resp = fixture
        .as_user(fixture.anonymous.get(fixture.url("/api/feedbacks")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Wrong key
    let resp = fixture
        .anonymous
        .get(fixture.url("/api/videos"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_video_crud() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .create_video(json!({
            "youtubeUrl": "https://youtu.be/dQw4w9WgXcQ",
            "title": "  Sunset Grill  ",
            "mainTag": "Tourist",
            "subTags": ["Restaurant", " Restaurant ", ""],
            "rating": 4,
            "location": {
                "name": "Sunset Grill",
                "address": "Seven Mile Beach",
                "lat": 19.33,
                "lng": -81.38
            }
        }))
        .await;

    let video_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["title"], "Sunset Grill");
    assert_eq!(created["subTags"], json!(["Restaurant"]));
    assert_eq!(created["isPublic"], true);
    assert_eq!(created["youtubeId"], "dQw4w9WgXcQ");
    assert_eq!(
        created["thumbnailUrl"],
        "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
    );
    assert_eq!(created["location"]["name"], "Sunset Grill");

    // Get as anonymous
    let get_resp = fixture
        .anonymous
        .get(fixture.url(&format!("/api/videos/{}", video_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["rating"], 4);

    // Update
    let update_resp = fixture
        .admin
        .put(fixture.url(&format!("/api/videos/{}", video_id)))
        .json(&json!({ "rating": 5, "isSponsored": true, "ribbonColor": "gold" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["rating"], 5);
    assert_eq!(update_body["data"]["ribbonColor"], "gold");
    assert_eq!(update_body["data"]["title"], "Sunset Grill");
    assert_eq!(update_body["data"]["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn test_video_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin
        .post(fixture.url("/api/videos"))
        .json(&json!({
            "youtubeUrl": "https://vimeo.com/12345",
            "title": "Not YouTube",
            "mainTag": "Tourist",
            "rating": 3
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["userMessage"], "Please enter a valid YouTube URL");

    let resp = fixture
        .admin
        .post(fixture.url("/api/videos"))
        .json(&video("   ", "Tourist", 3))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .admin
        .post(fixture.url("/api/videos"))
        .json(&video("Too good", "Tourist", 6))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Nothing was stored
    assert!(fixture.list_titles(&fixture.admin, "").await.is_empty());
}

#[tokio::test]
async fn test_hidden_videos_only_visible_to_admin() {
    let fixture = TestFixture::new().await;

    fixture.create_video(video("Public one", "Tourist", 3)).await;
    let hidden = fixture.create_video(video("Hidden one", "Tourist", 3)).await;
    let hidden_id = hidden["id"].as_str().unwrap();

    let resp = fixture
        .admin
        .put(fixture.url(&format!("/api/videos/{}/visibility", hidden_id)))
        .json(&json!({ "isPublic": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isPublic"], false);

    let public_titles = fixture.list_titles(&fixture.anonymous, "").await;
    assert_eq!(public_titles, vec!["Public one".to_string()]);

    let admin_titles = fixture.list_titles(&fixture.admin, "").await;
    assert_eq!(admin_titles.len(), 2);

    // Direct lookup hides it too
    let resp = fixture
        .anonymous
        .get(fixture.url(&format!("/api/videos/{}", hidden_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .admin
        .get(fixture.url(&format!("/api/videos/{}", hidden_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_listing_ranks_pinned_then_sponsored() {
    let fixture = TestFixture::new().await;

    fixture.create_video(video("Plain high", "Tourist", 5)).await;
    fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=aaaaaaaaaaa",
            "title": "Bronze sponsor",
            "mainTag": "Tourist",
            "rating": 5,
            "isSponsored": true,
            "ribbonColor": "bronze"
        }))
        .await;
    fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=bbbbbbbbbbb",
            "title": "Gold sponsor",
            "mainTag": "Tourist",
            "rating": 2,
            "isSponsored": true,
            "ribbonColor": "gold"
        }))
        .await;
    fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=ccccccccccc",
            "title": "Pinned low",
            "mainTag": "Resident",
            "rating": 1,
            "isPinned": true
        }))
        .await;

    let titles = fixture
        .list_titles(&fixture.anonymous, "?sortBy=highestRated")
        .await;
    assert_eq!(
        titles,
        vec!["Pinned low", "Gold sponsor", "Bronze sponsor", "Plain high"]
    );

    // Filters
    let tourist = fixture
        .list_titles(&fixture.anonymous, "?mainTag=Tourist&rating=5")
        .await;
    assert_eq!(tourist, vec!["Bronze sponsor", "Plain high"]);

    let searched = fixture.list_titles(&fixture.anonymous, "?q=GOLD").await;
    assert_eq!(searched, vec!["Gold sponsor"]);
}

#[tokio::test]
async fn test_sub_tags_and_catalogue() {
    let fixture = TestFixture::new().await;

    fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "title": "Beach bar",
            "mainTag": "Tourist",
            "subTags": ["Restaurant", "Beach"],
            "rating": 4
        }))
        .await;
    fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "title": "Clinic",
            "mainTag": "Resident",
            "subTags": ["Healthcare"],
            "rating": 4
        }))
        .await;

    let resp = fixture
        .anonymous
        .get(fixture.url("/api/videos/sub-tags?mainTag=Tourist"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!(["Restaurant", "Beach"]));

    let filtered = fixture
        .list_titles(&fixture.anonymous, "?subTag=Healthcare")
        .await;
    assert_eq!(filtered, vec!["Clinic"]);

    let resp = fixture
        .anonymous
        .get(fixture.url("/api/tags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let groups = body["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["mainTag"], "Tourist");
    assert!(groups[1]["suggestedSubTags"]
        .as_array()
        .unwrap()
        .contains(&json!("Healthcare")));
}

#[tokio::test]
async fn test_feedback_submission_rules() {
    let fixture = TestFixture::new().await;

    // Anonymous
    let resp = fixture
        .anonymous
        .post(fixture.url("/api/feedbacks"))
        .json(&json!({ "videoTitle": "Beach bar", "comment": "Closed now" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Admin
    let resp = fixture
        .admin
        .post(fixture.url("/api/feedbacks"))
        .json(&json!({ "videoTitle": "Beach bar", "comment": "Closed now" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // Empty comment
    let resp = fixture
        .as_user(fixture.anonymous.post(fixture.url("/api/feedbacks")))
        .json(&json!({ "videoTitle": "Beach bar", "comment": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["userMessage"], "Please fill in all fields");

    let feedback = fixture.submit_feedback("Beach bar", "Closed now").await;
    assert_eq!(feedback["userEmail"], "ana@example.com");
    assert_eq!(feedback["userName"], "Ana");
    assert_eq!(feedback["isRead"], false);
    assert_eq!(feedback["isArchived"], false);
}

#[tokio::test]
async fn test_feedback_inbox_and_archive() {
    let fixture = TestFixture::new().await;

    let first = fixture.submit_feedback("Beach bar", "Closed now").await;
    fixture.submit_feedback("Clinic", "New hours").await;
    let first_id = first["id"].as_str().unwrap();

    let inbox = fixture.inbox(false).await;
    assert_eq!(inbox["view"], "inbox");
    assert_eq!(inbox["feedbacks"].as_array().unwrap().len(), 2);
    assert_eq!(inbox["unreadCount"], 2);

    // Mark read
    let resp = fixture
        .admin
        .put(fixture.url(&format!("/api/feedbacks/{}/read", first_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(fixture.inbox(false).await["unreadCount"], 1);

    // Archive
    let resp = fixture
        .admin
        .put(fixture.url(&format!("/api/feedbacks/{}/archive", first_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let inbox = fixture.inbox(false).await;
    assert_eq!(inbox["feedbacks"].as_array().unwrap().len(), 1);
    assert_eq!(inbox["feedbacks"][0]["videoTitle"], "Clinic");

    let archive = fixture.inbox(true).await;
    assert_eq!(archive["view"], "archived");
    assert_eq!(archive["feedbacks"].as_array().unwrap().len(), 1);
    assert_eq!(archive["feedbacks"][0]["id"], first["id"]);
    assert_eq!(archive["feedbacks"][0]["isRead"], true);

    // Unarchive brings it back unchanged
    let resp = fixture
        .admin
        .put(fixture.url(&format!("/api/feedbacks/{}/unarchive", first_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(fixture.inbox(false).await["feedbacks"].as_array().unwrap().len(), 2);
    assert!(fixture.inbox(true).await["feedbacks"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_preferences_round_trip() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .anonymous
        .get(fixture.url("/api/preferences"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({ "language": "en", "theme": "caribbean", "darkMode": false })
    );

    let resp = fixture
        .anonymous
        .put(fixture.url("/api/preferences"))
        .json(&json!({ "language": "es", "darkMode": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .anonymous
        .get(fixture.url("/api/preferences"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({ "language": "es", "theme": "caribbean", "darkMode": true })
    );
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .admin
        .get(fixture.url("/api/videos/non-existent-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .admin
        .put(fixture.url("/api/videos/non-existent-id"))
        .json(&json!({ "rating": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .admin
        .put(fixture.url("/api/feedbacks/non-existent-id/archive"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_cleared_filters_list_everything() {
    let fixture = TestFixture::new().await;

    fixture.create_video(video("Beach bar", "Tourist", 4)).await;
    fixture.create_video(video("Clinic", "Resident", 2)).await;

    let titles = fixture
        .list_titles(&fixture.anonymous, "?q=&mainTag=&subTag=&rating=")
        .await;
    assert_eq!(titles.len(), 2);

    let resp = fixture
        .anonymous
        .get(fixture.url("/api/videos/sub-tags?mainTag="))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_update_with_null_removes_location() {
    let fixture = TestFixture::new().await;

    let created = fixture
        .create_video(json!({
            "youtubeUrl": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "title": "Sunset Grill",
            "mainTag": "Tourist",
            "rating": 4,
            "isSponsored": true,
            "ribbonColor": "silver",
            "location": { "name": "Sunset Grill", "address": "West Bay", "lat": 19.3, "lng": -81.4 }
        }))
        .await;
    let video_id = created["id"].as_str().unwrap();

    let resp = fixture
        .admin
        .put(fixture.url(&format!("/api/videos/{}", video_id)))
        .json(&json!({ "location": null, "ribbonColor": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].get("location").is_none());
    assert!(body["data"].get("ribbonColor").is_none());
    assert_eq!(body["data"]["isSponsored"], true);
}
