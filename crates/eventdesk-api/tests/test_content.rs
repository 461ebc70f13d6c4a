/// Integration tests for the content endpoints
///
/// Venues, rooms, organizations, speakers, communications and useful links,
/// plus the public health check and the platform configuration.
#[path = "common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::{TestApp, token};
use eventdesk_core::auth::Group;
use eventdesk_core::models::{Room, Session};
use serde_json::{Value, json};

fn editor() -> String {
    token("editor", &[Group::ContentManagers])
}

async fn post(app: &TestApp, path: &str, body: Value) -> Value {
    let (status, body) = app.call("POST", path, Some(&editor()), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["dynamodb"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/v1/venues", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or missing token");

    let (status, _) = app.call("GET", "/v1/venues", Some("|admins"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_venue_and_room_linking() {
    let app = TestApp::new();
    let venue = post(
        &app,
        "/v1/venues",
        json!({
            "name": "Congress center",
            "address": "1 Main street",
            "description": "<script>x</script><b>Big</b>"
        }),
    )
    .await;
    let venue_id = venue["venueId"].as_str().unwrap().to_string();
    assert_eq!(venue["description"], "<b>Big</b>");

    let room = post(
        &app,
        "/v1/rooms",
        json!({"name": "Auditorium", "venue": {"venueId": venue_id, "name": "stale"}}),
    )
    .await;
    assert_eq!(room["venue"]["name"], "Congress center");
    let room_id = room["roomId"].as_str().unwrap().to_string();

    // Rooms must point at a known venue
    let (status, _) = app
        .call(
            "POST",
            "/v1/rooms",
            Some(&editor()),
            Some(json!({"name": "Ghost", "venue": {"venueId": "missing"}})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A referenced venue can't be deleted
    let (status, _) = app
        .call("DELETE", &format!("/v1/venues/{}", venue_id), Some(&editor()), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.seed(&Session {
        session_id: "s1".to_string(),
        code: "S1".to_string(),
        name: "Opening".to_string(),
        session_date: "2026-05-01T09:00:00Z".to_string(),
        duration_minutes: 60,
        room: app
            .repo
            .load::<Room>(&Room::key_for(&room_id))
            .await
            .unwrap()
            .linked(),
        ..Session::default()
    })
    .await;
    let (status, _) = app
        .call("DELETE", &format!("/v1/rooms/{}", room_id), Some(&editor()), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.repo.remove::<Session>(&Session::key_for("s1")).await.unwrap();
    let (status, _) = app
        .call("DELETE", &format!("/v1/rooms/{}", room_id), Some(&editor()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .call("DELETE", &format!("/v1/venues/{}", venue_id), Some(&editor()), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call("GET", &format!("/v1/venues/{}", venue_id), Some(&editor()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_speaker_organization() {
    let app = TestApp::new();
    let organization = post(
        &app,
        "/v1/organizations",
        json!({"name": "ESN", "website": "https://esn.org"}),
    )
    .await;
    let organization_id = organization["organizationId"].as_str().unwrap().to_string();

    let speaker = post(
        &app,
        "/v1/speakers",
        json!({"name": "Ada", "organization": {"organizationId": organization_id}}),
    )
    .await;
    assert_eq!(speaker["organization"]["name"], "ESN");

    let (status, _) = app
        .call(
            "DELETE",
            &format!("/v1/organizations/{}", organization_id),
            Some(&editor()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            "POST",
            "/v1/organizations",
            Some(&editor()),
            Some(json!({"name": "Bad", "website": "not a url"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_requires_content_manager() {
    let app = TestApp::new();
    let (status, _) = app
        .call(
            "POST",
            "/v1/venues",
            Some(&token("alice", &[Group::RegistrationManagers])),
            Some(json!({"name": "Hall", "address": "Street"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins manage everything
    let (status, _) = app
        .call(
            "POST",
            "/v1/venues",
            Some(&token("root", &[Group::Admins])),
            Some(json!({"name": "Hall", "address": "Street"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call("GET", "/v1/venues", Some(&token("alice", &[])), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .call("POST", "/v1/venues", Some(&editor()), Some(json!(["not", "an", "object"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_useful_links_swap() {
    let app = TestApp::new();
    let first = post(
        &app,
        "/v1/useful-links",
        json!({"name": "Map", "url": "https://map.example.com"}),
    )
    .await;
    let second = post(
        &app,
        "/v1/useful-links",
        json!({"name": "FAQ", "url": "https://faq.example.com"}),
    )
    .await;
    assert_eq!(first["sort"], 1);
    assert_eq!(second["sort"], 2);

    let first_id = first["linkId"].as_str().unwrap();
    let second_id = second["linkId"].as_str().unwrap();
    let (status, body) = app
        .call(
            "PATCH",
            &format!("/v1/useful-links/{}", first_id),
            Some(&editor()),
            Some(json!({"action": "SWAP_SORT", "otherLinkId": second_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, body) = app
        .call("GET", "/v1/useful-links", Some(&token("alice", &[])), None)
        .await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["FAQ", "Map"]);

    let (status, _) = app
        .call(
            "PATCH",
            &format!("/v1/useful-links/{}", first_id),
            Some(&editor()),
            Some(json!({"action": "SWAP_SORT", "otherLinkId": first_id})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_communications_newest_first() {
    let app = TestApp::new();
    post(
        &app,
        "/v1/communications",
        json!({"title": "Welcome", "content": "Hello", "date": "2026-03-01T10:00:00Z"}),
    )
    .await;
    post(
        &app,
        "/v1/communications",
        json!({"title": "Program", "content": "Out now", "date": "2026-04-01T10:00:00Z"}),
    )
    .await;

    let (status, body) = app
        .call("GET", "/v1/communications", Some(&token("alice", &[])), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Program");
    assert_eq!(body[1]["title"], "Welcome");
}

#[tokio::test]
async fn test_image_upload_url() {
    let app = TestApp::new();
    let alice = token("alice", &[]);

    let (status, body) = app
        .call(
            "POST",
            "/v1/media/images",
            Some(&alice),
            Some(json!({"contentType": "image/png"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("images/") && key.ends_with(".png"));
    assert_eq!(body["url"], format!("https://cdn.test/{}", key));

    let (status, _) = app
        .call(
            "POST",
            "/v1/media/images",
            Some(&alice),
            Some(json!({"contentType": "application/pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_configuration() {
    let app = TestApp::new();

    let (status, body) = app
        .call("GET", "/v1/configurations", Some(&token("alice", &[])), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRegistrationOpen"], false);
    assert_eq!(body["timezone"], "Europe/Brussels");

    let update = json!({
        "isRegistrationOpen": true,
        "spotTypes": ["Participant", "Volunteer"],
        "sectionCountries": ["Belgium"],
        "timezone": "Europe/Brussels"
    });
    let (status, _) = app
        .call(
            "PUT",
            "/v1/configurations",
            Some(&token("manager", &[Group::RegistrationManagers])),
            Some(update.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token("root", &[Group::Admins]);
    let (status, body) = app
        .call("PUT", "/v1/configurations", Some(&admin), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["configId"], "CONFIG");

    let (_, body) = app
        .call("GET", "/v1/configurations", Some(&token("alice", &[])), None)
        .await;
    assert_eq!(body["isRegistrationOpen"], true);
    assert_eq!(body["spotTypes"], json!(["Participant", "Volunteer"]));

    let (status, _) = app
        .call(
            "PUT",
            "/v1/configurations",
            Some(&admin),
            Some(json!({"spotTypes": ["A", "A"], "timezone": "UTC"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
