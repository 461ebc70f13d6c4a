/// Integration tests for the event spot endpoints
///
/// Covers the spot lifecycle: distribution to countries, assignment to users
/// with both profiles kept in sync, payment proof and confirmation.
#[path = "common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::{InterleavingStore, RecordingMailer, TestApp, email_of, token};
use eventdesk_core::auth::Group;
use eventdesk_core::models::{EventSpot, User, to_item};
use eventdesk_core::services::Condition;
use serde_json::json;
use std::sync::Arc;

async fn create_spot(app: &TestApp, country: Option<&str>) -> String {
    let manager = token("manager", &[Group::RegistrationManagers]);
    let (status, body) = app
        .call(
            "POST",
            "/v1/spots",
            Some(&manager),
            Some(json!({
                "type": "Participant",
                "sectionCountry": country,
                "numberOfSpots": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body[0]["spotId"].as_str().unwrap().to_string()
}

async fn assign(
    app: &TestApp,
    caller: &str,
    spot_id: &str,
    user_id: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    app.call(
        "PATCH",
        &format!("/v1/spots/{}", spot_id),
        Some(caller),
        Some(json!({"action": "ASSIGN_TO_USER", "userId": user_id})),
    )
    .await
}

/// Queues bob's assignment to the spot, committed ahead of the next write
async fn queue_concurrent_assignment(app: &TestApp, store: &InterleavingStore, spot_id: &str) {
    let spot: EventSpot = app.repo.load(&EventSpot::key_for(spot_id)).await.unwrap();
    let given = EventSpot {
        user_id: Some("bob".to_string()),
        user_name: Some("First bob".to_string()),
        ..spot
    };
    store.queue(vec![
        app.repo
            .put_op(&given, Condition::absent("userId").and_exists())
            .unwrap(),
        app.repo.update_op::<User>(
            User::key_for("bob"),
            to_item(&json!({"spot": given.attached()})).unwrap(),
            Condition::absent("spot"),
        ),
    ]);
}

async fn request_proof_key(app: &TestApp, caller: &str, spot_id: &str) -> String {
    let (status, body) = app
        .call(
            "POST",
            &format!("/v1/spots/{}/proof-of-payment", spot_id),
            Some(caller),
            Some(json!({"contentType": "application/pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["key"].as_str().unwrap().to_string()
}

async fn set_proof(app: &TestApp, caller: &str, spot_id: &str, key: &str) -> StatusCode {
    let (status, _) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", spot_id),
            Some(caller),
            Some(json!({"action": "SET_PROOF_OF_PAYMENT", "key": key})),
        )
        .await;
    status
}

#[tokio::test]
async fn test_create_spots_in_batch() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    let manager = token("manager", &[Group::RegistrationManagers]);

    let (status, body) = app
        .call(
            "POST",
            "/v1/spots",
            Some(&manager),
            Some(json!({"type": "Participant", "sectionCountry": "Belgium", "numberOfSpots": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _) = app
        .call(
            "POST",
            "/v1/spots",
            Some(&manager),
            Some(json!({"type": "Participant", "numberOfSpots": 251})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown spot type
    let (status, body) = app
        .call(
            "POST",
            "/v1/spots",
            Some(&manager),
            Some(json!({"type": "VIP", "numberOfSpots": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("type"));
}

#[tokio::test]
async fn test_create_spots_requires_manager() {
    let app = TestApp::new();
    app.seed_configuration(false).await;

    let (status, _) = app
        .call(
            "POST",
            "/v1/spots",
            Some(&token("someone", &[])),
            Some(json!({"type": "Participant", "numberOfSpots": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_assign_spot_updates_both_sides() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("bob", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);

    let (status, body) = assign(&app, &manager, &spot_id, Some("alice")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["userName"], "First alice");
    assert_eq!(app.load_user("alice").await.spot.unwrap().spot_id, spot_id);

    // Handing the spot over releases the previous holder
    let (status, body) = assign(&app, &manager, &spot_id, Some("bob")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(app.load_user("alice").await.spot.is_none());
    assert_eq!(app.load_user("bob").await.spot.unwrap().spot_id, spot_id);

    // Unassigning
    let (status, body) = assign(&app, &manager, &spot_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("userId").is_none());
    assert!(app.load_user("bob").await.spot.is_none());

    let sent = app.mailer.sent.lock().unwrap();
    let recipients: Vec<&str> = sent.iter().map(|email| email.to.as_str()).collect();
    assert_eq!(recipients, vec![email_of("alice"), email_of("bob")]);
}

#[tokio::test]
async fn test_assign_spot_refusals() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    let unregistered = User {
        registration_at: None,
        ..app.seed_user("carol", Some("Belgium")).await
    };
    app.seed(&unregistered).await;
    let manager = token("manager", &[Group::RegistrationManagers]);

    let first = create_spot(&app, Some("Belgium")).await;
    let second = create_spot(&app, Some("Belgium")).await;

    let (status, _) = assign(&app, &manager, &first, Some("carol")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = assign(&app, &manager, &first, Some("nobody")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = assign(&app, &manager, &first, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);

    // One spot per user
    let (status, _) = assign(&app, &manager, &second, Some("alice")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A held spot can't move to another country nor be deleted
    let (status, _) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", first),
            Some(&manager),
            Some(json!({"action": "ASSIGN_TO_COUNTRY", "sectionCountry": "France"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call("DELETE", &format!("/v1/spots/{}", first), Some(&manager), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call("DELETE", &format!("/v1/spots/{}", second), Some(&manager), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_paid_spot_cannot_change_hands() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("bob", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);

    assign(&app, &manager, &spot_id, Some("alice")).await;
    let (status, body) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", spot_id),
            Some(&manager),
            Some(json!({"action": "CONFIRM_PAYMENT", "confirmed": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paymentConfirmedAt"].is_string());
    assert!(
        app.load_user("alice")
            .await
            .spot
            .unwrap()
            .payment_confirmed_at
            .is_some()
    );

    let (status, _) = assign(&app, &manager, &spot_id, Some("bob")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Assignment mail, then payment mail
    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|email| email.to == email_of("alice")));
}

#[tokio::test]
async fn test_country_leader_assignment_rules() {
    let app = TestApp::new();
    app.seed_user("leader", Some("Belgium")).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("pierre", Some("France")).await;
    let leader = token("leader", &[Group::CountryLeaders]);

    app.seed_configuration(false).await;
    let belgian = create_spot(&app, Some("Belgium")).await;
    let french = create_spot(&app, Some("France")).await;

    // Disabled by configuration
    let (status, _) = assign(&app, &leader, &belgian, Some("alice")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.seed_configuration(true).await;
    let (status, _) = assign(&app, &leader, &french, Some("alice")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = assign(&app, &leader, &belgian, Some("pierre")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = assign(&app, &leader, &belgian, Some("alice")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // Leaders only list their own country
    let (status, body) = app.call("GET", "/v1/spots", Some(&leader), None).await;
    assert_eq!(status, StatusCode::OK);
    let spots = body.as_array().unwrap();
    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0]["spotId"], belgian.as_str());
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_assignment() {
    let app = TestApp::with_mailer(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    });
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;

    let (status, _) = assign(
        &app,
        &token("manager", &[Group::RegistrationManagers]),
        &spot_id,
        Some("alice"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.load_user("alice").await.spot.is_some());
}

#[tokio::test]
async fn test_proof_of_payment_flow() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);
    let alice = token("alice", &[]);
    assign(&app, &manager, &spot_id, Some("alice")).await;

    let proof_path = format!("/v1/spots/{}/proof-of-payment", spot_id);

    // Only the holder uploads
    let (status, _) = app
        .call(
            "POST",
            &proof_path,
            Some(&token("mallory", &[])),
            Some(json!({"contentType": "application/pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "POST",
            &proof_path,
            Some(&alice),
            Some(json!({"contentType": "application/pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let key = body["key"].as_str().unwrap().to_string();
    assert!(key.starts_with(&format!("proofs/{}/", spot_id)));
    assert!(key.ends_with(".pdf"));
    assert_eq!(body["uploadUrl"], format!("https://upload.test/{}", key));

    // A key pointing elsewhere is refused
    let (status, _) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", spot_id),
            Some(&alice),
            Some(json!({"action": "SET_PROOF_OF_PAYMENT", "key": "proofs/other/file.pdf"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", spot_id),
            Some(&alice),
            Some(json!({"action": "SET_PROOF_OF_PAYMENT", "key": key})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proofOfPaymentUri"], key.as_str());

    let stored: EventSpot = app.repo.load(&EventSpot::key_for(&spot_id)).await.unwrap();
    assert_eq!(
        app.load_user("alice").await.spot.unwrap().proof_of_payment_uri,
        stored.proof_of_payment_uri
    );

    let (status, body) = app.call("GET", &proof_path, Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], format!("https://download.test/{}", key));

    let (status, _) = app
        .call("GET", &proof_path, Some(&token("mallory", &[])), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_concurrent_assignment_keeps_single_holder() {
    let store = Arc::new(InterleavingStore::default());
    let app = TestApp::with_store(store.clone());
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("bob", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);

    queue_concurrent_assignment(&app, &store, &spot_id).await;
    let (status, body) = assign(&app, &manager, &spot_id, Some("alice")).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let stored: EventSpot = app.repo.load(&EventSpot::key_for(&spot_id)).await.unwrap();
    assert_eq!(stored.user_id.as_deref(), Some("bob"));
    assert!(app.load_user("alice").await.spot.is_none());
    assert_eq!(app.load_user("bob").await.spot.unwrap().spot_id, spot_id);
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_country_move_does_not_erase_concurrent_holder() {
    let store = Arc::new(InterleavingStore::default());
    let app = TestApp::with_store(store.clone());
    app.seed_configuration(false).await;
    app.seed_user("bob", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;

    queue_concurrent_assignment(&app, &store, &spot_id).await;
    let (status, _) = app
        .call(
            "PATCH",
            &format!("/v1/spots/{}", spot_id),
            Some(&token("manager", &[Group::RegistrationManagers])),
            Some(json!({"action": "ASSIGN_TO_COUNTRY", "sectionCountry": "France"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stored: EventSpot = app.repo.load(&EventSpot::key_for(&spot_id)).await.unwrap();
    assert_eq!(stored.user_id.as_deref(), Some("bob"));
    assert_eq!(stored.section_country.as_deref(), Some("Belgium"));
}

#[tokio::test]
async fn test_update_spot_refreshes_holder_copy() {
    let app = TestApp::new();
    let mut configuration = app.seed_configuration(false).await;
    configuration.spot_types.push("Volunteer".to_string());
    app.seed(&configuration).await;
    app.seed_user("alice", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);
    assign(&app, &manager, &spot_id, Some("alice")).await;
    let path = format!("/v1/spots/{}", spot_id);

    let (status, _) = app
        .call(
            "PUT",
            &path,
            Some(&token("alice", &[])),
            Some(json!({"type": "Volunteer"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "PUT",
            &path,
            Some(&manager),
            Some(json!({"type": "VIP", "description": "Front row"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("type"));

    // Holder and country are not editable here
    let (status, body) = app
        .call(
            "PUT",
            &path,
            Some(&manager),
            Some(json!({
                "type": "Volunteer",
                "description": "Backstage",
                "userId": "mallory",
                "sectionCountry": "France"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["type"], "Volunteer");
    assert_eq!(body["description"], "Backstage");
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["sectionCountry"], "Belgium");

    let attached = app.load_user("alice").await.spot.unwrap();
    assert_eq!(attached.spot_id, spot_id);
    assert_eq!(attached.spot_type, "Volunteer");
}

#[tokio::test]
async fn test_get_spot_visibility() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("bob", Some("Belgium")).await;
    app.seed_user("be-leader", Some("Belgium")).await;
    app.seed_user("fr-leader", Some("France")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);
    assign(&app, &manager, &spot_id, Some("alice")).await;
    let path = format!("/v1/spots/{}", spot_id);

    let allowed = [
        manager,
        token("alice", &[]),
        token("be-leader", &[Group::CountryLeaders]),
    ];
    for caller in &allowed {
        let (status, body) = app.call("GET", &path, Some(caller.as_str()), None).await;
        assert_eq!(status, StatusCode::OK, "{}", caller);
        assert_eq!(body["spotId"], spot_id.as_str());
    }

    let refused = [token("fr-leader", &[Group::CountryLeaders]), token("bob", &[])];
    for caller in &refused {
        let (status, _) = app.call("GET", &path, Some(caller.as_str()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", caller);
    }
}

#[tokio::test]
async fn test_replaced_proofs_are_deleted() {
    let app = TestApp::new();
    app.seed_configuration(false).await;
    app.seed_user("alice", Some("Belgium")).await;
    app.seed_user("bob", Some("Belgium")).await;
    let spot_id = create_spot(&app, Some("Belgium")).await;
    let manager = token("manager", &[Group::RegistrationManagers]);
    let alice = token("alice", &[]);
    assign(&app, &manager, &spot_id, Some("alice")).await;

    let first = request_proof_key(&app, &alice, &spot_id).await;
    assert_eq!(set_proof(&app, &alice, &spot_id, &first).await, StatusCode::OK);
    // Setting the same key again keeps the object
    assert_eq!(set_proof(&app, &alice, &spot_id, &first).await, StatusCode::OK);
    assert!(app.media.deleted.lock().unwrap().is_empty());

    let second = request_proof_key(&app, &alice, &spot_id).await;
    assert_ne!(first, second);
    assert_eq!(set_proof(&app, &alice, &spot_id, &second).await, StatusCode::OK);
    assert_eq!(*app.media.deleted.lock().unwrap(), vec![first.clone()]);

    // Handing the spot over clears the proof
    let (status, body) = assign(&app, &manager, &spot_id, Some("bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("proofOfPaymentUri").is_none());
    assert_eq!(*app.media.deleted.lock().unwrap(), vec![first, second]);
}
