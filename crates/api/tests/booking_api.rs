//! Integration tests for the booking lifecycle: submission, listing,
//! adjudication and slot availability.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, get_auth, post_json_auth, signup, submit, venue_booking,
};
use serde_json::json;
use venuebook_db::MemoryStore;

const SLOT: &str = "slot_2030-01-15_10";

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn student_submission_starts_pending() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store);
    let (token, user_id) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let booking = submit(app, &token, venue_booking(SLOT)).await;

    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["user_id"], user_id);
    assert_eq!(booking["user_name"], "Student User");
    assert_eq!(booking["venue_name"], "LT1");
    assert_eq!(booking["category"], "lecture");
    assert_eq!(booking["target_kind"], "venue");
    assert_eq!(booking["time_slots"], json!([SLOT]));
    assert!(booking["admin_feedback"].is_null());
    assert!(booking.get("request_token").is_none());
}

#[tokio::test]
async fn faculty_recommendation_raises_priority() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Faculty User", "faculty@edu.com", "faculty").await;

    let mut body = venue_booking(SLOT);
    body["faculty_recommendation"] = json!("Dr. Rao");
    let booking = submit(app, &token, body).await;

    assert_eq!(booking["status"], "high-priority");
    assert_eq!(booking["faculty_recommendation"]["faculty_name"], "Dr. Rao");
    // Names someone other than the submitter.
    assert!(booking["faculty_recommendation"]["faculty_id"].is_null());
}

#[tokio::test]
async fn faculty_recommending_themselves_is_linked_to_their_account() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, user_id) = signup(app.clone(), "Dr. Rao", "rao@edu.com", "faculty").await;

    let mut body = venue_booking(SLOT);
    body["faculty_recommendation"] = json!("dr. rao");
    let booking = submit(app, &token, body).await;

    assert_eq!(booking["faculty_recommendation"]["faculty_id"], user_id);
}

#[tokio::test]
async fn blank_recommendation_stays_pending() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let mut body = venue_booking(SLOT);
    body["faculty_recommendation"] = json!("   ");
    let booking = submit(app, &token, body).await;

    assert_eq!(booking["status"], "pending");
    assert!(booking["faculty_recommendation"].is_null());
}

#[tokio::test]
async fn admin_cannot_submit() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (token, _) = admin_token(app.clone(), &store).await;

    let response = post_json_auth(app, "/api/v1/bookings", &token, venue_booking(SLOT)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn over_capacity_submission_is_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    // CL1 seats 40.
    let mut body = venue_booking(SLOT);
    body["venue_id"] = json!(4);
    body["attendees"] = json!(41);
    let response = post_json_auth(app, "/api/v1/bookings", &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn missing_purpose_is_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let mut body = venue_booking(SLOT);
    body["purpose"] = json!("  ");
    let response = post_json_auth(app, "/api/v1/bookings", &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_venue_returns_404() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let mut body = venue_booking(SLOT);
    body["venue_id"] = json!(99);
    let response = post_json_auth(app, "/api/v1/bookings", &token, body).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Venue with id 99 not found");
}

#[tokio::test]
async fn package_booking_takes_one_day_slot() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let body = json!({
        "package_id": 1,
        "purpose": "Tech Fest",
        "description": "Annual club showcase",
        "attendees": 120,
        "time_slots": ["day_2030-01-16"],
        "target_audience": "All students",
    });
    let booking = submit(app.clone(), &token, body).await;
    assert_eq!(booking["target_kind"], "package");
    assert_eq!(booking["category"], "event");
    assert_eq!(booking["venue_name"], "Club Event Package");

    // Hourly slots are not valid for packages.
    let body = json!({
        "package_id": 1,
        "purpose": "Tech Fest",
        "description": "Annual club showcase",
        "attendees": 120,
        "time_slots": [SLOT],
        "target_audience": "All students",
    });
    let response = post_json_auth(app, "/api/v1/bookings", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn both_target_ids_are_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let mut body = venue_booking(SLOT);
    body["package_id"] = json!(1);
    let response = post_json_auth(app, "/api/v1/bookings", &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replayed_request_token_returns_existing_booking() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let mut body = venue_booking(SLOT);
    body["request_token"] = json!("form-7f3a");

    let first = post_json_auth(app.clone(), "/api/v1/bookings", &token, body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;

    let second = post_json_auth(app.clone(), "/api/v1/bookings", &token, body).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let list = body_json(get_auth(app, "/api/v1/bookings", &token).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Listing and visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn students_only_see_their_own_bookings() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (alice, alice_id) = signup(app.clone(), "Alice", "alice@edu.com", "student").await;
    let (bob, bob_id) = signup(app.clone(), "Bob", "bob@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    submit(app.clone(), &alice, venue_booking(SLOT)).await;
    let bobs = submit(app.clone(), &bob, venue_booking("slot_2030-01-15_11")).await;

    // Unfiltered list is scoped to the caller.
    let list = body_json(get_auth(app.clone(), "/api/v1/bookings", &alice).await).await;
    let list = list["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user_id"], alice_id);

    // Asking for someone else's bookings is forbidden.
    let uri = format!("/api/v1/bookings?user_id={bob_id}");
    let response = get_auth(app.clone(), &uri, &alice).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // So is reading one directly.
    let uri = format!("/api/v1/bookings/{}", bobs["id"]);
    let response = get_auth(app.clone(), &uri, &alice).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins can filter by any user.
    let uri = format!("/api/v1/bookings?user_id={bob_id}");
    let list = body_json(get_auth(app.clone(), &uri, &admin).await).await;
    let list = list["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user_id"], bob_id);

    let all = body_json(get_auth(app, "/api/v1/bookings", &admin).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bookings_are_listed_most_recent_first() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let first = submit(app.clone(), &token, venue_booking(SLOT)).await;
    let second = submit(app.clone(), &token, venue_booking("slot_2030-01-15_11")).await;

    let list = body_json(get_auth(app, "/api/v1/bookings", &token).await).await;
    let list = list["data"].as_array().unwrap();
    assert_eq!(list[0]["id"], second["id"]);
    assert_eq!(list[1]["id"], first["id"]);
}

#[tokio::test]
async fn open_bookings_partition_by_category() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    // Two lecture bookings (LT1, CR101) and one event booking (MPH).
    submit(app.clone(), &student, venue_booking(SLOT)).await;
    let mut cr101 = venue_booking(SLOT);
    cr101["venue_id"] = json!(3);
    submit(app.clone(), &student, cr101).await;
    let mut mph = venue_booking(SLOT);
    mph["venue_id"] = json!(5);
    let event = submit(app.clone(), &student, mph).await;

    // Deciding one removes it from the open queues.
    let uri = format!("/api/v1/bookings/{}/reject", event["id"]);
    let response = post_json_auth(app.clone(), &uri, &admin, json!({ "comment": "Hall closed" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let count = |uri: &'static str| {
        let app = app.clone();
        let admin = admin.clone();
        async move {
            let json = body_json(get_auth(app, uri, &admin).await).await;
            json["data"].as_array().unwrap().len()
        }
    };

    let open = count("/api/v1/bookings?open_only=true").await;
    let lecture = count("/api/v1/bookings?open_only=true&category=lecture").await;
    let event = count("/api/v1/bookings?open_only=true&category=event").await;

    assert_eq!(open, 2);
    assert_eq!(lecture, 2);
    assert_eq!(event, 0);
    assert_eq!(lecture + event, open);
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (token, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let response = get_auth(app, "/api/v1/bookings?status=archived", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Adjudication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_booking_cannot_be_approved() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let (admin, admin_id) = admin_token(app.clone(), &store).await;

    let booking = submit(app.clone(), &student, venue_booking(SLOT)).await;
    assert_eq!(booking["status"], "pending");

    let reject_uri = format!("/api/v1/bookings/{}/reject", booking["id"]);
    let response = post_json_auth(
        app.clone(),
        &reject_uri,
        &admin,
        json!({ "comment": "Room conflict" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rejected = body_json(response).await;
    assert_eq!(rejected["data"]["status"], "rejected");
    assert_eq!(rejected["data"]["admin_feedback"]["comment"], "Room conflict");
    assert_eq!(rejected["data"]["admin_feedback"]["admin_id"], admin_id);

    let approve_uri = format!("/api/v1/bookings/{}/approve", booking["id"]);
    let response = post_json_auth(
        app.clone(),
        &approve_uri,
        &admin,
        json!({ "comment": "Changed my mind" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");

    // The original feedback is untouched.
    let uri = format!("/api/v1/bookings/{}", booking["id"]);
    let current = body_json(get_auth(app, &uri, &student).await).await;
    assert_eq!(current["data"]["status"], "rejected");
    assert_eq!(current["data"]["admin_feedback"]["comment"], "Room conflict");
}

#[tokio::test]
async fn high_priority_booking_can_be_approved() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (faculty, _) = signup(app.clone(), "Faculty User", "faculty@edu.com", "faculty").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    let mut body = venue_booking(SLOT);
    body["faculty_recommendation"] = json!("Dr. Rao");
    let booking = submit(app.clone(), &faculty, body).await;

    let uri = format!("/api/v1/bookings/{}/approve", booking["id"]);
    let response = post_json_auth(app, &uri, &admin, json!({ "comment": "Enjoy" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
}

#[tokio::test]
async fn student_cannot_approve() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let booking = submit(app.clone(), &student, venue_booking(SLOT)).await;

    let uri = format!("/api/v1/bookings/{}/approve", booking["id"]);
    let response = post_json_auth(app, &uri, &student, json!({ "comment": "Looks good" })).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn decision_requires_a_comment() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;
    let booking = submit(app.clone(), &student, venue_booking(SLOT)).await;

    let uri = format!("/api/v1/bookings/{}/reject", booking["id"]);
    let response = post_json_auth(app, &uri, &admin, json!({ "comment": "   " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deciding_unknown_booking_returns_404() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (admin, _) = admin_token(app.clone(), &store).await;

    let response = post_json_auth(
        app,
        "/api/v1/bookings/999/approve",
        &admin,
        json!({ "comment": "ok" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Booking with id 999 not found");
}

#[tokio::test]
async fn approving_a_clashing_booking_returns_409() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (alice, _) = signup(app.clone(), "Alice", "alice@edu.com", "student").await;
    let (bob, _) = signup(app.clone(), "Bob", "bob@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    let first = submit(app.clone(), &alice, venue_booking(SLOT)).await;
    let second = submit(app.clone(), &bob, venue_booking(SLOT)).await;

    let uri = format!("/api/v1/bookings/{}/approve", first["id"]);
    let response = post_json_auth(app.clone(), &uri, &admin, json!({ "comment": "ok" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/api/v1/bookings/{}/approve", second["id"]);
    let response = post_json_auth(app.clone(), &uri, &admin, json!({ "comment": "ok" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");

    // Rejecting the loser is still allowed.
    let uri = format!("/api/v1/bookings/{}/reject", second["id"]);
    let response = post_json_auth(app, &uri, &admin, json!({ "comment": "Taken" })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_clashing_approvals_admit_only_one() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (alice, _) = signup(app.clone(), "Alice", "alice@edu.com", "student").await;
    let (bob, _) = signup(app.clone(), "Bob", "bob@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    let first = submit(app.clone(), &alice, venue_booking(SLOT)).await;
    let second = submit(app.clone(), &bob, venue_booking(SLOT)).await;

    let first_uri = format!("/api/v1/bookings/{}/approve", first["id"]);
    let second_uri = format!("/api/v1/bookings/{}/approve", second["id"]);
    let (a, b) = tokio::join!(
        post_json_auth(app.clone(), &first_uri, &admin, json!({ "comment": "ok" })),
        post_json_auth(app.clone(), &second_uri, &admin, json!({ "comment": "ok" })),
    );

    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let approved = body_json(
        get_auth(app, "/api/v1/bookings?status=approved", &admin).await,
    )
    .await;
    assert_eq!(approved["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Availability and dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approved_slots_become_unavailable() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    let slots_uri = "/api/v1/venues/1/slots?from=2030-01-15";
    let is_available = |json: &serde_json::Value, id: &str| {
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["id"] == id)
            .map(|s| s["is_available"] == true)
            .unwrap()
    };

    let before = body_json(get_auth(app.clone(), slots_uri, &student).await).await;
    assert_eq!(before["data"].as_array().unwrap().len(), 70);
    assert!(is_available(&before, SLOT));

    // Pending bookings do not hold a slot.
    let booking = submit(app.clone(), &student, venue_booking(SLOT)).await;
    let pending = body_json(get_auth(app.clone(), slots_uri, &student).await).await;
    assert!(is_available(&pending, SLOT));

    let uri = format!("/api/v1/bookings/{}/approve", booking["id"]);
    post_json_auth(app.clone(), &uri, &admin, json!({ "comment": "ok" })).await;

    let after = body_json(get_auth(app, slots_uri, &student).await).await;
    assert!(!is_available(&after, SLOT));
    assert!(is_available(&after, "slot_2030-01-15_11"));
}

#[tokio::test]
async fn malformed_slot_window_date_is_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let response = get_auth(app, "/api/v1/venues/1/slots?from=15-01-2030", &student).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn slot_window_past_the_calendar_end_is_rejected() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;

    let response = get_auth(app, "/api/v1/venues/1/slots?from=%2B262142-12-30", &student).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn dashboard_reflects_role() {
    let store = Arc::new(MemoryStore::new());
    let app = common::build_test_app(store.clone());
    let (student, _) = signup(app.clone(), "Student User", "student@edu.com", "student").await;
    let (faculty, _) = signup(app.clone(), "Faculty User", "faculty@edu.com", "faculty").await;
    let (admin, _) = admin_token(app.clone(), &store).await;

    let booking = submit(app.clone(), &student, venue_booking(SLOT)).await;
    let mut recommended = venue_booking("slot_2030-01-15_11");
    recommended["faculty_recommendation"] = json!("Dr. Rao");
    submit(app.clone(), &faculty, recommended).await;

    let uri = format!("/api/v1/bookings/{}/approve", booking["id"]);
    post_json_auth(app.clone(), &uri, &admin, json!({ "comment": "ok" })).await;

    let admin_view = body_json(get_auth(app.clone(), "/api/v1/dashboard", &admin).await).await;
    let data = &admin_view["data"];
    assert_eq!(data["role"], "admin");
    assert_eq!(data["total"], 2);
    assert_eq!(data["counts"]["approved"], 1);
    assert_eq!(data["counts"]["high_priority"], 1);
    assert_eq!(data["open_by_category"]["lecture"], 1);
    assert_eq!(data["recent"].as_array().unwrap().len(), 1);

    let student_view = body_json(get_auth(app, "/api/v1/dashboard", &student).await).await;
    let data = &student_view["data"];
    assert_eq!(data["role"], "student");
    assert_eq!(data["total"], 1);
    assert_eq!(data["counts"]["approved"], 1);
    assert!(data.get("open_by_category").is_none());
}
