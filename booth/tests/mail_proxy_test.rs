//! HTTP tests for the mail-proxy endpoints.
//!
//! Run with: `cargo test -p booth-reservations --test mail_proxy_test`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

mod common;

use axum::http::{Method, StatusCode};
use booth_core::mail::{MailingList, Trigger};
use booth_testing::Call;
use common::spawn_app;
use serde_json::{Value, json};

fn confirmation() -> Value {
    json!({
        "subscriber": "jane@example.com",
        "name": "Jane Doe",
        "company": "Acme Medical",
        "country": "Germany",
        "inquiry_type": "Product & Purchasing Inquiry",
        "meeting_date": "February 9, 2026",
        "meeting_time": "10:00",
        "manage_link": "https://booth.example.com/my-booking?id=1"
    })
}

// ============================================================================
// Method handling
// ============================================================================

#[tokio::test]
async fn options_is_ok_and_other_methods_are_405() {
    let app = spawn_app();

    for path in [
        "/api/send-confirmation",
        "/api/notify-update",
        "/api/notify-cancel",
        "/api/notify-admin",
        "/api/delete-subscriber",
    ] {
        app.server
            .method(Method::OPTIONS, path)
            .await
            .assert_status_ok();

        let response = app.server.get(path).await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.json::<Value>()["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn missing_or_blank_fields_are_400() {
    let app = spawn_app();

    let mut request = confirmation();
    request["meeting_time"] = json!("  ");
    let response = app.server.post("/api/send-confirmation").json(&request).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing required fields");

    app.server
        .post("/api/notify-cancel")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/delete-subscriber")
        .text("not json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(app.log.calls().is_empty());
}

#[tokio::test]
async fn unconfigured_provider_is_a_500_configuration_error() {
    let app = spawn_app();
    app.mail.unconfigure();

    let response = app
        .server
        .post("/api/send-confirmation")
        .json(&confirmation())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "Server configuration error");
    assert!(app.log.calls().is_empty());
}

// ============================================================================
// send-confirmation
// ============================================================================

#[tokio::test]
async fn confirmation_subscribes_sends_and_copies_admins() {
    let app = spawn_app();
    app.mail
        .add_subscriber(MailingList::Admins, "ops@example.com", "Ops");

    let response = app
        .server
        .post("/api/send-confirmation")
        .json(&confirmation())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "message": "Confirmation processed" })
    );

    let stored = app
        .mail
        .subscriber(MailingList::Customers, "jane@example.com")
        .unwrap();
    assert_eq!(stored.fields["meeting_date"], "February 9, 2026");
    assert_eq!(app.mail.fired_of(Trigger::Creation).len(), 1);

    let copies = app.mail.fired_of(Trigger::AdminNotify);
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].email, "ops@example.com");
    assert_eq!(copies[0].extra["company"], "Acme Medical");
    assert_eq!(copies[0].extra["manage_link"], "https://booth.example.com/admin");
}

#[tokio::test]
async fn failed_subscribe_is_500_and_sends_nothing() {
    let app = spawn_app();
    app.mail.fail_upserts(true);

    let response = app
        .server
        .post("/api/send-confirmation")
        .json(&confirmation())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"].is_string());
    assert_eq!(app.log.triggers(Trigger::Creation), 0);
}

#[tokio::test]
async fn failed_confirmation_trigger_is_still_200() {
    let app = spawn_app();
    app.mail.fail_trigger(Trigger::Creation);

    app.server
        .post("/api/send-confirmation")
        .json(&confirmation())
        .await
        .assert_status_ok();

    assert_eq!(app.log.triggers(Trigger::Creation), 1);
}

// ============================================================================
// notify-update / notify-cancel
// ============================================================================

#[tokio::test]
async fn update_notice_is_sent_even_if_refresh_fails() {
    let app = spawn_app();
    app.mail.fail_upserts(true);

    let response = app
        .server
        .post("/api/notify-update")
        .json(&json!({
            "email": "jane@example.com",
            "name": "Jane Doe",
            "date": "February 10, 2026",
            "time": "15:30"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "success": true }));

    let sent = app.mail.fired_of(Trigger::Update);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].extra["meeting_time"], "15:30");
    assert!(matches!(app.log.calls()[0], Call::Upsert { .. }));
}

#[tokio::test]
async fn failed_update_trigger_is_500() {
    let app = spawn_app();
    app.mail.fail_trigger(Trigger::Update);

    app.server
        .post("/api/notify-update")
        .json(&json!({ "email": "jane@example.com", "date": "February 10, 2026", "time": "15:30" }))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn cancel_notice_reports_trigger_failures() {
    let app = spawn_app();

    app.server
        .post("/api/notify-cancel")
        .json(&json!({ "email": "jane@example.com" }))
        .await
        .assert_status_ok();
    assert_eq!(app.mail.fired_of(Trigger::Cancellation).len(), 1);

    app.mail.fail_trigger(Trigger::Cancellation);
    let response = app
        .server
        .post("/api/notify-cancel")
        .json(&json!({ "email": "jane@example.com" }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        response.json::<Value>()["error"]
            .as_str()
            .unwrap()
            .contains("500")
    );
}

// ============================================================================
// notify-admin / delete-subscriber
// ============================================================================

fn admin_notice() -> Value {
    json!({
        "type": "create",
        "name": "Jane Doe",
        "company": "Acme Medical",
        "country": "Germany",
        "date": "February 9, 2026",
        "time": "10:00",
        "inquiryType": "Product & Purchasing Inquiry"
    })
}

#[tokio::test]
async fn admin_notice_without_admins_says_so() {
    let app = spawn_app();

    let response: Value = app
        .server
        .post("/api/notify-admin")
        .json(&admin_notice())
        .await
        .json();

    assert_eq!(response, json!({ "message": "No admins to notify" }));
}

#[tokio::test]
async fn admin_notice_reaches_every_admin() {
    let app = spawn_app();
    app.mail
        .add_subscriber(MailingList::Admins, "ops@example.com", "Ops");
    app.mail
        .add_subscriber(MailingList::Admins, "sales@example.com", "Sales");

    let response: Value = app
        .server
        .post("/api/notify-admin")
        .json(&admin_notice())
        .await
        .json();

    assert_eq!(response["notified"], 2);
    let sent = app.mail.fired_of(Trigger::AdminNotify);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].extra["type"], "create");
    assert_eq!(sent[0].extra["inquiry_type"], "Product & Purchasing Inquiry");
}

#[tokio::test]
async fn admin_fan_out_failure_is_a_200_warning() {
    let app = spawn_app();
    app.mail
        .add_subscriber(MailingList::Admins, "ops@example.com", "Ops");
    app.mail.fail_trigger(Trigger::AdminNotify);

    let response = app
        .server
        .post("/api/notify-admin")
        .json(&admin_notice())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["warning"], "Admin notification failed");
}

#[tokio::test]
async fn delete_subscriber_removes_the_contact() {
    let app = spawn_app();
    app.mail
        .add_subscriber(MailingList::Customers, "jane@example.com", "Jane");

    app.server
        .post("/api/delete-subscriber")
        .json(&json!({ "email": "jane@example.com" }))
        .await
        .assert_status_ok();

    assert!(
        app.mail
            .subscriber(MailingList::Customers, "jane@example.com")
            .is_none()
    );
}
