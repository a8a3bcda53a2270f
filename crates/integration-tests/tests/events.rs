//! Event listing, validation and deletion.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use nagar_core::RegistrationRole;
use nagar_integration_tests::{TestApp, appears_before};

async fn add_event(app: &TestApp, cookie: &str, title: &str, date: &str) {
    let response = app
        .post_multipart(
            "/events/add",
            &[
                ("title", title),
                ("description", "Everyone welcome"),
                ("date", date),
                ("time", ""),
                ("location", "Community Hall"),
                ("form_link", ""),
            ],
            None,
            Some(cookie),
        )
        .await;
    assert_eq!(response.location(), Some("/events"), "{}", response.body);
}

#[tokio::test]
async fn events_are_listed_by_date_ascending() {
    let app = TestApp::new();
    let cookie = app.register("asha@example.com", RegistrationRole::Admin).await;

    add_event(&app, &cookie, "Harvest Fair", "2025-05-03").await;
    add_event(&app, &cookie, "Spring Clean-up", "2025-03-14").await;
    add_event(&app, &cookie, "Book Swap", "2025-04-01").await;

    let page = app.get("/events", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(appears_before(&page.body, "Spring Clean-up", "Book Swap"));
    assert!(appears_before(&page.body, "Book Swap", "Harvest Fair"));
}

#[tokio::test]
async fn missing_title_and_description_are_reported_without_a_write() {
    let app = TestApp::new();
    let cookie = app.register("asha@example.com", RegistrationRole::Admin).await;

    let response = app
        .post_multipart(
            "/events/add",
            &[("title", ""), ("description", ""), ("date", "2025-03-14")],
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Title is required"));
    assert!(response.body.contains("Description is required"));
    assert!(!response.body.contains("Date is"));
    assert_eq!(response.body.matches("class=\"field-error\"").count(), 2);

    assert!(app.state.store().list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn registration_link_and_removal() {
    let app = TestApp::new();
    let cookie = app.register("asha@example.com", RegistrationRole::Admin).await;

    let response = app
        .post_multipart(
            "/events/add",
            &[
                ("title", "Startup Meetup"),
                ("description", "Founders share their work"),
                ("date", "2025-06-20"),
                ("time", "18:00"),
                ("location", "Public Library"),
                ("form_link", "https://forms.example.com/meetup"),
            ],
            None,
            Some(&cookie),
        )
        .await;
    assert_eq!(response.location(), Some("/events"));

    let event = app
        .state
        .store()
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    let detail = app.get(&format!("/events/{}", event.id), None).await;
    assert!(detail.body.contains("href=\"https://forms.example.com/meetup\""));
    assert!(!detail.body.contains("/delete\""));

    let response = app
        .post_form(&format!("/events/{}/delete", event.id), &[], Some(&cookie))
        .await;
    assert_eq!(response.location(), Some("/events"));
    assert!(app.state.store().list_events().await.unwrap().is_empty());

    let response = app.get(&format!("/events/{}", event.id), None).await;
    assert_eq!(response.location(), Some("/events"));
}
