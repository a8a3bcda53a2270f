//! Role-gated navigation and actions.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use nagar_core::{RegistrationRole, Role};
use nagar_integration_tests::{ImagePart, TestApp};

const ADD_EVENT_LINK: &str = "href=\"/events/add\"";
const ADD_PRODUCT_LINK: &str = "href=\"/products/add\"";

#[tokio::test]
async fn guests_see_no_add_links_and_cannot_write() {
    let app = TestApp::new();

    let home = app.get("/", None).await;
    assert!(!home.body.contains(ADD_EVENT_LINK));
    assert!(!home.body.contains(ADD_PRODUCT_LINK));

    let response = app
        .post_multipart(
            "/events/add",
            &[
                ("title", "Sneaky Event"),
                ("description", "Should not be stored"),
                ("date", "2025-03-14"),
            ],
            None,
            None,
        )
        .await;
    assert_eq!(response.location(), Some("/login"));

    let response = app
        .post_multipart(
            "/products/add",
            &[
                ("name", "Sneaky Product"),
                ("description", "Should not be stored"),
                ("price", "10"),
                ("seller_name", "Nobody"),
            ],
            Some(ImagePart {
                file_name: "x.png",
                content_type: "image/png",
                bytes: b"\x89PNG",
            }),
            None,
        )
        .await;
    assert_eq!(response.location(), Some("/login"));

    assert!(app.state.store().list_events().await.unwrap().is_empty());
    assert!(app.state.store().list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_registration_grants_admin_only() {
    let app = TestApp::new();
    let cookie = app.register("asha@example.com", RegistrationRole::Admin).await;

    let home = app.get("/", Some(&cookie)).await;
    assert!(home.body.contains(ADD_EVENT_LINK));
    assert!(!home.body.contains(ADD_PRODUCT_LINK));

    let profile = app.get("/profile", Some(&cookie)).await;
    assert!(profile.body.contains(Role::Admin.label()));

    let response = app.get("/products/add", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn entrepreneur_registration_grants_entrepreneur_only() {
    let app = TestApp::new();
    let cookie = app
        .register("ravi@example.com", RegistrationRole::Entrepreneur)
        .await;

    let home = app.get("/", Some(&cookie)).await;
    assert!(!home.body.contains(ADD_EVENT_LINK));
    assert!(home.body.contains(ADD_PRODUCT_LINK));

    let response = app.get("/events/add", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/products/add", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("ravi@example.com"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_regardless_of_case() {
    let app = TestApp::new();
    app.register("asha@example.com", RegistrationRole::Admin).await;

    let response = app
        .post_form(
            "/register",
            &[
                ("email", " Asha@Example.COM "),
                ("password", "secret1"),
                ("confirm_password", "secret1"),
                ("role", "entrepreneur"),
            ],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("This email is already in use"));
    assert!(response.cookie().is_none());
}

#[tokio::test]
async fn sign_out_ends_the_session() {
    let app = TestApp::new();
    let cookie = app.register("asha@example.com", RegistrationRole::Admin).await;

    let response = app.post_form("/logout", &[], Some(&cookie)).await;
    assert_eq!(response.location(), Some("/"));

    let home = app.get("/", Some(&cookie)).await;
    assert!(!home.body.contains(ADD_EVENT_LINK));
    assert!(home.body.contains("href=\"/login\""));
}
