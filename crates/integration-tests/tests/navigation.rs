//! Fallbacks, redirects and health checks.

use axum::http::StatusCode;

use nagar_integration_tests::TestApp;

#[tokio::test]
async fn unmatched_paths_redirect_home() {
    let app = TestApp::new();
    for uri in ["/nope", "/events/1/edit", "/admin"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.location(), Some("/"), "{uri}");
    }
}

#[tokio::test]
async fn unknown_event_ids_redirect_to_listing() {
    let app = TestApp::new();
    for uri in ["/events/not-a-uuid", "/events/00000000-0000-4000-8000-000000000000"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.location(), Some("/events"), "{uri}");
    }
}

#[tokio::test]
async fn signed_out_profile_prompts_to_sign_in() {
    let app = TestApp::new();
    let response = app.get("/profile", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("href=\"/login\""));
    assert!(response.body.contains("href=\"/register\""));
}

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new();
    assert_eq!(app.get("/health", None).await.body, "ok");
    assert_eq!(app.get("/health/ready", None).await.status, StatusCode::OK);
}
