//! Router contract tests for the Nagar portal.
//!
//! Every test builds the full router over the in-memory backend and drives
//! it with `tower::ServiceExt::oneshot`; no listener or database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nagar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `access` - Role-gated navigation and actions
//! - `events` - Event listing order, validation and deletion
//! - `products` - Seller-only controls
//! - `chat` - Room history, image-only messages and the live stream
//! - `navigation` - Fallbacks and health checks

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use nagar_core::RegistrationRole;
use nagar_portal::config::PortalConfig;
use nagar_portal::routes;
use nagar_portal::state::AppState;

/// Password used for every account the helpers register.
pub const PASSWORD: &str = "secret1";

const BOUNDARY: &str = "nagar-contract-boundary";

/// A portal instance over the in-memory backend.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// A fully-read response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// The body as text, with invalid UTF-8 replaced.
    pub body: String,
    /// The raw body, for media responses.
    pub bytes: Bytes,
}

impl TestResponse {
    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// The `name=value` part of the first `Set-Cookie` header.
    #[must_use]
    pub fn cookie(&self) -> Option<String> {
        let set_cookie = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        set_cookie.split(';').next().map(str::to_owned)
    }
}

/// An image part for multipart submissions.
pub struct ImagePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build a fresh portal with empty collections.
    #[must_use]
    pub fn new() -> Self {
        let state = AppState::in_memory(PortalConfig::in_memory("http://localhost:3000"));
        let router = routes::app(state.clone(), MemoryStore::default());
        Self { state, router }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Submit an urlencoded form built from `fields`.
    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Submit a `multipart/form-data` form with an optional `image` part.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<ImagePart<'_>>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(image) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    image.file_name, image.content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(image.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register through the form and return the session cookie.
    pub async fn register(&self, email: &str, role: RegistrationRole) -> String {
        let response = self
            .post_form(
                "/register",
                &[
                    ("email", email),
                    ("password", PASSWORD),
                    ("confirm_password", PASSWORD),
                    ("role", role.as_str()),
                ],
                None,
            )
            .await;
        assert_eq!(response.location(), Some("/profile"), "{}", response.body);
        response.cookie().unwrap()
    }
}

/// Whether `first` occurs before `second` in `haystack`.
#[must_use]
pub fn appears_before(haystack: &str, first: &str, second: &str) -> bool {
    match (haystack.find(first), haystack.find(second)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}
