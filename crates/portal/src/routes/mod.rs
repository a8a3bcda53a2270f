//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Backend readiness check
//!
//! # Events
//! GET  /events                 - Event listing (date ascending)
//! GET  /events/add             - Add event form (admin)
//! POST /events/add             - Create event (admin, multipart)
//! GET  /events/{id}            - Event detail
//! POST /events/{id}/delete     - Delete event (admin)
//!
//! # Products
//! GET  /products               - Product listing (newest first)
//! GET  /products/add           - Add product form (entrepreneur)
//! POST /products/add           - Create product (entrepreneur, multipart)
//! GET  /products/{id}          - Product detail
//! POST /products/{id}/delete   - Delete product (seller only)
//!
//! # Chat
//! GET  /chat                   - Chat room
//! POST /chat                   - Send message (multipart)
//! POST /chat/name              - Choose display name (cookie)
//! GET  /chat/messages          - Message list fragment
//! GET  /chat/stream            - Message list fragment as server-sent events
//!
//! # Account
//! GET  /profile                - Profile page
//! GET  /login, POST /login     - Sign in
//! GET  /register, POST /register - Create account
//! POST /logout                 - Sign out
//!
//! # Files
//! GET  /media/{area}/{name}    - Uploaded images
//! GET  /static/*               - Stylesheet and chat script
//! ```
//!
//! Any other path redirects to `/`.

pub mod auth;
pub mod chat;
pub mod events;
pub mod health;
pub mod home;
pub mod media;
pub mod products;
pub mod profile;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory the stylesheet is served from.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Room left in a request body for form fields around the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the event routes router.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::index))
        .route("/add", get(events::add_page).post(events::add))
        .route("/{id}", get(events::show))
        .route("/{id}/delete", post(events::delete))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/add", get(products::add_page).post(products::add))
        .route("/{id}", get(products::show))
        .route("/{id}/delete", post(products::delete))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::index).post(chat::send))
        .route("/name", post(chat::set_name))
        .route("/messages", get(chat::messages))
        .route("/stream", get(chat::stream))
}

/// Create all page routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/events", event_routes())
        .nest("/products", product_routes())
        .nest("/chat", chat_routes())
        .route("/profile", get(profile::profile))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/media/{*path}", get(media::serve))
}

/// Build the complete application: routes, static files and middleware.
///
/// Sentry layers are added by the binary around this router.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());
    let body_limit = state
        .config()
        .max_upload_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Unmatched paths go home.
async fn fallback() -> Redirect {
    Redirect::to("/")
}

/// Render a form page again with its validation messages.
pub(crate) fn rejected(page: impl IntoResponse) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    //! Helpers for driving the router in unit tests.

    use axum::{
        Router,
        body::Body,
        http::{Request, Response, header},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use nagar_core::{Email, RegistrationRole};

    use crate::config::PortalConfig;
    use crate::models::CurrentUser;
    use crate::services::AuthService;
    use crate::state::AppState;

    pub const BOUNDARY: &str = "nagar-test-boundary";

    pub fn state() -> AppState {
        AppState::in_memory(PortalConfig::in_memory("http://localhost:3000"))
    }

    pub fn app(state: &AppState) -> Router {
        super::app(state.clone(), MemoryStore::default())
    }

    pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    pub async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    /// A `multipart/form-data` body with text fields and an optional
    /// `(file_name, content_type, bytes)` image part.
    pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub fn post_multipart(uri: &str, body: Vec<u8>, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    /// The `name=value` part of a response's first `Set-Cookie` header.
    pub fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }

    /// The redirect target of a response.
    pub fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    /// Register through the router and return the session cookie.
    pub async fn sign_up(app: &Router, email: &str, role: RegistrationRole) -> String {
        let body = format!(
            "email={}&password=secret1&confirm_password=secret1&role={}",
            urlencoding::encode(email),
            role.as_str()
        );
        let response = send(app, post_form("/register", &body, None)).await;
        assert_eq!(location(&response), "/profile");
        session_cookie(&response)
    }

    /// Register directly against the backend.
    pub async fn account(state: &AppState, email: &str, role: RegistrationRole) -> CurrentUser {
        let user = AuthService::new(state.store())
            .register(email, "secret1", role)
            .await
            .unwrap();
        assert_eq!(user.email, Email::parse(email).unwrap());
        user
    }
}
