//! Uploaded image serving.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::Result;
use crate::state::AppState;
use crate::storage::ObjectKey;

/// Uploaded objects never change once written.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Visitor uploads are never allowed to run script, even when opened directly.
const MEDIA_POLICY: &str = "default-src 'none'; img-src 'self'; sandbox";

/// Serve an object from storage at `/media/<area>/<name>`.
pub async fn serve(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let Ok(key) = ObjectKey::parse(&path) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let Some(object) = state.storage().get(&key).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE)),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(MEDIA_POLICY),
            ),
        ],
        object.bytes,
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;
    use axum::http::{StatusCode, header};

    use super::MEDIA_POLICY;
    use crate::routes::test_support::*;
    use crate::storage::{MediaArea, ObjectKey};

    #[tokio::test]
    async fn test_serves_stored_object() {
        let state = state();
        let key = ObjectKey::random(MediaArea::Chat, "wave.gif");
        let url = state
            .storage()
            .put(&key, Bytes::from_static(b"GIF89a"), "image/gif")
            .await
            .unwrap();

        let response = send(&app(&state), get(&url, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/gif"
        );
        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_SECURITY_POLICY).unwrap(),
            MEDIA_POLICY
        );
        assert_eq!(body_string(response).await, "GIF89a");
    }

    #[tokio::test]
    async fn test_svg_upload_is_rejected_and_never_stored() {
        let state = state();
        let svg: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>";
        let body = multipart_body(&[("text", "")], Some(("x.svg", "image/svg+xml", svg)));

        let response = send(
            &app(&state),
            post_multipart("/chat", body, Some("chat_user_name=Eve")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_string(response).await.contains("Please choose an image file"));
        assert!(state.store().recent_chat_messages(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_keys_are_not_found() {
        let app = app(&state());
        for uri in ["/media/chat/missing.png", "/media/secrets/key.pem", "/media/chat/..%2Fx"] {
            let response = send(&app, get(uri, None)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }
}
