//! Chat room route handlers.
//!
//! The visitor's display name lives in the `chat_user_name` cookie and is
//! not tied to their account. The message list is rendered server side;
//! `/chat/stream` pushes a freshly rendered list whenever the room changes.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, State},
    response::{
        IntoResponse, Redirect, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use futures::{Stream, StreamExt};
use time::Duration;
use tracing::instrument;

use nagar_core::{DisplayName, FieldErrors};

use super::rejected;
use crate::error::Result;
use crate::filters;
use crate::forms::{ChatMessageForm, ChatNameForm, MultipartForm};
use crate::middleware::Viewer;
use crate::models::ChatMessage;
use crate::state::AppState;

/// Cookie holding the visitor's chosen display name.
pub const CHAT_NAME_COOKIE: &str = "chat_user_name";

/// SSE event name carrying a rendered message list.
const MESSAGES_EVENT: &str = "messages";

/// Chat room page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat/index.html")]
pub struct ChatTemplate {
    pub viewer: Viewer,
    /// `None` until the visitor picks a name; the page then shows the prompt.
    pub user_name: Option<DisplayName>,
    pub messages: Vec<ChatMessage>,
    pub errors: FieldErrors,
    /// Draft text to keep in the box after a rejected send.
    pub text: String,
    pub max_upload_mb: usize,
}

/// Message list fragment, also embedded in the room page.
#[derive(Template, WebTemplate)]
#[template(path = "chat/messages.html")]
pub struct ChatMessagesTemplate {
    pub messages: Vec<ChatMessage>,
}

/// The display name stored in the visitor's cookie, if valid.
///
/// The jar percent-decodes cookie values on read and encodes them on write.
fn chat_name(jar: &CookieJar) -> Option<DisplayName> {
    let cookie = jar.get(CHAT_NAME_COOKIE)?;
    DisplayName::parse(cookie.value()).ok()
}

fn name_cookie(name: &DisplayName, secure: bool) -> Cookie<'static> {
    Cookie::build((CHAT_NAME_COOKIE, name.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::days(365))
        .build()
}

async fn room(
    state: &AppState,
    viewer: Viewer,
    user_name: Option<DisplayName>,
    errors: FieldErrors,
    text: String,
) -> Result<ChatTemplate> {
    let messages = state.chat().recent().await?;
    Ok(ChatTemplate {
        viewer,
        user_name,
        messages,
        errors,
        text,
        max_upload_mb: state.config().max_upload_megabytes(),
    })
}

/// Display the chat room.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
) -> Result<ChatTemplate> {
    room(&state, viewer, chat_name(&jar), FieldErrors::new(), String::new()).await
}

/// Choose a display name for the room.
#[instrument(skip_all)]
pub async fn set_name(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
    Form(form): Form<ChatNameForm>,
) -> Result<Response> {
    match form.validate() {
        Ok(name) => {
            let jar = jar.add(name_cookie(&name, state.config().is_secure()));
            Ok((jar, Redirect::to("/chat")).into_response())
        }
        Err(errors) => {
            let page = room(&state, viewer, None, errors, String::new()).await?;
            Ok(rejected(page))
        }
    }
}

/// Post a message with optional image.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    let user_name = chat_name(&jar);
    let submission = MultipartForm::read(multipart).await?;
    let form = ChatMessageForm::from_multipart(submission);
    let text = form.text.clone();

    match form.validate(user_name.clone(), state.config().max_upload_bytes) {
        Ok(draft) => {
            state
                .chat()
                .send(&draft.user_name, &draft.text, draft.image)
                .await?;
            Ok(Redirect::to("/chat").into_response())
        }
        Err(errors) => {
            let page = room(&state, viewer, user_name, errors, text).await?;
            Ok(rejected(page))
        }
    }
}

/// The current message list as an HTML fragment.
#[instrument(skip_all)]
pub async fn messages(State(state): State<AppState>) -> Result<ChatMessagesTemplate> {
    let messages = state.chat().recent().await?;
    Ok(ChatMessagesTemplate { messages })
}

/// Live message list as server-sent events.
///
/// Each event carries the whole rendered list; the client replaces its copy.
/// Closing the connection drops the subscription.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let updates = state.chat().subscribe().filter_map(|snapshot| async move {
        let messages = match snapshot {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Chat subscription failed");
                return None;
            }
        };
        match (ChatMessagesTemplate { messages }).render() {
            Ok(html) => Some(Ok(Event::default().event(MESSAGES_EVENT).data(html))),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render chat messages");
                None
            }
        }
    });

    Sse::new(updates).keep_alive(KeepAlive::default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::http::{StatusCode, header};
    use http_body_util::BodyExt;

    use nagar_core::DisplayName;

    use crate::routes::test_support::*;

    const ASHA: &str = "chat_user_name=Asha%20K";

    #[tokio::test]
    async fn test_name_prompt_until_name_chosen() {
        let app = app(&state());

        let html = body_string(send(&app, get("/chat", None)).await).await;
        assert!(html.contains("action=\"/chat/name\""));
        assert!(!html.contains("action=\"/chat\""));

        let html = body_string(send(&app, get("/chat", Some(ASHA))).await).await;
        assert!(html.contains("Asha K"));
        assert!(html.contains("action=\"/chat\""));
    }

    #[tokio::test]
    async fn test_set_name_sets_cookie() {
        let app = app(&state());
        let response = send(&app, post_form("/chat/name", "name=++Asha+K+", None)).await;
        assert_eq!(location(&response), "/chat");

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("chat_user_name=Asha%20K;"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=31536000"));

        let cookie = set_cookie.split(';').next().unwrap();
        let html = body_string(send(&app, get("/chat", Some(cookie))).await).await;
        assert!(html.contains("Chatting as <strong>Asha K</strong>"));

        let response = send(&app, post_form("/chat/name", "name=+++", None)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_string(response).await.contains("Please enter your name"));
    }

    #[tokio::test]
    async fn test_image_only_message() {
        let state = state();
        let app = app(&state);
        let body = multipart_body(
            &[("text", "  ")],
            Some(("Diya.PNG", "image/png", &b"\x89PNG"[..])),
        );

        let response = send(&app, post_multipart("/chat", body, Some(ASHA))).await;
        assert_eq!(location(&response), "/chat");

        let messages = state.chat().recent().await.unwrap();
        let message = messages.first().unwrap();
        assert_eq!(message.user_name, "Asha K");
        assert!(message.text.is_empty());
        let image_url = message.image_url.as_deref().unwrap();
        assert!(image_url.starts_with("/media/chat/"));
        assert!(image_url.ends_with(".png"));

        let html = body_string(send(&app, get("/chat/messages", None)).await).await;
        assert!(html.contains(image_url));
        assert!(!html.contains("class=\"chat-text\""));
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_write() {
        let state = state();
        let app = app(&state);
        let body = multipart_body(&[("text", "   ")], None);

        let response = send(&app, post_multipart("/chat", body, Some(ASHA))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(
            body_string(response)
                .await
                .contains("Please enter a message or choose an image")
        );
        assert!(state.chat().recent().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_name_rejected() {
        let state = state();
        let app = app(&state);
        let body = multipart_body(&[("text", "hello")], None);

        let response = send(&app, post_multipart("/chat", body, None)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.chat().recent().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stream_starts_with_snapshot() {
        let state = state();
        let name = DisplayName::parse("Meera").unwrap();
        state.chat().send(&name, "Namaste!", None).await.unwrap();

        let response = send(&app(&state), get("/chat/stream", None)).await;
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let mut body = response.into_body();
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let chunk = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert!(chunk.starts_with("event: messages\n"));
        assert!(chunk.contains("Namaste!"));
    }
}
