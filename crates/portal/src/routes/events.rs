//! Event route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::instrument;

use nagar_core::{EventId, FieldErrors};

use super::rejected;
use crate::error::Result;
use crate::filters;
use crate::forms::{EventForm, MultipartForm};
use crate::middleware::{RequireAdmin, Viewer};
use crate::models::Event;
use crate::state::AppState;
use crate::storage::{MediaArea, ObjectKey};

/// Event listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/index.html")]
pub struct EventsIndexTemplate {
    pub viewer: Viewer,
    pub events: Vec<Event>,
}

/// Event detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/show.html")]
pub struct EventShowTemplate {
    pub viewer: Viewer,
    pub event: Event,
}

/// Add event form template.
#[derive(Template, WebTemplate)]
#[template(path = "events/add.html")]
pub struct AddEventTemplate {
    pub viewer: Viewer,
    pub form: EventForm,
    pub errors: FieldErrors,
    pub max_upload_mb: usize,
}

/// Display all events, soonest date first.
#[instrument(skip(state, viewer))]
pub async fn index(State(state): State<AppState>, viewer: Viewer) -> Result<EventsIndexTemplate> {
    let events = state.store().list_events().await?;
    Ok(EventsIndexTemplate { viewer, events })
}

/// Display one event. Unknown or malformed IDs go back to the listing.
#[instrument(skip(state, viewer))]
pub async fn show(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Response> {
    let Ok(id) = EventId::parse(&id) else {
        return Ok(Redirect::to("/events").into_response());
    };

    match state.store().get_event(id).await? {
        Some(event) => Ok(EventShowTemplate { viewer, event }.into_response()),
        None => Ok(Redirect::to("/events").into_response()),
    }
}

/// Display the add event form.
pub async fn add_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    viewer: Viewer,
) -> AddEventTemplate {
    AddEventTemplate {
        viewer,
        form: EventForm::default(),
        errors: FieldErrors::new(),
        max_upload_mb: state.config().max_upload_megabytes(),
    }
}

/// Handle the add event form submission.
///
/// The image, if any, is stored as `events/<unix-millis>-<file name>`.
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Response> {
    let mut submission = MultipartForm::read(multipart).await?;
    let form = EventForm::from_multipart(&submission);

    let draft = match form.validate(submission.image(), state.config().max_upload_bytes) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(fields = errors.len(), "Event form rejected");
            return Ok(rejected(AddEventTemplate {
                viewer,
                form,
                errors,
                max_upload_mb: state.config().max_upload_megabytes(),
            }));
        }
    };

    let image_url = match submission.take_image() {
        Some(image) => {
            let key = ObjectKey::timestamped(
                MediaArea::Events,
                Utc::now().timestamp_millis(),
                &image.file_name,
            );
            Some(image.store(state.storage(), &key).await?)
        }
        None => None,
    };

    let event = state
        .store()
        .insert_event(draft.into_new_event(admin.id, image_url))
        .await?;
    tracing::info!(event_id = %event.id, "Event created");

    Ok(Redirect::to("/events").into_response())
}

/// Delete an event.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    if let Ok(id) = EventId::parse(&id)
        && state.store().delete_event(id).await?
    {
        tracing::info!(event_id = %id, "Event deleted");
    }
    Ok(Redirect::to("/events"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    use nagar_core::RegistrationRole;

    use crate::models::NewEvent;
    use crate::routes::test_support::*;

    fn new_event(title: &str, date: NaiveDate, created_by: nagar_core::UserId) -> NewEvent {
        NewEvent {
            title: title.to_owned(),
            description: "Everyone welcome".to_owned(),
            date,
            time: None,
            location: None,
            form_link: None,
            image_url: None,
            created_by,
        }
    }

    #[tokio::test]
    async fn test_listing_is_date_ascending() {
        let state = state();
        let admin = account(&state, "asha@example.com", RegistrationRole::Admin).await;
        for (title, day) in [("Third", 30), ("First", 1), ("Second", 15)] {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            state
                .store()
                .insert_event(new_event(title, date, admin.id))
                .await
                .unwrap();
        }

        let html = body_string(send(&app(&state), get("/events", None)).await).await;
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        let third = html.find("Third").unwrap();
        assert!(first < second && second < third);
        assert!(!html.contains("href=\"/events/add\""));
    }

    #[tokio::test]
    async fn test_unknown_event_redirects_to_listing() {
        let app = app(&state());
        for uri in ["/events/not-a-uuid", "/events/7f8e1c7a-3c4e-4f55-9d7e-2b1f0f2a9c11"] {
            let response = send(&app, get(uri, None)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/events");
        }
    }

    #[tokio::test]
    async fn test_guest_post_is_redirected_without_write() {
        let state = state();
        let app = app(&state);
        let body = multipart_body(
            &[("title", "Holi"), ("description", "Colours"), ("date", "2025-03-14")],
            None,
        );

        let response = send(&app, post_multipart("/events/add", body, None)).await;
        assert_eq!(location(&response), "/login");
        assert!(state.store().list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entrepreneur_is_forbidden() {
        let state = state();
        let app = app(&state);
        let cookie = sign_up(&app, "ravi@example.com", RegistrationRole::Entrepreneur).await;
        let body = multipart_body(
            &[("title", "Holi"), ("description", "Colours"), ("date", "2025-03-14")],
            None,
        );

        let response = send(&app, post_multipart("/events/add", body, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(state.store().list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_shows_field_errors_without_write() {
        let state = state();
        let app = app(&state);
        let cookie = sign_up(&app, "asha@example.com", RegistrationRole::Admin).await;
        let body = multipart_body(
            &[("title", ""), ("description", ""), ("date", "2025-03-14")],
            None,
        );

        let response = send(&app, post_multipart("/events/add", body, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("Title is required"));
        assert!(html.contains("Description is required"));
        assert!(!html.contains("Date is required"));
        assert!(state.store().list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_creates_event_with_image() {
        let state = state();
        let app = app(&state);
        let cookie = sign_up(&app, "asha@example.com", RegistrationRole::Admin).await;
        let body = multipart_body(
            &[
                ("title", "Holi Utsav"),
                ("description", "Colours in the park"),
                ("date", "2025-03-14"),
                ("time", "10:00"),
                ("location", "Central Park"),
                ("form_link", ""),
            ],
            Some(("poster.png", "image/png", &b"\x89PNG"[..])),
        );

        let response = send(&app, post_multipart("/events/add", body, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/events");

        let events = state.store().list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        let event = events.first().unwrap();
        assert_eq!(event.title, "Holi Utsav");
        assert_eq!(event.location.as_deref(), Some("Central Park"));
        assert_eq!(event.form_link, None);
        let image_url = event.image_url.as_deref().unwrap();
        assert!(image_url.starts_with("/media/events/"));
        assert!(image_url.ends_with("-poster.png"));

        let detail = send(&app, get(&format!("/events/{}", event.id), None)).await;
        let html = body_string(detail).await;
        assert!(html.contains("Friday, March 14, 2025"));
        assert!(html.contains(image_url));
    }

    #[tokio::test]
    async fn test_admin_deletes_event() {
        let state = state();
        let app = app(&state);
        let cookie = sign_up(&app, "asha@example.com", RegistrationRole::Admin).await;
        let admin = state
            .store()
            .find_account_by_email(&nagar_core::Email::parse("asha@example.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        let event = state
            .store()
            .insert_event(new_event(
                "Clean-up drive",
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                admin.id,
            ))
            .await
            .unwrap();

        let uri = format!("/events/{}/delete", event.id);
        let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
        assert_eq!(location(&response), "/events");
        assert!(state.store().get_event(event.id).await.unwrap().is_none());
    }
}
