//! The add-event form.

use chrono::{NaiveDate, NaiveTime};

use nagar_core::{FieldErrors, UserId};

use super::{MultipartForm, optional, validate_image};
use crate::models::NewEvent;
use crate::storage::UploadedImage;

/// Raw add-event submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub form_link: String,
}

/// A validated event, before its image is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
    pub form_link: Option<String>,
}

impl EventForm {
    #[must_use]
    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title").to_owned(),
            description: form.text("description").to_owned(),
            date: form.text("date").to_owned(),
            time: form.text("time").to_owned(),
            location: form.text("location").to_owned(),
            form_link: form.text("form_link").to_owned(),
        }
    }

    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns every failing field when any rule is broken.
    pub fn validate(
        &self,
        image: Option<&UploadedImage>,
        max_image_bytes: usize,
    ) -> Result<EventDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.require("title", &self.title, "Title is required");
        errors.require("description", &self.description, "Description is required");

        let date = if errors.require("date", &self.date, "Date is required") {
            let parsed = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok();
            if parsed.is_none() {
                errors.add("date", "Date is invalid");
            }
            parsed
        } else {
            None
        };

        let time = optional(&self.time).and_then(|t| {
            let parsed = parse_time(&t);
            if parsed.is_none() {
                errors.add("time", "Time is invalid");
            }
            parsed
        });

        let form_link = optional(&self.form_link);
        if let Some(link) = &form_link
            && !is_web_url(link)
        {
            errors.add("form_link", "Form link must be a valid URL");
        }

        validate_image(&mut errors, image, max_image_bytes);

        match date {
            Some(date) if errors.is_empty() => Ok(EventDraft {
                title: self.title.trim().to_owned(),
                description: self.description.trim().to_owned(),
                date,
                time,
                location: optional(&self.location),
                form_link,
            }),
            _ => Err(errors),
        }
    }
}

impl EventDraft {
    /// Attach the creator and stored image URL.
    #[must_use]
    pub fn into_new_event(self, created_by: UserId, image_url: Option<String>) -> NewEvent {
        NewEvent {
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            form_link: self.form_link,
            image_url,
            created_by,
        }
    }
}

/// Parse `HH:MM` as sent by `<input type="time">`, tolerating seconds.
fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Whether `value` is an absolute `http`/`https` URL.
fn is_web_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
