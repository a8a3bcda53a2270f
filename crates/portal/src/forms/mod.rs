//! Form parsing and validation.
//!
//! Each form type keeps the raw submitted strings (so a rejected form can be
//! re-rendered with the visitor's input) and validates them into a draft.
//! Validation collects every field error before rejecting; a rejected form
//! performs no write.

pub mod auth;
pub mod chat;
pub mod event;
pub mod product;

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use nagar_core::FieldErrors;

use crate::storage::UploadedImage;

pub use auth::{LoginForm, RegisterForm, Registration};
pub use chat::{ChatDraft, ChatMessageForm, ChatNameForm};
pub use event::{EventDraft, EventForm};
pub use product::{ProductDraft, ProductForm};

/// Name of the file input on every upload form.
pub const IMAGE_FIELD: &str = "image";

/// A `multipart/form-data` submission read into memory.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
}

impl MultipartForm {
    /// Read every part of the body.
    ///
    /// Text parts become fields; the [`IMAGE_FIELD`] part becomes the image.
    /// A file input left empty is sent as a zero-length part and is treated
    /// as no image.
    ///
    /// # Errors
    ///
    /// Returns `MultipartError` if the body is malformed or exceeds the
    /// request body limit.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Build a form from already-parsed parts.
    #[must_use]
    pub fn from_parts(fields: HashMap<String, String>, image: Option<UploadedImage>) -> Self {
        Self { fields, image }
    }

    /// The submitted value of `name`, or `""` when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// The uploaded image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    /// Take ownership of the uploaded image.
    pub const fn take_image(&mut self) -> Option<UploadedImage> {
        self.image.take()
    }
}

/// Trimmed value, or `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Message for an image over the size limit.
#[must_use]
pub fn image_too_large_message(max_bytes: usize) -> String {
    format!(
        "Image size should be less than {}MB",
        max_bytes.div_ceil(1024 * 1024)
    )
}

/// Record errors for an uploaded image that is too large or not an image.
pub fn validate_image(errors: &mut FieldErrors, image: Option<&UploadedImage>, max_bytes: usize) {
    let Some(image) = image else {
        return;
    };
    if image.len() > max_bytes {
        errors.add(IMAGE_FIELD, image_too_large_message(max_bytes));
    } else if !image.is_image() {
        errors.add(IMAGE_FIELD, "Please choose an image file");
    }
}
