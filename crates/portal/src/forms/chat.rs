//! Chat name and message forms.

use serde::Deserialize;

use nagar_core::{DisplayName, DisplayNameError, FieldErrors};

use super::{MultipartForm, validate_image};
use crate::storage::UploadedImage;

/// The "choose your name" form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatNameForm {
    pub name: String,
}

impl ChatNameForm {
    /// Validate the chosen name.
    ///
    /// # Errors
    ///
    /// Returns a `name` field error if the name is blank or too long.
    pub fn validate(&self) -> Result<DisplayName, FieldErrors> {
        DisplayName::parse(&self.name).map_err(|e| {
            let mut errors = FieldErrors::new();
            errors.add("name", name_message(&e));
            errors
        })
    }
}

fn name_message(error: &DisplayNameError) -> String {
    match error {
        DisplayNameError::Empty => "Please enter your name".to_owned(),
        DisplayNameError::TooLong { max } => format!("Name must be at most {max} characters"),
    }
}

/// A chat message submission.
#[derive(Debug, Default)]
pub struct ChatMessageForm {
    pub text: String,
    pub image: Option<UploadedImage>,
}

/// A validated chat message.
#[derive(Debug, Clone)]
pub struct ChatDraft {
    pub user_name: DisplayName,
    pub text: String,
    pub image: Option<UploadedImage>,
}

impl ChatMessageForm {
    #[must_use]
    pub fn from_multipart(mut form: MultipartForm) -> Self {
        Self {
            text: form.text("text").to_owned(),
            image: form.take_image(),
        }
    }

    /// Validate the message for the visitor's chosen name.
    ///
    /// # Errors
    ///
    /// Returns every failing field when any rule is broken.
    pub fn validate(
        self,
        user_name: Option<DisplayName>,
        max_image_bytes: usize,
    ) -> Result<ChatDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        if user_name.is_none() {
            errors.add("name", "Please enter your name");
        }

        let text = self.text.trim().to_owned();
        if text.is_empty() && self.image.is_none() {
            errors.add("text", "Please enter a message or choose an image");
        }

        validate_image(&mut errors, self.image.as_ref(), max_image_bytes);

        match user_name {
            Some(user_name) if errors.is_empty() => Ok(ChatDraft {
                user_name,
                text,
                image: self.image,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forms::test_support::image;

    const MAX: usize = 5 * 1024 * 1024;

    fn asha() -> Option<DisplayName> {
        Some(DisplayName::parse("Asha").unwrap())
    }

    #[test]
    fn test_name_form() {
        let form = ChatNameForm {
            name: "  Meera ".to_owned(),
        };
        assert_eq!(form.validate().unwrap().as_str(), "Meera");

        let blank = ChatNameForm::default();
        assert_eq!(
            blank.validate().unwrap_err().get("name"),
            Some("Please enter your name")
        );
    }

    #[test]
    fn test_text_or_image_required() {
        let empty = ChatMessageForm {
            text: "   ".to_owned(),
            image: None,
        };
        assert_eq!(
            empty.validate(asha(), MAX).unwrap_err().get("text"),
            Some("Please enter a message or choose an image")
        );

        let image_only = ChatMessageForm {
            text: String::new(),
            image: Some(image(3, "image/gif")),
        };
        let draft = image_only.validate(asha(), MAX).unwrap();
        assert!(draft.text.is_empty());
        assert!(draft.image.is_some());
    }

    #[test]
    fn test_name_required() {
        let form = ChatMessageForm {
            text: "hello".to_owned(),
            image: None,
        };
        assert_eq!(
            form.validate(None, MAX).unwrap_err().get("name"),
            Some("Please enter your name")
        );
    }
}
