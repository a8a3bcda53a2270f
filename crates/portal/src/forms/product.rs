//! The add-product form.

use nagar_core::{Email, FieldErrors, Price, PriceError, UserId};

use super::{MultipartForm, optional, validate_image};
use crate::models::NewProduct;
use crate::storage::UploadedImage;

/// Raw add-product submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub seller_name: String,
    pub seller_contact: String,
    pub seller_email: String,
}

/// A validated product, before its image is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub seller_name: String,
    pub seller_contact: Option<String>,
    pub seller_email: Option<String>,
}

impl ProductForm {
    /// An empty form with the seller's email filled in.
    #[must_use]
    pub fn for_seller(email: &Email) -> Self {
        Self {
            seller_email: email.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name").to_owned(),
            description: form.text("description").to_owned(),
            price: form.text("price").to_owned(),
            seller_name: form.text("seller_name").to_owned(),
            seller_contact: form.text("seller_contact").to_owned(),
            seller_email: form.text("seller_email").to_owned(),
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
    ) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.require("name", &self.name, "Product name is required");

        let price = match Price::parse(&self.price) {
            Ok(price) => Some(price),
            Err(PriceError::Empty) => {
                errors.add("price", "Price is required");
                None
            }
            Err(PriceError::NotANumber | PriceError::Negative) => {
                errors.add("price", "Price must be a positive number");
                None
            }
        };

        errors.require("description", &self.description, "Description is required");
        errors.require("seller_name", &self.seller_name, "Seller name is required");

        let seller_email = optional(&self.seller_email);
        if let Some(email) = &seller_email
            && Email::parse(email).is_err()
        {
            errors.add("seller_email", "Invalid email address");
        }

        validate_image(&mut errors, image, max_image_bytes);

        match price {
            Some(price) if errors.is_empty() => Ok(ProductDraft {
                name: self.name.trim().to_owned(),
                description: self.description.trim().to_owned(),
                price,
                seller_name: self.seller_name.trim().to_owned(),
                seller_contact: optional(&self.seller_contact),
                seller_email,
            }),
            _ => Err(errors),
        }
    }
}

impl ProductDraft {
    /// Attach the seller and stored image URL.
    #[must_use]
    pub fn into_new_product(self, seller_id: UserId, image_url: Option<String>) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price,
            image_url,
            seller_name: self.seller_name,
            seller_contact: self.seller_contact,
            seller_email: self.seller_email,
            seller_id,
        }
    }
}
