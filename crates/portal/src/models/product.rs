//! Products listed by local sellers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nagar_core::{Price, ProductId, UserId};

/// A stored product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub seller_name: String,
    pub seller_contact: Option<String>,
    pub seller_email: Option<String>,
    pub seller_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `user` created this listing.
    #[must_use]
    pub fn is_sold_by(&self, user: UserId) -> bool {
        self.seller_id == user
    }
}

/// A product about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: Option<String>,
    pub seller_name: String,
    pub seller_contact: Option<String>,
    pub seller_email: Option<String>,
    pub seller_id: UserId,
}

impl NewProduct {
    /// Materialize the stored document with a fresh ID and creation time.
    #[must_use]
    pub fn into_product(self, created_at: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::generate(),
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            seller_name: self.seller_name,
            seller_contact: self.seller_contact,
            seller_email: self.seller_email,
            seller_id: self.seller_id,
            created_at,
        }
    }
}
