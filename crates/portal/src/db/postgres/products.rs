//! Product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use nagar_core::{Price, ProductId, UserId};

use super::{PgDocumentStore, sql_limit};
use crate::db::{ProductStore, RepositoryError};
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, seller_name, \
                               seller_contact, seller_email, seller_id, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    seller_name: String,
    seller_contact: Option<String>,
    seller_email: Option<String>,
    seller_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            seller_name: row.seller_name,
            seller_contact: row.seller_contact,
            seller_email: row.seller_email,
            seller_id: UserId::new(row.seller_id),
            created_at: row.created_at,
        })
    }
}

fn collect(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

#[async_trait]
impl ProductStore for PgDocumentStore {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM portal.products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        collect(rows)
    }

    #[instrument(skip(self))]
    async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM portal.products ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await?;

        collect(rows)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM portal.products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO portal.products
                (id, name, description, price, image_url,
                 seller_name, seller_contact, seller_email, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::generate().as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(&product.image_url)
        .bind(&product.seller_name)
        .bind(&product.seller_contact)
        .bind(&product.seller_email)
        .bind(product.seller_id.as_uuid())
        .fetch_one(self.pool())
        .await?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM portal.products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
