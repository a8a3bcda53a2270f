//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use nagar_core::{FieldErrors, ProductId};

use super::rejected;
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{MultipartForm, ProductForm};
use crate::middleware::{RequireAuth, RequireEntrepreneur, Viewer};
use crate::models::Product;
use crate::state::AppState;
use crate::storage::{MediaArea, ObjectKey};

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub viewer: Viewer,
    pub products: Vec<Product>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub viewer: Viewer,
    pub product: Product,
    /// Whether the viewer listed this product and may delete it.
    pub is_seller: bool,
}

/// Add product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/add.html")]
pub struct AddProductTemplate {
    pub viewer: Viewer,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub max_upload_mb: usize,
}

/// Display all products, newest first.
#[instrument(skip(state, viewer))]
pub async fn index(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<ProductsIndexTemplate> {
    let products = state.store().list_products().await?;
    Ok(ProductsIndexTemplate { viewer, products })
}

/// Display one product. Unknown or malformed IDs go back to the listing.
#[instrument(skip(state, viewer))]
pub async fn show(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Response> {
    let Ok(id) = ProductId::parse(&id) else {
        return Ok(Redirect::to("/products").into_response());
    };

    let Some(product) = state.store().get_product(id).await? else {
        return Ok(Redirect::to("/products").into_response());
    };

    let is_seller = viewer
        .user_id()
        .is_some_and(|user_id| product.is_sold_by(user_id));

    Ok(ProductShowTemplate {
        viewer,
        product,
        is_seller,
    }
    .into_response())
}

/// Display the add product form, with the seller's email filled in.
pub async fn add_page(
    State(state): State<AppState>,
    RequireEntrepreneur(seller): RequireEntrepreneur,
    viewer: Viewer,
) -> AddProductTemplate {
    AddProductTemplate {
        viewer,
        form: ProductForm::for_seller(&seller.email),
        errors: FieldErrors::new(),
        max_upload_mb: state.config().max_upload_megabytes(),
    }
}

/// Handle the add product form submission.
///
/// The image, if any, is stored as `products/<uuid>.<ext>`.
#[instrument(skip_all, fields(user_id = %seller.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireEntrepreneur(seller): RequireEntrepreneur,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Response> {
    let mut submission = MultipartForm::read(multipart).await?;
    let form = ProductForm::from_multipart(&submission);

    let draft = match form.validate(submission.image(), state.config().max_upload_bytes) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(fields = errors.len(), "Product form rejected");
            return Ok(rejected(AddProductTemplate {
                viewer,
                form,
                errors,
                max_upload_mb: state.config().max_upload_megabytes(),
            }));
        }
    };

    let image_url = match submission.take_image() {
        Some(image) => {
            let key = ObjectKey::random(MediaArea::Products, &image.file_name);
            Some(image.store(state.storage(), &key).await?)
        }
        None => None,
    };

    let product = state
        .store()
        .insert_product(draft.into_new_product(seller.id, image_url))
        .await?;
    tracing::info!(product_id = %product.id, "Product listed");

    Ok(Redirect::to("/products").into_response())
}

/// Delete a product. Only the seller who listed it may do so.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let Ok(id) = ProductId::parse(&id) else {
        return Ok(Redirect::to("/products"));
    };
    let Some(product) = state.store().get_product(id).await? else {
        return Ok(Redirect::to("/products"));
    };

    if !product.is_sold_by(user.id) {
        return Err(AppError::Forbidden(
            "only the seller can remove this product".to_owned(),
        ));
    }

    state.store().delete_product(id).await?;
    tracing::info!(product_id = %id, "Product deleted");

    Ok(Redirect::to("/products"))
}
